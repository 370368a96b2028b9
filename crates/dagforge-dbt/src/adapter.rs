//! Adapter strategies
//!
//! An adapter turns manifest nodes into IO descriptors for one warehouse
//! engine. The compiler decides which transformation applies to a node; the
//! adapter decides what the descriptor looks like.

use std::fmt;

use dagforge_core::{AdapterKind, LineageSettings};

use crate::athena::AthenaAdapter;
use crate::databricks::DatabricksAdapter;
use crate::descriptor::Descriptor;
use crate::error::LineageError;
use crate::manifest::ManifestNode;

pub trait AdapterStrategy: fmt::Debug + Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Intermediate node that is flattened into its consumers
    fn is_preparation(&self, node: &ManifestNode) -> bool;

    /// Queryable table holding the node's result
    fn table_task(&self, node: &ManifestNode, follow_external: bool)
        -> Result<Descriptor, LineageError>;

    /// Object-store location of the node's data, as an input
    fn location_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError>;

    /// Object-store location of the node's data, as an output
    fn output_location_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError>;

    /// Seeds are loaded by the build tool itself and never waited on
    fn seed_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError>;

    /// Extra output registering the node in a second catalog
    fn cross_registration_task(
        &self,
        _node: &ManifestNode,
    ) -> Result<Option<Descriptor>, LineageError> {
        Ok(None)
    }

    /// Sources are queried through the warehouse catalog on every adapter
    fn source_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError> {
        let schema = require(node, node.schema.as_deref(), "schema", self.kind())?;
        Ok(catalog_table(schema, &node.name).following(true))
    }

    /// No-op stand-in for nodes nothing can wait on
    fn placeholder_task(&self, node: &ManifestNode) -> Descriptor {
        Descriptor::new("dummy", node.name.as_str())
    }
}

/// Adapter selected by `[lineage].adapter`
pub fn adapter_for(settings: &LineageSettings) -> Box<dyn AdapterStrategy> {
    match settings.adapter {
        AdapterKind::Athena => Box::new(AthenaAdapter::new(settings.clone())),
        AdapterKind::Databricks => Box::new(DatabricksAdapter::new(settings.clone())),
    }
}

/// Warehouse-catalog table `{schema}__{table}_athena`
pub(crate) fn catalog_table(schema: &str, table: &str) -> Descriptor {
    Descriptor::new("athena", format!("{}__{}_athena", schema, table))
        .with("schema", schema)
        .with("table", table)
}

pub(crate) fn require<'a>(
    node: &ManifestNode,
    value: Option<&'a str>,
    field: &str,
    adapter: AdapterKind,
) -> Result<&'a str, LineageError> {
    value.ok_or_else(|| LineageError::MissingNodeMetadata {
        node: node.unique_id.clone(),
        field: field.to_string(),
        adapter: adapter.to_string(),
    })
}

/// `root/part/part`, without doubled separators
pub(crate) fn join_location(root: &str, parts: &[&str]) -> String {
    let mut location = root.trim_end_matches('/').to_string();
    for part in parts {
        location.push('/');
        location.push_str(part.trim_matches('/'));
    }
    location
}

/// Split `s3://bucket/some/path` into `("bucket", "some/path")`
pub(crate) fn split_location<'a>(
    node: &ManifestNode,
    location: &'a str,
) -> Result<(&'a str, &'a str), LineageError> {
    let without_scheme = location
        .split_once("://")
        .map_or(location, |(_, rest)| rest);

    match without_scheme.split_once('/') {
        Some((bucket, path)) if !bucket.is_empty() && !path.trim_matches('/').is_empty() => {
            Ok((bucket, path.trim_matches('/')))
        }
        _ => Err(LineageError::InvalidLocation {
            node: node.unique_id.clone(),
            location: location.to_string(),
        }),
    }
}
