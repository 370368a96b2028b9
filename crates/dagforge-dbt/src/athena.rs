//! Warehouse-catalog adapter (Athena / Glue)
//!
//! Tables are `{schema}__{table}_athena`; data lives in the configured data
//! bucket. Staging models are recognised by their name prefix.

use dagforge_core::{AdapterKind, LineageSettings};

use crate::adapter::{catalog_table, join_location, require, split_location, AdapterStrategy};
use crate::descriptor::Descriptor;
use crate::error::LineageError;
use crate::manifest::{ManifestNode, Materialization};

/// Name of the output location descriptor
const OUTPUT_LOCATION_NAME: &str = "output_s3_path";

#[derive(Debug, Clone)]
pub struct AthenaAdapter {
    settings: LineageSettings,
}

impl AthenaAdapter {
    pub fn new(settings: LineageSettings) -> Self {
        Self { settings }
    }

    /// `external_location`, else `{default_data_dir}/{schema}/{name}`
    fn data_location(&self, node: &ManifestNode) -> Result<String, LineageError> {
        if let Some(location) = node.external_location() {
            return Ok(location.to_string());
        }

        let root = require(
            node,
            self.settings.default_data_dir.as_deref(),
            "default_data_dir",
            self.kind(),
        )?;
        let schema = require(node, node.schema.as_deref(), "schema", self.kind())?;
        Ok(join_location(root, &[schema, &node.name]))
    }

    fn location(&self, node: &ManifestNode, name: String) -> Result<Descriptor, LineageError> {
        let location = self.data_location(node)?;
        let (uri_bucket, path) = split_location(node, &location)?;
        let bucket = self.settings.data_bucket.as_deref().unwrap_or(uri_bucket);

        Ok(Descriptor::new("s3", name)
            .with("bucket", bucket)
            .with("path", path))
    }
}

impl AdapterStrategy for AthenaAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Athena
    }

    fn is_preparation(&self, node: &ManifestNode) -> bool {
        node.name.starts_with(&self.settings.staging_prefix)
            && node.materialization() != Materialization::Table
    }

    fn table_task(
        &self,
        node: &ManifestNode,
        follow_external: bool,
    ) -> Result<Descriptor, LineageError> {
        let schema = require(node, node.schema.as_deref(), "schema", self.kind())?;
        Ok(catalog_table(schema, &node.name).following(follow_external))
    }

    fn location_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError> {
        self.location(node, format!("s3_{}", node.name))
    }

    fn output_location_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError> {
        self.location(node, OUTPUT_LOCATION_NAME.to_string())
    }

    fn seed_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError> {
        self.table_task(node, false)
    }
}
