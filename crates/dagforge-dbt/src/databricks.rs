//! Lake-table adapter (Databricks / Unity catalog)
//!
//! Tables are `{catalog}__{schema}__{table}_databricks` with the catalog taken
//! from the node's database. Data lives under the node's `location_root`, and
//! preparation models are recognised by their schema name.

use dagforge_core::{AdapterKind, LineageSettings};

use crate::adapter::{catalog_table, join_location, require, split_location, AdapterStrategy};
use crate::descriptor::Descriptor;
use crate::error::LineageError;
use crate::manifest::ManifestNode;

#[derive(Debug, Clone)]
pub struct DatabricksAdapter {
    settings: LineageSettings,
}

impl DatabricksAdapter {
    pub fn new(settings: LineageSettings) -> Self {
        Self { settings }
    }

    fn qualified_name(&self, node: &ManifestNode) -> Result<String, LineageError> {
        let catalog = require(node, node.database.as_deref(), "database", self.kind())?;
        let schema = require(node, node.schema.as_deref(), "schema", self.kind())?;
        Ok(format!("{}__{}__{}", catalog, schema, node.name))
    }

    /// `{location_root}/{schema}/{name}`, with the default data dir as root
    fn data_location(&self, node: &ManifestNode) -> Result<String, LineageError> {
        let root = match node.location_root() {
            Some(root) => root,
            None => require(
                node,
                self.settings.default_data_dir.as_deref(),
                "location_root",
                self.kind(),
            )?,
        };
        let schema = require(node, node.schema.as_deref(), "schema", self.kind())?;
        Ok(join_location(root, &[schema, &node.name]))
    }
}

impl AdapterStrategy for DatabricksAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Databricks
    }

    fn is_preparation(&self, node: &ManifestNode) -> bool {
        node.schema
            .as_deref()
            .is_some_and(|schema| schema.contains(&self.settings.preparation_schema_marker))
    }

    fn table_task(
        &self,
        node: &ManifestNode,
        follow_external: bool,
    ) -> Result<Descriptor, LineageError> {
        let catalog = require(node, node.database.as_deref(), "database", self.kind())?;
        let schema = require(node, node.schema.as_deref(), "schema", self.kind())?;

        Ok(
            Descriptor::new("databricks", format!("{}_databricks", self.qualified_name(node)?))
                .with("catalog", catalog)
                .with("schema", schema)
                .with("table", node.name.as_str())
                .following(follow_external),
        )
    }

    fn location_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError> {
        let location = self.data_location(node)?;
        let (bucket, path) = split_location(node, &location)?;

        Ok(Descriptor::new("s3", format!("{}_s3", self.qualified_name(node)?))
            .with("bucket", bucket)
            .with("path", path))
    }

    fn output_location_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError> {
        self.location_task(node)
    }

    fn seed_task(&self, node: &ManifestNode) -> Result<Descriptor, LineageError> {
        Ok(self.placeholder_task(node))
    }

    fn cross_registration_task(
        &self,
        node: &ManifestNode,
    ) -> Result<Option<Descriptor>, LineageError> {
        if !self.settings.create_external_athena_table {
            return Ok(None);
        }

        let schema = require(node, node.schema.as_deref(), "schema", self.kind())?;
        Ok(Some(catalog_table(schema, &node.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn model() -> ManifestNode {
        serde_json::from_value(json!({
            "unique_id": "model.main.model1",
            "name": "model1",
            "database": "marts",
            "schema": "analytics_engineering",
            "config": {
                "materialized": "incremental",
                "location_root": "s3://acme-data-lake/analytics_warehouse/data/marts",
            },
        }))
        .unwrap()
    }

    #[test]
    fn table_and_location() {
        let adapter = DatabricksAdapter::new(LineageSettings::default());

        assert_eq!(
            adapter.table_task(&model(), true).unwrap().to_value(),
            json!({
                "type": "databricks",
                "name": "marts__analytics_engineering__model1_databricks",
                "catalog": "marts",
                "schema": "analytics_engineering",
                "table": "model1",
                "follow_external_dependency": true,
            })
        );
        assert_eq!(
            adapter.location_task(&model()).unwrap().to_value(),
            json!({
                "type": "s3",
                "name": "marts__analytics_engineering__model1_s3",
                "bucket": "acme-data-lake",
                "path": "analytics_warehouse/data/marts/analytics_engineering/model1",
            })
        );
    }

    #[test]
    fn preparation_by_schema() {
        let adapter = DatabricksAdapter::new(LineageSettings::default());
        let mut node = model();
        assert!(!adapter.is_preparation(&node));

        node.schema = Some("data_preparation".to_string());
        assert!(adapter.is_preparation(&node));
    }

    #[test]
    fn cross_registration_follows_setting() {
        let disabled = DatabricksAdapter::new(LineageSettings::default());
        assert_eq!(disabled.cross_registration_task(&model()).unwrap(), None);

        let enabled = DatabricksAdapter::new(LineageSettings {
            create_external_athena_table: true,
            ..LineageSettings::default()
        });
        assert_eq!(
            enabled
                .cross_registration_task(&model())
                .unwrap()
                .unwrap()
                .to_value(),
            json!({
                "type": "athena",
                "name": "analytics_engineering__model1_athena",
                "schema": "analytics_engineering",
                "table": "model1",
            })
        );
    }

    #[test]
    fn catalog_is_required() {
        let mut node = model();
        node.database = None;

        let err = DatabricksAdapter::new(LineageSettings::default())
            .table_task(&node, false)
            .unwrap_err();
        assert_eq!(err.code(), dagforge_core::ErrorCode::MissingNodeMetadata);
    }
}
