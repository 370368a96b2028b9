use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};

use crate::io::{DeclaredIo, IoKind};

/// Lake catalog table (catalog.schema.table)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabricksIo {
    catalog: String,
    schema: String,
    table: String,
}

impl DatabricksIo {
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl IoKind for DatabricksIo {
    fn alias(&self) -> String {
        format!("databricks://{}/{}/{}", self.catalog, self.schema, self.table)
    }

    fn rendered_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }

    fn external_name(&self) -> String {
        format!("databricks-{}-{}-{}", self.catalog, self.schema, self.table)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeclaredIo for DatabricksIo {
    const KIND: &'static str = "databricks";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::new("catalog").validator(validators::string),
            Attribute::new("schema").validator(validators::string),
            Attribute::new("table").validator(validators::string),
        ]
    }

    fn from_config(config: &ConfigValidator) -> Result<Self, ConfigError> {
        Ok(Self {
            catalog: config.require_str("catalog")?,
            schema: config.require_str("schema")?,
            table: config.require_str("table")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{IoContext, IoModel};
    use serde_json::json;

    #[test]
    fn names() {
        let io = IoModel::build::<DatabricksIo>(
            &json!({
                "type": "databricks",
                "name": "t",
                "catalog": "test_catalog",
                "schema": "test_schema",
                "table": "test_table",
            }),
            &IoContext::new("/"),
        )
        .unwrap();

        assert_eq!(io.alias(), "databricks://test_catalog/test_schema/test_table");
        assert_eq!(io.rendered_name(), "test_catalog.test_schema.test_table");
        assert_eq!(io.external_name(), "databricks-test_catalog-test_schema-test_table");
    }
}
