use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};

use crate::io::{DeclaredIo, IoKind};

/// Warehouse-catalog table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthenaIo {
    schema: String,
    table: String,
}

impl AthenaIo {
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl IoKind for AthenaIo {
    fn alias(&self) -> String {
        format!("athena://{}/{}", self.schema, self.table)
    }

    fn rendered_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    fn external_name(&self) -> String {
        format!("athena-{}-{}", self.schema, self.table)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeclaredIo for AthenaIo {
    const KIND: &'static str = "athena";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::new("schema").validator(validators::string),
            Attribute::new("table").validator(validators::string),
        ]
    }

    fn from_config(config: &ConfigValidator) -> Result<Self, ConfigError> {
        Ok(Self {
            schema: config.require_str("schema")?,
            table: config.require_str("table")?,
        })
    }
}
