use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};

use crate::io::{DeclaredIo, IoKind};

/// Key-value table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoIo {
    account_id: Option<String>,
    region: Option<String>,
    table: String,
}

impl DynamoIo {
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl IoKind for DynamoIo {
    fn alias(&self) -> String {
        format!(
            "dynamo://{}/{}/{}",
            self.account_id.as_deref().unwrap_or(""),
            self.region.as_deref().unwrap_or(""),
            self.table
        )
    }

    fn rendered_name(&self) -> String {
        super::scoped_rendered_name(self.account_id(), self.region(), &self.table)
    }

    fn external_name(&self) -> String {
        super::external_name("dynamo", &[self.account_id(), self.region(), Some(&self.table)])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeclaredIo for DynamoIo {
    const KIND: &'static str = "dynamo";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::new("account_id")
                .optional()
                .validator(validators::string)
                .help("Only needed for cross account tables"),
            Attribute::new("region")
                .optional()
                .validator(validators::string)
                .help("Only needed for cross region tables"),
            Attribute::new("table").validator(validators::string),
        ]
    }

    fn from_config(config: &ConfigValidator) -> Result<Self, ConfigError> {
        Ok(Self {
            account_id: config.get_str("account_id")?,
            region: config.get_str("region")?,
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
    fn regional_table() {
        let io = IoModel::build::<DynamoIo>(
            &json!({"type": "dynamo", "name": "t", "region": "eu_west_1", "table": "schema.table_name"}),
            &IoContext::new("/"),
        )
        .unwrap();

        assert_eq!(io.alias(), "dynamo:///eu_west_1/schema.table_name");
        assert_eq!(io.rendered_name(), ":eu_west_1:schema.table_name");
        assert_eq!(io.external_name(), "dynamo-eu_west_1-schema.table_name");
    }

    #[test]
    fn local_table() {
        let io = IoModel::build::<DynamoIo>(
            &json!({"type": "dynamo", "name": "t", "table": "profiles"}),
            &IoContext::new("/"),
        )
        .unwrap();

        assert_eq!(io.rendered_name(), "profiles");
        assert_eq!(io.external_name(), "dynamo-profiles");
    }
}
