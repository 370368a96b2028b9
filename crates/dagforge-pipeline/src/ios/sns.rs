use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};

use crate::io::{DeclaredIo, IoKind};

/// Pub/sub topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnsIo {
    account_id: Option<String>,
    region: Option<String>,
    sns_topic: String,
}

impl SnsIo {
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn topic(&self) -> &str {
        &self.sns_topic
    }
}

impl IoKind for SnsIo {
    fn alias(&self) -> String {
        format!(
            "sns://{}/{}/{}",
            self.account_id.as_deref().unwrap_or(""),
            self.region.as_deref().unwrap_or(""),
            self.sns_topic
        )
    }

    fn rendered_name(&self) -> String {
        super::scoped_rendered_name(self.account_id(), self.region(), &self.sns_topic)
    }

    fn external_name(&self) -> String {
        super::external_name("sns", &[self.account_id(), self.region(), Some(&self.sns_topic)])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeclaredIo for SnsIo {
    const KIND: &'static str = "sns";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::new("account_id")
                .optional()
                .validator(validators::string)
                .help("Only needed for cross account topics"),
            Attribute::new("region")
                .optional()
                .validator(validators::string)
                .help("Only needed for cross region topics"),
            Attribute::new("sns_topic").validator(validators::string),
        ]
    }

    fn from_config(config: &ConfigValidator) -> Result<Self, ConfigError> {
        Ok(Self {
            account_id: config.get_str("account_id")?,
            region: config.get_str("region")?,
            sns_topic: config.require_str("sns_topic")?,
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
        let io = IoModel::build::<SnsIo>(
            &json!({"type": "sns", "name": "t", "account_id": "123", "region": "eu_west_1", "sns_topic": "topic_name"}),
            &IoContext::new("/"),
        )
        .unwrap();

        assert_eq!(io.alias(), "sns://123/eu_west_1/topic_name");
        assert_eq!(io.rendered_name(), "123:eu_west_1:topic_name");
        assert_eq!(io.external_name(), "sns-123-eu_west_1-topic_name");
    }
}
