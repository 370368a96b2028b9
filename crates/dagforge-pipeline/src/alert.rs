//! Alert configurations
//!
//! Delivery is out of scope; an alert is only validated to carry a `type`
//! and kept with the rest of its fields untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use dagforge_core::error::type_name;
use dagforge_core::ConfigError;

/// One alert target, e.g. `{type: slack, channel: "#airflow-jobs"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(rename = "type")]
    pub kind: String,

    /// Kind-specific fields
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl AlertConfig {
    pub fn from_config(raw: &Value, location: &str) -> Result<Self, ConfigError> {
        let Value::Object(map) = raw else {
            return Err(ConfigError::InvalidDocument {
                location: location.to_string(),
                found: type_name(raw).to_string(),
            });
        };

        let kind = match map.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => {
                return Err(ConfigError::TypeMismatch {
                    field: "alerts.type".to_string(),
                    location: location.to_string(),
                    cause: format!("expected a string, found {}", type_name(other)),
                })
            }
            None => {
                return Err(ConfigError::MissingRequiredField {
                    field: "alerts.type".to_string(),
                    location: location.to_string(),
                })
            }
        };

        let settings = map
            .iter()
            .filter(|(key, _)| key.as_str() != "type")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self { kind, settings })
    }
}

/// Alerts declared by a pipeline; `None` means the settings default
pub fn alerts_from_config(
    configs: Option<&[Value]>,
    default_alert: &Value,
    location: &str,
) -> Result<Vec<AlertConfig>, ConfigError> {
    match configs {
        Some(configs) => configs
            .iter()
            .map(|raw| AlertConfig::from_config(raw, location))
            .collect(),
        None => Ok(vec![AlertConfig::from_config(default_alert, location)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_kind_specific_fields() {
        let alert = AlertConfig::from_config(
            &json!({"type": "slack", "channel": "#data", "mentions": ["@oncall"]}),
            "dags/p/pipeline.yaml",
        )
        .unwrap();

        assert_eq!(alert.kind, "slack");
        assert_eq!(alert.settings["channel"], "#data");
        assert!(!alert.settings.contains_key("type"));
    }

    #[test]
    fn null_alerts_use_default() {
        let alerts = alerts_from_config(
            None,
            &json!({"type": "slack", "channel": "#airflow-jobs"}),
            "dags/p/pipeline.yaml",
        )
        .unwrap();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].settings["channel"], "#airflow-jobs");
    }

    #[test]
    fn empty_list_means_no_alerts() {
        let alerts = alerts_from_config(Some(&[][..]), &json!({"type": "slack"}), "p.yaml").unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn alert_without_type() {
        let err = AlertConfig::from_config(&json!({"channel": "#data"}), "p.yaml").unwrap_err();
        assert_eq!(err.field(), Some("alerts.type"));
    }
}
