//! Config validation
//!
//! A [`ConfigValidator`] pairs one raw configuration document with the
//! attribute schema of the entity it describes. Construction resolves every
//! declared attribute once and keeps the results, so a validator that exists
//! is a document that passed. [`ConfigValidator::parse`] serves those stored
//! values; default providers never run again.
//!
//! Resolution order for one attribute:
//! 1. the raw value at the attribute's parent path
//! 2. the attribute's default
//! 3. the attribute's auto value
//! 4. missing + required is an error, missing + optional is null
//!
//! A present value runs through the attribute's validator. An explicit null
//! on a nullable attribute stands as the value and skips steps 2-4.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::attribute::{Attribute, AttributeSet};
use crate::error::{type_name, ConfigError};
use crate::validators;

/// Validated view over one configuration document
#[derive(Debug, Clone)]
pub struct ConfigValidator {
    location: String,
    raw: Value,
    attributes: AttributeSet,
    /// Resolved value per attribute name
    values: HashMap<String, Value>,
}

impl ConfigValidator {
    /// Validate `raw` against `attributes`.
    ///
    /// Fails on the first attribute that does not resolve.
    pub fn new(
        location: impl Into<String>,
        raw: Value,
        attributes: AttributeSet,
    ) -> Result<Self, ConfigError> {
        let location = location.into();

        if !raw.is_object() {
            return Err(ConfigError::InvalidDocument {
                found: type_name(&raw).to_string(),
                location,
            });
        }

        let mut validator = Self {
            location,
            raw,
            attributes,
            values: HashMap::new(),
        };

        validator.warn_undeclared_keys();

        let mut values = HashMap::with_capacity(validator.attributes.len());
        for attribute in validator.attributes.iter() {
            values.insert(attribute.name().to_string(), validator.resolve(attribute)?);
        }
        validator.values = values;

        Ok(validator)
    }

    /// Source location used in error messages
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The document as supplied
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Normalised value of a declared attribute
    pub fn parse(&self, name: &str) -> Result<Value, ConfigError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UndeclaredAttribute {
                name: name.to_string(),
                location: self.location.clone(),
            })
    }

    /// Optional string attribute
    pub fn get_str(&self, name: &str) -> Result<Option<String>, ConfigError> {
        match self.parse(name)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(self.mismatch(name, "expected a string", &other)),
        }
    }

    /// String attribute that must resolve to a value
    pub fn require_str(&self, name: &str) -> Result<String, ConfigError> {
        self.get_str(name)?
            .ok_or_else(|| self.missing(name))
    }

    pub fn get_i64(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        match self.parse(name)? {
            Value::Null => Ok(None),
            Value::Number(n) if n.is_i64() => Ok(n.as_i64()),
            other => Err(self.mismatch(name, "expected an integer", &other)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        match self.parse(name)? {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(b)),
            other => Err(self.mismatch(name, "expected a boolean", &other)),
        }
    }

    pub fn get_object(&self, name: &str) -> Result<Option<Map<String, Value>>, ConfigError> {
        match self.parse(name)? {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(map)),
            other => Err(self.mismatch(name, "expected a map", &other)),
        }
    }

    pub fn get_list(&self, name: &str) -> Result<Option<Vec<Value>>, ConfigError> {
        match self.parse(name)? {
            Value::Null => Ok(None),
            Value::Array(items) => Ok(Some(items)),
            other => Err(self.mismatch(name, "expected a list", &other)),
        }
    }

    /// Timestamp attribute normalised by [`validators::timestamp`]
    pub fn get_timestamp(&self, name: &str) -> Result<Option<chrono::NaiveDateTime>, ConfigError> {
        match self.get_str(name)? {
            None => Ok(None),
            Some(raw) => validators::parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| ConfigError::TypeMismatch {
                    field: name.to_string(),
                    location: self.location.clone(),
                    cause: format!("expected a normalised timestamp, found '{}'", raw),
                }),
        }
    }

    /// Fail when both alternate attributes resolve to a value
    pub fn ensure_exclusive(&self, first: &str, second: &str) -> Result<(), ConfigError> {
        if self.is_set(first)? && self.is_set(second)? {
            return Err(ConfigError::MutuallyExclusiveFields {
                first: first.to_string(),
                second: second.to_string(),
                location: self.location.clone(),
            });
        }
        Ok(())
    }

    /// Fail when any trigger attribute is set but `field` is not
    pub fn ensure_companion(&self, field: &str, triggers: &[&str]) -> Result<(), ConfigError> {
        for trigger in triggers {
            if self.is_set(trigger)? && !self.is_set(field)? {
                return Err(ConfigError::MissingCompanionField {
                    field: field.to_string(),
                    trigger: trigger.to_string(),
                    location: self.location.clone(),
                });
            }
        }
        Ok(())
    }

    /// Whether an attribute resolves to a non-null value
    pub fn is_set(&self, name: &str) -> Result<bool, ConfigError> {
        Ok(!self.parse(name)?.is_null())
    }

    fn resolve(&self, attribute: &Attribute) -> Result<Value, ConfigError> {
        match lookup(&self.raw, attribute.parent_path(), attribute.name()) {
            Some(Value::Null) if attribute.is_nullable() => return Ok(Value::Null),
            Some(Value::Null) | None => {}
            Some(value) => {
                return attribute
                    .validate(value)
                    .map_err(|cause| ConfigError::TypeMismatch {
                        field: attribute.qualified_name(),
                        location: self.location.clone(),
                        cause,
                    });
            }
        }

        if let Some(default) = attribute.default() {
            return Ok(default.resolve());
        }

        if let Some(auto) = attribute.auto() {
            return Ok(auto.clone());
        }

        if attribute.is_required() {
            return Err(ConfigError::MissingRequiredField {
                field: attribute.qualified_name(),
                location: self.location.clone(),
            });
        }

        Ok(Value::Null)
    }

    fn warn_undeclared_keys(&self) {
        if let Value::Object(map) = &self.raw {
            for key in map.keys() {
                if !self.attributes.claims_top_level_key(key) {
                    tracing::warn!(location = %self.location, key = %key, "undeclared configuration key");
                }
            }
        }
    }

    fn missing(&self, name: &str) -> ConfigError {
        let field = self
            .attributes
            .get(name)
            .map(Attribute::qualified_name)
            .unwrap_or_else(|| name.to_string());

        ConfigError::MissingRequiredField {
            field,
            location: self.location.clone(),
        }
    }

    fn mismatch(&self, name: &str, expected: &str, found: &Value) -> ConfigError {
        ConfigError::TypeMismatch {
            field: name.to_string(),
            location: self.location.clone(),
            cause: format!("{}, found {}", expected, type_name(found)),
        }
    }
}

/// Walk `parent_path` inside `raw` and return the value stored under `name`.
///
/// Any missing or non-map container on the way yields `None`.
pub fn lookup<'a>(raw: &'a Value, parent_path: &[String], name: &str) -> Option<&'a Value> {
    let mut current = raw;
    for key in parent_path {
        current = current.as_object()?.get(key)?;
    }
    current.as_object()?.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn pipeline_attributes() -> AttributeSet {
        AttributeSet::from_attributes([
            Attribute::new("owner").validator(validators::string),
            Attribute::new("retries").optional().validator(validators::integer),
            Attribute::new("pool").default_value("default_pool"),
            Attribute::new("type").auto_value("batch"),
            Attribute::new("default_args")
                .nullable()
                .validator(validators::object)
                .parent(&["airflow_parameters"]),
        ])
        .unwrap()
    }

    fn validate(raw: Value) -> Result<ConfigValidator, ConfigError> {
        ConfigValidator::new("dags/p/pipeline.yaml", raw, pipeline_attributes())
    }

    #[test]
    fn resolves_all_sources() {
        let validator = validate(json!({
            "owner": "team@example.com",
            "retries": "3",
            "airflow_parameters": {"default_args": {"retries": 1}},
        }))
        .unwrap();

        assert_eq!(validator.parse("owner").unwrap(), json!("team@example.com"));
        assert_eq!(validator.get_i64("retries").unwrap(), Some(3));
        assert_eq!(validator.parse("pool").unwrap(), json!("default_pool"));
        assert_eq!(validator.parse("type").unwrap(), json!("batch"));
        assert_eq!(
            validator.get_object("default_args").unwrap().unwrap()["retries"],
            json!(1)
        );
    }

    #[test]
    fn missing_required_field() {
        let err = validate(json!({"airflow_parameters": {"default_args": null}})).unwrap_err();

        assert_eq!(
            err,
            ConfigError::MissingRequiredField {
                field: "owner".to_string(),
                location: "dags/p/pipeline.yaml".to_string(),
            }
        );
    }

    #[test]
    fn missing_nested_field_reports_path() {
        let err = validate(json!({"owner": "me"})).unwrap_err();
        assert_eq!(err.field(), Some("airflow_parameters.default_args"));
    }

    #[test]
    fn explicit_null_on_nullable_field() {
        let validator = validate(json!({
            "owner": "me",
            "airflow_parameters": {"default_args": null},
        }))
        .unwrap();

        assert_eq!(validator.get_object("default_args").unwrap(), None);
    }

    #[test]
    fn explicit_null_on_non_nullable_field_uses_default() {
        let validator = validate(json!({
            "owner": "me",
            "pool": null,
            "airflow_parameters": {"default_args": null},
        }))
        .unwrap();

        assert_eq!(validator.parse("pool").unwrap(), json!("default_pool"));
    }

    #[test]
    fn validator_failure_is_type_mismatch() {
        let err = validate(json!({
            "owner": "me",
            "retries": "many",
            "airflow_parameters": {"default_args": null},
        }))
        .unwrap_err();

        match err {
            ConfigError::TypeMismatch { field, cause, .. } => {
                assert_eq!(field, "retries");
                assert!(cause.contains("many"));
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn parse_is_idempotent() {
        let validator = validate(json!({
            "owner": "me",
            "airflow_parameters": {"default_args": {"a": 1}},
        }))
        .unwrap();

        for name in ["owner", "retries", "pool", "type", "default_args"] {
            assert_eq!(validator.parse(name).unwrap(), validator.parse(name).unwrap());
        }
    }

    #[test]
    fn default_provider_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let attributes = AttributeSet::from_attributes([Attribute::new("run_id")
            .default_with(move || json!(counter.fetch_add(1, Ordering::SeqCst)))])
        .unwrap();

        let validator = ConfigValidator::new("t.yaml", json!({}), attributes).unwrap();
        let first = validator.parse("run_id").unwrap();

        assert_eq!(validator.parse("run_id").unwrap(), first);
        assert_eq!(validator.get_i64("run_id").unwrap(), Some(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn undeclared_attribute_lookup() {
        let validator = validate(json!({
            "owner": "me",
            "airflow_parameters": {"default_args": null},
        }))
        .unwrap();

        assert_eq!(
            validator.parse("schedule").unwrap_err().code(),
            crate::ErrorCode::UndeclaredAttribute
        );
    }

    #[test]
    fn non_map_document_rejected() {
        let err = ConfigValidator::new("x.yaml", json!([1, 2]), pipeline_attributes()).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::InvalidDocument);
    }

    #[test]
    fn exclusive_and_companion_checks() {
        let attributes = AttributeSet::from_attributes([
            Attribute::new("hash_column").optional(),
            Attribute::new("updated_at_column").optional(),
            Attribute::new("from_time").optional(),
        ])
        .unwrap();

        let both = ConfigValidator::new(
            "t.yaml",
            json!({"hash_column": "h", "updated_at_column": "u", "from_time": "x"}),
            attributes.clone(),
        )
        .unwrap();
        assert_eq!(
            both.ensure_exclusive("hash_column", "updated_at_column")
                .unwrap_err()
                .code(),
            crate::ErrorCode::MutuallyExclusiveFields
        );

        let no_companion =
            ConfigValidator::new("t.yaml", json!({"hash_column": "h"}), attributes).unwrap();
        assert_eq!(
            no_companion
                .ensure_companion("from_time", &["hash_column", "updated_at_column"])
                .unwrap_err(),
            ConfigError::MissingCompanionField {
                field: "from_time".to_string(),
                trigger: "hash_column".to_string(),
                location: "t.yaml".to_string(),
            }
        );
    }

    #[test]
    fn lookup_through_missing_container() {
        let raw = json!({"a": {"b": 1}, "c": 5});
        assert_eq!(lookup(&raw, &["a".to_string()], "b"), Some(&json!(1)));
        assert_eq!(lookup(&raw, &["c".to_string()], "b"), None);
        assert_eq!(lookup(&raw, &["z".to_string()], "b"), None);
    }
}
