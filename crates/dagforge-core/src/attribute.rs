//! Attribute schemas
//!
//! An [`Attribute`] describes one named field of a configuration document:
//! whether it is required, whether an explicit null is allowed, how a missing
//! value is filled in, how a present value is validated, and where in the
//! nested document the value lives.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigError;

/// Validator: raw value in, normalised value or a human-readable cause out
pub type ValidatorFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Fallback used when a field is absent from the document
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value
    Value(Value),

    /// A zero-argument provider, evaluated on every lookup
    Provider(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the default value
    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Provider(provider) => provider(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// Schema for one named field
#[derive(Clone)]
pub struct Attribute {
    name: String,
    required: bool,
    nullable: bool,
    default: Option<DefaultValue>,
    auto_value: Option<Value>,
    validator: Option<ValidatorFn>,
    parent_path: Vec<String>,
    help: Option<String>,
}

impl Attribute {
    /// A required, non-nullable top-level field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            nullable: false,
            default: None,
            auto_value: None,
            validator: None,
            parent_path: Vec::new(),
            help: None,
        }
    }

    /// Mark the field optional; a missing value resolves to null
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Allow an explicit null to stand as the field's value
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Fixed fallback for a missing value
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Computed fallback for a missing value
    pub fn default_with(mut self, provider: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Provider(Arc::new(provider)));
        self
    }

    /// Value derived from the owning entity's identity, such as its type tag
    pub fn auto_value(mut self, value: impl Into<Value>) -> Self {
        self.auto_value = Some(value.into());
        self
    }

    /// Validate and normalise a present value
    pub fn validator(
        mut self,
        validator: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Store the field under nested container keys instead of the top level
    pub fn parent(mut self, path: &[&str]) -> Self {
        self.parent_path = path.iter().map(|key| key.to_string()).collect();
        self
    }

    /// Documentation only
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn auto(&self) -> Option<&Value> {
        self.auto_value.as_ref()
    }

    pub fn parent_path(&self) -> &[String] {
        &self.parent_path
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Run the validator, if one is declared
    pub fn validate(&self, value: &Value) -> Result<Value, String> {
        match &self.validator {
            Some(validator) => validator(value),
            None => Ok(value.clone()),
        }
    }

    /// Dotted path of the field inside the document, e.g. `task_parameters.executable`
    pub fn qualified_name(&self) -> String {
        if self.parent_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.parent_path.join("."), self.name)
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("nullable", &self.nullable)
            .field("default", &self.default)
            .field("auto_value", &self.auto_value)
            .field("has_validator", &self.validator.is_some())
            .field("parent_path", &self.parent_path)
            .finish()
    }
}

/// Ordered attribute list for one entity type, base attributes first
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, rejecting duplicate names
    pub fn from_attributes(
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Result<Self, ConfigError> {
        Self::new().extend(attributes)
    }

    /// Append one attribute
    pub fn add(&mut self, attribute: Attribute) -> Result<(), ConfigError> {
        if self.get(attribute.name()).is_some() {
            return Err(ConfigError::DuplicateAttribute {
                name: attribute.name().to_string(),
            });
        }
        self.attributes.push(attribute);
        Ok(())
    }

    /// Append a subtype's attributes after the ones already declared
    pub fn extend(
        mut self,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Result<Self, ConfigError> {
        for attribute in attributes {
            self.add(attribute)?;
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(Attribute::name).collect()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Whether a top-level document key is claimed by any attribute,
    /// either as a field name or as the first container on a parent path
    pub fn claims_top_level_key(&self, key: &str) -> bool {
        self.attributes.iter().any(|attr| match attr.parent_path().first() {
            Some(container) => container == key,
            None => attr.name() == key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_defaults() {
        let attr = Attribute::new("owner");
        assert!(attr.is_required());
        assert!(!attr.is_nullable());
        assert!(attr.default().is_none());
        assert_eq!(attr.qualified_name(), "owner");
    }

    #[test]
    fn nested_qualified_name() {
        let attr = Attribute::new("default_args").parent(&["airflow_parameters"]);
        assert_eq!(attr.qualified_name(), "airflow_parameters.default_args");
    }

    #[test]
    fn provider_default_is_evaluated() {
        let attr = Attribute::new("retries").default_with(|| json!(3));
        assert_eq!(attr.default().map(DefaultValue::resolve), Some(json!(3)));
    }

    #[test]
    fn duplicate_names_rejected() {
        let base = AttributeSet::from_attributes([Attribute::new("name"), Attribute::new("pool")])
            .unwrap();

        let err = base.extend([Attribute::new("pool").optional()]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateAttribute {
                name: "pool".to_string()
            }
        );
    }

    #[test]
    fn subtype_attributes_follow_base() {
        let set = AttributeSet::from_attributes([Attribute::new("type"), Attribute::new("name")])
            .unwrap()
            .extend([Attribute::new("executable").parent(&["task_parameters"])])
            .unwrap();

        assert_eq!(set.names(), vec!["type", "name", "executable"]);
        assert!(set.claims_top_level_key("task_parameters"));
        assert!(!set.claims_top_level_key("executable"));
    }
}
