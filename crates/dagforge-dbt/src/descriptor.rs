//! IO descriptors
//!
//! A descriptor is the plain map form of an IO config (`type`, `name` plus
//! kind-specific fields), ready to be validated as an `IoModel`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(Map<String, Value>);

impl Descriptor {
    pub fn new(kind: &str, name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::from(kind));
        fields.insert("name".to_string(), Value::String(name.into()));
        Self(fields)
    }

    /// Set a field, replacing any previous value
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Set `follow_external_dependency: true`; unset otherwise
    pub fn following(self, follow: bool) -> Self {
        if follow {
            self.with("follow_external_dependency", true)
        } else {
            self
        }
    }

    pub fn kind(&self) -> &str {
        self.get_str("type").unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.get_str("name").unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Raw config tree for IO validation
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Key-order independent identity of the full field set
    fn identity(&self) -> String {
        canonical(&Value::Object(self.0.clone())).to_string()
    }
}

/// `value` with object keys sorted at every depth
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(fields) => {
            let sorted: BTreeMap<&String, Value> = fields
                .iter()
                .map(|(key, value)| (key, canonical(value)))
                .collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(key, value)| (key.clone(), value))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

impl From<Map<String, Value>> for Descriptor {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Drop descriptors whose full field set was already seen; first occurrence wins
pub fn dedup(descriptors: Vec<Descriptor>) -> Vec<Descriptor> {
    let mut seen = HashSet::with_capacity(descriptors.len());
    descriptors
        .into_iter()
        .filter(|descriptor| seen.insert(descriptor.identity()))
        .collect()
}
