//! Kind registries
//!
//! Maps the string `type` discriminator of a raw config to the constructor of
//! one member of a polymorphic family (task kinds, IO kinds). Registries are
//! filled once at start-up with the built-in kinds and may be extended with
//! `(name, constructor)` pairs handed over by an external plugin loader.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{type_name, ConfigError};

/// Constructor for one kind: raw config plus owner context in, entity out
pub type Constructor<T, C> = Arc<dyn Fn(&Value, &C) -> Result<T, ConfigError> + Send + Sync>;

/// Owner context handed to constructors
pub trait RegistryContext {
    /// Source location of the document being constructed
    fn location(&self) -> &str;
}

/// Discriminator → constructor table for one family
pub struct TypeRegistry<T, C> {
    family: &'static str,
    constructors: BTreeMap<String, Constructor<T, C>>,
}

impl<T, C: RegistryContext> TypeRegistry<T, C> {
    /// Empty registry; `family` names the kind family in error messages
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            constructors: BTreeMap::new(),
        }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Register one kind. A later registration of the same kind replaces the
    /// earlier one, which is how plugins override built-ins.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        constructor: impl Fn(&Value, &C) -> Result<T, ConfigError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.register_shared(kind, Arc::new(constructor))
    }

    /// Register an already shared constructor
    pub fn register_shared(
        &mut self,
        kind: impl Into<String>,
        constructor: Constructor<T, C>,
    ) -> &mut Self {
        let kind = kind.into();
        if self.constructors.insert(kind.clone(), constructor).is_some() {
            tracing::warn!(family = self.family, kind = %kind, "kind re-registered, replacing previous constructor");
        } else {
            tracing::debug!(family = self.family, kind = %kind, "kind registered");
        }
        self
    }

    /// Register every pair supplied by a plugin loader
    pub fn register_all(
        &mut self,
        plugins: impl IntoIterator<Item = (String, Constructor<T, C>)>,
    ) -> &mut Self {
        for (kind, constructor) in plugins {
            self.register_shared(kind, constructor);
        }
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered discriminators, sorted
    pub fn kinds(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Construct an entity of the given kind
    pub fn create(&self, kind: &str, raw: &Value, context: &C) -> Result<T, ConfigError> {
        let constructor =
            self.constructors
                .get(kind)
                .ok_or_else(|| ConfigError::UnknownKind {
                    family: self.family.to_string(),
                    kind: kind.to_string(),
                    location: context.location().to_string(),
                })?;

        constructor(raw, context)
    }

    /// Construct an entity, reading the kind from the config's `type` field
    pub fn create_from_config(&self, raw: &Value, context: &C) -> Result<T, ConfigError> {
        let kind = match raw.get("type") {
            Some(Value::String(kind)) => kind,
            Some(other) => {
                return Err(ConfigError::TypeMismatch {
                    field: "type".to_string(),
                    location: context.location().to_string(),
                    cause: format!("expected a string, found {}", type_name(other)),
                })
            }
            None => {
                return Err(ConfigError::MissingRequiredField {
                    field: "type".to_string(),
                    location: context.location().to_string(),
                })
            }
        };

        self.create(kind, raw, context)
    }
}

impl<T, C> fmt::Debug for TypeRegistry<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("family", &self.family)
            .field("kinds", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use serde_json::json;

    struct Ctx;

    impl RegistryContext for Ctx {
        fn location(&self) -> &str {
            "tasks/t.yaml"
        }
    }

    fn registry() -> TypeRegistry<String, Ctx> {
        let mut registry = TypeRegistry::new("io");
        registry
            .register("s3", |raw, _| Ok(format!("s3:{}", raw["bucket"])))
            .register("dummy", |_, _| Ok("dummy".to_string()));
        registry
    }

    #[test]
    fn create_by_discriminator() {
        let registry = registry();
        let created = registry
            .create_from_config(&json!({"type": "s3", "bucket": "b"}), &Ctx)
            .unwrap();
        assert_eq!(created, "s3:\"b\"");
        assert_eq!(registry.kinds(), vec!["dummy", "s3"]);
    }

    #[test]
    fn unknown_kind_names_the_string() {
        let err = registry()
            .create_from_config(&json!({"type": "kafka"}), &Ctx)
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::UnknownKind {
                family: "io".to_string(),
                kind: "kafka".to_string(),
                location: "tasks/t.yaml".to_string(),
            }
        );
    }

    #[test]
    fn missing_type_field() {
        let err = registry().create_from_config(&json!({}), &Ctx).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingRequiredField);
    }

    #[test]
    fn plugins_override_builtins() {
        let mut registry = registry();
        let plugin: Constructor<String, Ctx> = Arc::new(|_: &Value, _: &Ctx| Ok("plugin".to_string()));
        registry.register_all([("dummy".to_string(), plugin)]);

        assert_eq!(registry.create("dummy", &json!({}), &Ctx).unwrap(), "plugin");
    }
}
