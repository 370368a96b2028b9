//! Task inputs and outputs
//!
//! Every IO shares the base attributes below; each kind adds its own and
//! supplies the three names an IO is known by:
//! - `alias`: round-trippable identity (kind + location); equal aliases mean
//!   the same external resource
//! - `rendered_name`: what templates and humans see
//! - `external_name`: identifier-safe, for generated resource names

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dagforge_core::{
    validators, Attribute, AttributeSet, ConfigError, ConfigValidator, Constructor,
    RegistryContext, TypeRegistry,
};
use serde_json::Value;

use crate::ios::{AthenaIo, DatabricksIo, DummyIo, DynamoIo, S3Io, SnsIo};

/// Behaviour of one IO kind
pub trait IoKind: fmt::Debug + Send + Sync {
    fn alias(&self) -> String;

    fn rendered_name(&self) -> String;

    fn external_name(&self) -> String;

    fn as_any(&self) -> &dyn Any;
}

/// An IO kind that can be declared in configuration
pub trait DeclaredIo: IoKind + Sized + 'static {
    /// Discriminator in the `type` field
    const KIND: &'static str;

    /// Kind-specific attributes, appended after the base IO attributes
    fn attributes() -> Vec<Attribute>;

    fn from_config(config: &ConfigValidator) -> Result<Self, ConfigError>;
}

/// Owner context for IO construction
#[derive(Debug, Clone)]
pub struct IoContext {
    location: String,
}

impl IoContext {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl RegistryContext for IoContext {
    fn location(&self) -> &str {
        &self.location
    }
}

pub type IoRegistry = TypeRegistry<IoModel, IoContext>;

fn base_attributes(kind: &'static str) -> Vec<Attribute> {
    vec![
        Attribute::new("type").auto_value(kind).validator(validators::string),
        Attribute::new("name").validator(validators::string),
        Attribute::new("has_dependency")
            .default_value(true)
            .validator(validators::boolean)
            .help("Whether the task waits for this input to be produced"),
        Attribute::new("follow_external_dependency")
            .default_value(false)
            .validator(validators::boolean)
            .help("Wait on the producing task even when it lives in another pipeline"),
    ]
}

/// A validated input or output of a task
pub struct IoModel {
    kind: &'static str,
    name: String,
    has_dependency: bool,
    follow_external_dependency: bool,
    inner: Box<dyn IoKind>,
}

impl IoModel {
    /// Validate `raw` as an IO of kind `K`
    pub fn build<K: DeclaredIo>(raw: &Value, context: &IoContext) -> Result<Self, ConfigError> {
        let attributes = AttributeSet::from_attributes(base_attributes(K::KIND))?
            .extend(K::attributes())?;
        let config = ConfigValidator::new(context.location(), raw.clone(), attributes)?;

        let inner = K::from_config(&config)?;

        Ok(Self {
            kind: K::KIND,
            name: config.require_str("name")?,
            has_dependency: config.get_bool("has_dependency")?.unwrap_or(true),
            follow_external_dependency: config
                .get_bool("follow_external_dependency")?
                .unwrap_or(false),
            inner: Box::new(inner),
        })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_dependency(&self) -> bool {
        self.has_dependency
    }

    pub fn follow_external_dependency(&self) -> bool {
        self.follow_external_dependency
    }

    pub fn alias(&self) -> String {
        self.inner.alias()
    }

    pub fn rendered_name(&self) -> String {
        self.inner.rendered_name()
    }

    pub fn external_name(&self) -> String {
        self.inner.external_name()
    }

    /// Kind-specific view, e.g. `io.downcast_ref::<S3Io>()`
    pub fn downcast_ref<K: IoKind + 'static>(&self) -> Option<&K> {
        self.inner.as_any().downcast_ref::<K>()
    }
}

impl fmt::Debug for IoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoModel")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("alias", &self.alias())
            .finish()
    }
}

impl PartialEq for IoModel {
    fn eq(&self, other: &Self) -> bool {
        self.alias() == other.alias()
    }
}

impl Eq for IoModel {}

impl Hash for IoModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alias().hash(state);
    }
}

/// Shared constructor for a declared IO kind
pub fn io_constructor<K: DeclaredIo>() -> Constructor<IoModel, IoContext> {
    Arc::new(|raw: &Value, context: &IoContext| IoModel::build::<K>(raw, context))
}

/// Register a declared IO kind under its discriminator
pub fn register_io<K: DeclaredIo>(registry: &mut IoRegistry) {
    registry.register_shared(K::KIND, io_constructor::<K>());
}

/// Registry holding every built-in IO kind
pub fn builtin_io_registry() -> IoRegistry {
    let mut registry = IoRegistry::new("io");
    register_io::<S3Io>(&mut registry);
    register_io::<AthenaIo>(&mut registry);
    register_io::<DatabricksIo>(&mut registry);
    register_io::<DynamoIo>(&mut registry);
    register_io::<SnsIo>(&mut registry);
    register_io::<DummyIo>(&mut registry);
    registry
}
