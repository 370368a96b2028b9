//! dagforge core
//!
//! Declarative attribute schemas and the validator every config entity is
//! built on. Error codes are part of the public API - never rename them.

pub mod attribute;
pub mod error;
pub mod registry;
pub mod settings;
pub mod validator;
pub mod validators;

pub use attribute::{Attribute, AttributeSet, DefaultValue};
pub use error::{ConfigError, ErrorCode};
pub use registry::{Constructor, RegistryContext, TypeRegistry};
pub use settings::{
    AdapterKind, AlertSettings, BatchDefaults, LineageSettings, ReverseEtlDefaults, Settings,
    SettingsError, SodaDefaults,
};
pub use validator::ConfigValidator;
