//! Error codes and validation errors
//!
//! IMPORTANT: Error codes are versioned and stable.
//! NEVER rename or remove codes - downstream tooling matches on them.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Error code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Config validation
    /// A required, non-nullable field has no value
    MissingRequiredField,

    /// A field value was rejected by its validator
    TypeMismatch,

    /// Two alternate fields were both supplied
    MutuallyExclusiveFields,

    /// A field that another field depends on was not supplied
    MissingCompanionField,

    /// A `type` discriminator with no registered constructor
    UnknownKind,

    /// The same attribute name was declared twice in one schema
    DuplicateAttribute,

    /// A field was requested that the schema never declared
    UndeclaredAttribute,

    /// The configuration root is not a map
    InvalidDocument,

    // Lineage compilation
    /// A manifest dependency id is absent from both node tables
    UnresolvedDependency,

    /// The manifest dependency graph contains a cycle
    CyclicDependency,

    /// The target model does not exist in the manifest
    ModelNotFound,

    /// A node lacks metadata the selected adapter needs
    MissingNodeMetadata,

    /// An object-store location could not be split into bucket and path
    InvalidLocation,
}

impl ErrorCode {
    /// Get the error code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::MutuallyExclusiveFields => "MUTUALLY_EXCLUSIVE_FIELDS",
            Self::MissingCompanionField => "MISSING_COMPANION_FIELD",
            Self::UnknownKind => "UNKNOWN_KIND",
            Self::DuplicateAttribute => "DUPLICATE_ATTRIBUTE",
            Self::UndeclaredAttribute => "UNDECLARED_ATTRIBUTE",
            Self::InvalidDocument => "INVALID_DOCUMENT",
            Self::UnresolvedDependency => "UNRESOLVED_DEPENDENCY",
            Self::CyclicDependency => "CYCLIC_DEPENDENCY",
            Self::ModelNotFound => "MODEL_NOT_FOUND",
            Self::MissingNodeMetadata => "MISSING_NODE_METADATA",
            Self::InvalidLocation => "INVALID_LOCATION",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validation failure for one configuration document.
///
/// Every variant that concerns a document carries its source location so the
/// message can point the author at the offending file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{location}: required field '{field}' is missing")]
    MissingRequiredField { field: String, location: String },

    #[error("{location}: field '{field}' has an invalid value: {cause}")]
    TypeMismatch {
        field: String,
        location: String,
        cause: String,
    },

    #[error("{location}: fields '{first}' and '{second}' are mutually exclusive")]
    MutuallyExclusiveFields {
        first: String,
        second: String,
        location: String,
    },

    #[error("{location}: field '{field}' is required when '{trigger}' is set")]
    MissingCompanionField {
        field: String,
        trigger: String,
        location: String,
    },

    #[error("{location}: unknown {family} kind '{kind}'")]
    UnknownKind {
        family: String,
        kind: String,
        location: String,
    },

    #[error("attribute '{name}' is declared more than once")]
    DuplicateAttribute { name: String },

    #[error("{location}: attribute '{name}' is not declared for this document")]
    UndeclaredAttribute { name: String, location: String },

    #[error("{location}: configuration root must be a map, found {found}")]
    InvalidDocument { location: String, found: String },
}

impl ConfigError {
    /// Stable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingRequiredField { .. } => ErrorCode::MissingRequiredField,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::MutuallyExclusiveFields { .. } => ErrorCode::MutuallyExclusiveFields,
            Self::MissingCompanionField { .. } => ErrorCode::MissingCompanionField,
            Self::UnknownKind { .. } => ErrorCode::UnknownKind,
            Self::DuplicateAttribute { .. } => ErrorCode::DuplicateAttribute,
            Self::UndeclaredAttribute { .. } => ErrorCode::UndeclaredAttribute,
            Self::InvalidDocument { .. } => ErrorCode::InvalidDocument,
        }
    }

    /// Name of the offending field, when the error concerns a single one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field, .. }
            | Self::TypeMismatch { field, .. }
            | Self::MissingCompanionField { field, .. } => Some(field),
            Self::DuplicateAttribute { name } | Self::UndeclaredAttribute { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }

    /// Source location of the offending document
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { location, .. }
            | Self::TypeMismatch { location, .. }
            | Self::MutuallyExclusiveFields { location, .. }
            | Self::MissingCompanionField { location, .. }
            | Self::UnknownKind { location, .. }
            | Self::UndeclaredAttribute { location, .. }
            | Self::InvalidDocument { location, .. } => Some(location),
            Self::DuplicateAttribute { .. } => None,
        }
    }
}

/// Short description of a JSON value's type, used in error messages
pub fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "map",
    }
}
