//! Lineage compilation errors

use dagforge_core::{ConfigError, ErrorCode};

/// Lineage compilation for one target is all-or-nothing: any of these aborts it
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineageError {
    #[error("'{referenced_by}' depends on '{id}', which is neither a node nor a source")]
    UnresolvedDependency { id: String, referenced_by: String },

    #[error("dependency cycle: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("model '{0}' not found in manifest. Try using the full unique_id (e.g., 'model.project.{0}')")]
    ModelNotFound(String),

    #[error("node '{node}' has no '{field}', which the {adapter} adapter needs")]
    MissingNodeMetadata {
        node: String,
        field: String,
        adapter: String,
    },

    #[error("node '{node}': cannot split '{location}' into bucket and path")]
    InvalidLocation { node: String, location: String },

    #[error("compiled descriptor is not a valid IO: {0}")]
    Descriptor(#[from] ConfigError),
}

impl LineageError {
    /// Stable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnresolvedDependency { .. } => ErrorCode::UnresolvedDependency,
            Self::CyclicDependency { .. } => ErrorCode::CyclicDependency,
            Self::ModelNotFound(_) => ErrorCode::ModelNotFound,
            Self::MissingNodeMetadata { .. } => ErrorCode::MissingNodeMetadata,
            Self::InvalidLocation { .. } => ErrorCode::InvalidLocation,
            Self::Descriptor(err) => err.code(),
        }
    }
}

/// Manifest and profile loading errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}
