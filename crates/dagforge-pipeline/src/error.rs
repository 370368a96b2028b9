//! Pipeline errors

use dagforge_core::ConfigError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("pipeline '{pipeline}' already has a task named '{name}'")]
    DuplicateTask { name: String, pipeline: String },

    #[error("invalid pipeline bundle: {0}")]
    InvalidBundle(String),
}
