//! dagforge pipeline models
//!
//! Pipelines, tasks and their inputs/outputs, each validated through the
//! attribute schemas of `dagforge-core`. Task and IO kinds are dispatched on
//! the `type` field through registries that plugins may extend.

pub mod alert;
pub mod error;
pub mod io;
pub mod ios;
pub mod pipeline;
pub mod registries;
pub mod task;
pub mod tasks;

pub use alert::AlertConfig;
pub use error::PipelineError;
pub use io::{
    builtin_io_registry, io_constructor, register_io, DeclaredIo, IoContext, IoKind, IoModel,
    IoRegistry,
};
pub use pipeline::{pipeline_name, PipelineBundle, PipelineModel};
pub use registries::Registries;
pub use task::{
    builtin_task_registry, register_task, task_constructor, DeclaredTask, TaskContext, TaskKind,
    TaskModel, TaskRegistry,
};
