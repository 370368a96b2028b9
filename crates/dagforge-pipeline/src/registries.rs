//! Registries and settings shared by every pipeline built in one process

use std::path::Path;
use std::sync::Arc;

use dagforge_core::Settings;

use crate::io::{builtin_io_registry, IoRegistry};
use crate::task::{builtin_task_registry, TaskContext, TaskRegistry};

/// Kind registries plus the settings they construct against
#[derive(Debug)]
pub struct Registries {
    pub io: Arc<IoRegistry>,
    pub tasks: TaskRegistry,
    pub settings: Arc<Settings>,
}

impl Registries {
    /// Built-in IO and task kinds
    pub fn builtin(settings: Settings) -> Self {
        Self::new(builtin_io_registry(), builtin_task_registry(), settings)
    }

    /// Registries already extended by a plugin loader
    pub fn new(io: IoRegistry, tasks: TaskRegistry, settings: Settings) -> Self {
        Self {
            io: Arc::new(io),
            tasks,
            settings: Arc::new(settings),
        }
    }

    /// Construction context for the task `name` of a pipeline
    pub fn task_context(&self, name: &str, pipeline_name: &str, directory: &Path) -> TaskContext {
        TaskContext::new(
            name,
            pipeline_name,
            directory,
            Arc::clone(&self.settings),
            Arc::clone(&self.io),
        )
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::builtin(Settings::default())
    }
}
