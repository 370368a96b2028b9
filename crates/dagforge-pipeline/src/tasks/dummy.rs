use std::any::Any;

use dagforge_core::{Attribute, ConfigError, ConfigValidator};

use crate::task::{DeclaredTask, TaskContext, TaskKind};

/// Does nothing; joins branches of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DummyTask;

impl TaskKind for DummyTask {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeclaredTask for DummyTask {
    const KIND: &'static str = "dummy";

    fn attributes() -> Vec<Attribute> {
        Vec::new()
    }

    fn from_config(_config: &ConfigValidator, _context: &TaskContext) -> Result<Self, ConfigError> {
        Ok(Self)
    }
}
