use std::any::Any;

use dagforge_core::{Attribute, ConfigError, ConfigValidator};

use crate::io::{DeclaredIo, IoKind};

/// No-op placeholder; stands in for resources nothing can wait on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyIo {
    name: String,
}

impl IoKind for DummyIo {
    fn alias(&self) -> String {
        format!("dummy://{}", self.name)
    }

    fn rendered_name(&self) -> String {
        self.name.clone()
    }

    fn external_name(&self) -> String {
        format!("dummy-{}", self.name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeclaredIo for DummyIo {
    const KIND: &'static str = "dummy";

    fn attributes() -> Vec<Attribute> {
        Vec::new()
    }

    fn from_config(config: &ConfigValidator) -> Result<Self, ConfigError> {
        Ok(Self {
            name: config.require_str("name")?,
        })
    }
}
