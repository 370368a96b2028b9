//! Tasks
//!
//! A task is one unit of work inside a pipeline. Every kind shares the base
//! attributes declared here and appends its own; kind-specific invariants are
//! checked before any input or output is constructed.

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use dagforge_core::{
    validators, Attribute, AttributeSet, ConfigError, ConfigValidator, Constructor,
    RegistryContext, Settings, TypeRegistry,
};
use serde_json::{Map, Value};

use crate::io::{IoContext, IoModel, IoRegistry};
use crate::tasks::{BatchTask, DbtTask, DummyTask, ReverseEtlTask, SodaTask};

/// Behaviour of one task kind
pub trait TaskKind: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// A task kind that can be declared in configuration
pub trait DeclaredTask: TaskKind + Sized + 'static {
    /// Discriminator in the `type` field
    const KIND: &'static str;

    /// Pool used when the task declares none
    fn default_pool(_context: &TaskContext) -> Option<String> {
        None
    }

    /// Kind-specific attributes, appended after the base task attributes
    fn attributes() -> Vec<Attribute>;

    fn from_config(config: &ConfigValidator, context: &TaskContext) -> Result<Self, ConfigError>;
}

/// Owner context for task construction
///
/// Holds the owning pipeline by name only; the pipeline owns its tasks.
#[derive(Debug, Clone)]
pub struct TaskContext {
    name: String,
    pipeline_name: String,
    location: String,
    settings: Arc<Settings>,
    io_registry: Arc<IoRegistry>,
}

impl TaskContext {
    /// Context for the task `name` stored in `directory`
    pub fn new(
        name: impl Into<String>,
        pipeline_name: impl Into<String>,
        directory: &Path,
        settings: Arc<Settings>,
        io_registry: Arc<IoRegistry>,
    ) -> Self {
        let name = name.into();
        let location = directory
            .join(format!("{}.yaml", name))
            .display()
            .to_string();

        Self {
            name,
            pipeline_name: pipeline_name.into(),
            location,
            settings,
            io_registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn io_registry(&self) -> &IoRegistry {
        &self.io_registry
    }
}

impl RegistryContext for TaskContext {
    fn location(&self) -> &str {
        &self.location
    }
}

pub type TaskRegistry = TypeRegistry<TaskModel, TaskContext>;

fn base_attributes(kind: &'static str) -> Vec<Attribute> {
    vec![
        Attribute::new("type").auto_value(kind).validator(validators::string),
        Attribute::new("description").validator(validators::string),
        Attribute::new("inputs").nullable().validator(validators::list),
        Attribute::new("outputs").nullable().validator(validators::list),
        Attribute::new("pool").optional().validator(validators::string),
        Attribute::new("task_group")
            .optional()
            .validator(validators::string)
            .help("Task group name"),
        Attribute::new("timeout_in_seconds")
            .optional()
            .validator(validators::integer),
        Attribute::new("airflow_task_parameters")
            .optional()
            .nullable()
            .validator(validators::object),
        Attribute::new("template_parameters")
            .optional()
            .nullable()
            .validator(validators::object),
        Attribute::new("task_parameters")
            .optional()
            .nullable()
            .validator(validators::object),
    ]
}

/// A validated task
pub struct TaskModel {
    kind: &'static str,
    name: String,
    pipeline_name: String,
    location: String,
    description: String,
    inputs: Vec<IoModel>,
    outputs: Vec<IoModel>,
    pool: Option<String>,
    task_group: Option<String>,
    timeout_in_seconds: Option<i64>,
    airflow_parameters: Map<String, Value>,
    template_parameters: Map<String, Value>,
    task_parameters: Option<Map<String, Value>>,
    inner: Box<dyn TaskKind>,
}

impl TaskModel {
    /// Validate `raw` as a task of kind `K`
    pub fn build<K: DeclaredTask>(raw: &Value, context: &TaskContext) -> Result<Self, ConfigError> {
        let attributes = AttributeSet::from_attributes(base_attributes(K::KIND))?
            .extend(K::attributes())?;
        let config = ConfigValidator::new(context.location(), raw.clone(), attributes)?;

        let inner = K::from_config(&config, context)?;

        let mut task = Self {
            kind: K::KIND,
            name: context.name().to_string(),
            pipeline_name: context.pipeline_name().to_string(),
            location: context.location().to_string(),
            description: config.require_str("description")?,
            inputs: Vec::new(),
            outputs: Vec::new(),
            pool: config.get_str("pool")?.or_else(|| K::default_pool(context)),
            task_group: config.get_str("task_group")?,
            timeout_in_seconds: config.get_i64("timeout_in_seconds")?,
            airflow_parameters: config.get_object("airflow_task_parameters")?.unwrap_or_default(),
            template_parameters: config.get_object("template_parameters")?.unwrap_or_default(),
            task_parameters: config.get_object("task_parameters")?,
            inner: Box::new(inner),
        };

        let io_context = IoContext::new(context.location());
        for raw_io in config.get_list("inputs")?.unwrap_or_default() {
            let io = context.io_registry().create_from_config(&raw_io, &io_context)?;
            task.add_input(io);
        }
        for raw_io in config.get_list("outputs")?.unwrap_or_default() {
            let io = context.io_registry().create_from_config(&raw_io, &io_context)?;
            task.add_output(io);
        }

        Ok(task)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning pipeline
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    /// `{task}:{pipeline}`, unique across all pipelines
    pub fn uniq_name(&self) -> String {
        format!("{}:{}", self.name, self.pipeline_name)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn inputs(&self) -> &[IoModel] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[IoModel] {
        &self.outputs
    }

    pub fn pool(&self) -> Option<&str> {
        self.pool.as_deref()
    }

    pub fn task_group(&self) -> Option<&str> {
        self.task_group.as_deref()
    }

    pub fn timeout_in_seconds(&self) -> Option<i64> {
        self.timeout_in_seconds
    }

    pub fn airflow_parameters(&self) -> &Map<String, Value> {
        &self.airflow_parameters
    }

    /// Opaque to validation; consumed by templating
    pub fn template_parameters(&self) -> &Map<String, Value> {
        &self.template_parameters
    }

    pub fn task_parameters(&self) -> Option<&Map<String, Value>> {
        self.task_parameters.as_ref()
    }

    /// Kind-specific view, e.g. `task.downcast_ref::<BatchTask>()`
    pub fn downcast_ref<K: TaskKind + 'static>(&self) -> Option<&K> {
        self.inner.as_any().downcast_ref::<K>()
    }

    fn add_input(&mut self, io: IoModel) {
        tracing::info!(io = %io.name(), task = %self.name, "adding input");
        self.inputs.push(io);
    }

    fn add_output(&mut self, io: IoModel) {
        tracing::info!(io = %io.name(), task = %self.name, "adding output");
        self.outputs.push(io);
    }
}

impl fmt::Debug for TaskModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskModel")
            .field("kind", &self.kind)
            .field("uniq_name", &self.uniq_name())
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("inner", &self.inner)
            .finish()
    }
}

/// Shared constructor for a declared task kind
pub fn task_constructor<K: DeclaredTask>() -> Constructor<TaskModel, TaskContext> {
    Arc::new(|raw: &Value, context: &TaskContext| TaskModel::build::<K>(raw, context))
}

/// Register a declared task kind under its discriminator
pub fn register_task<K: DeclaredTask>(registry: &mut TaskRegistry) {
    registry.register_shared(K::KIND, task_constructor::<K>());
}

/// Registry holding every built-in task kind
pub fn builtin_task_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new("task");
    register_task::<BatchTask>(&mut registry);
    register_task::<DbtTask>(&mut registry);
    register_task::<SodaTask>(&mut registry);
    register_task::<ReverseEtlTask>(&mut registry);
    register_task::<DummyTask>(&mut registry);
    registry
}
