use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};

use crate::task::{DeclaredTask, TaskContext, TaskKind};

/// Job submission fields shared by every batch-backed kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    job_name: Option<String>,
    executable: Option<String>,
    executable_prefix: Option<String>,
    job_queue: Option<String>,
    max_retries: Option<i64>,
}

impl BatchJob {
    /// Attributes stored under `task_parameters`
    pub(crate) fn attributes(executable_required: bool) -> Vec<Attribute> {
        let executable = Attribute::new("executable")
            .validator(validators::string)
            .parent(&["task_parameters"])
            .help("E.g.: my_code.py");

        vec![
            Attribute::new("job_name")
                .optional()
                .validator(validators::string)
                .parent(&["task_parameters"])
                .help("Job definition name, relative to the jobs root"),
            if executable_required {
                executable
            } else {
                executable.optional()
            },
            Attribute::new("executable_prefix")
                .optional()
                .validator(validators::string)
                .parent(&["task_parameters"])
                .help("E.g.: python"),
            Attribute::new("job_queue")
                .optional()
                .validator(validators::string)
                .parent(&["task_parameters"]),
            Attribute::new("max_retries")
                .optional()
                .validator(validators::integer)
                .parent(&["task_parameters"]),
        ]
    }

    /// Read the job fields; the queue falls back to `[batch].default_queue`
    pub(crate) fn from_config(
        config: &ConfigValidator,
        context: &TaskContext,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            job_name: config.get_str("job_name")?,
            executable: config.get_str("executable")?,
            executable_prefix: config.get_str("executable_prefix")?,
            job_queue: config
                .get_str("job_queue")?
                .or_else(|| context.settings().batch.default_queue.clone()),
            max_retries: config.get_i64("max_retries")?,
        })
    }

    /// Fill unset job fields from kind-level defaults
    pub(crate) fn or_defaults(
        mut self,
        job_name: Option<&str>,
        executable: Option<&str>,
        executable_prefix: Option<&str>,
    ) -> Self {
        fn fill(slot: &mut Option<String>, fallback: Option<&str>) {
            if slot.is_none() {
                *slot = fallback.map(str::to_string);
            }
        }

        fill(&mut self.job_name, job_name);
        fill(&mut self.executable, executable);
        fill(&mut self.executable_prefix, executable_prefix);
        self
    }

    pub fn job_name(&self) -> Option<&str> {
        self.job_name.as_deref()
    }

    pub fn executable(&self) -> Option<&str> {
        self.executable.as_deref()
    }

    pub fn executable_prefix(&self) -> Option<&str> {
        self.executable_prefix.as_deref()
    }

    pub fn job_queue(&self) -> Option<&str> {
        self.job_queue.as_deref()
    }

    pub fn max_retries(&self) -> Option<i64> {
        self.max_retries
    }
}

/// Runs an executable as a batch job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTask {
    job: BatchJob,
}

impl BatchTask {
    pub fn job(&self) -> &BatchJob {
        &self.job
    }
}

impl TaskKind for BatchTask {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeclaredTask for BatchTask {
    const KIND: &'static str = "batch";

    fn default_pool(context: &TaskContext) -> Option<String> {
        context.settings().batch.default_pool.clone()
    }

    fn attributes() -> Vec<Attribute> {
        BatchJob::attributes(true)
    }

    fn from_config(config: &ConfigValidator, context: &TaskContext) -> Result<Self, ConfigError> {
        let defaults = &context.settings().batch;
        let job = BatchJob::from_config(config, context)?.or_defaults(
            defaults.default_job_name.as_deref(),
            None,
            None,
        );

        Ok(Self { job })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::builtin_io_registry;
    use crate::task::TaskModel;
    use dagforge_core::{ErrorCode, Settings};
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;

    fn context() -> TaskContext {
        let mut settings = Settings::default();
        settings.batch.default_job_name = Some("common_batch_jobs/default".to_string());
        settings.batch.default_queue = Some("default_queue".to_string());

        TaskContext::new(
            "export",
            "sales",
            Path::new("dags/sales"),
            Arc::new(settings),
            Arc::new(builtin_io_registry()),
        )
    }

    #[test]
    fn job_fields_and_defaults() {
        let task = TaskModel::build::<BatchTask>(
            &json!({
                "type": "batch",
                "description": "export",
                "inputs": null,
                "outputs": null,
                "task_parameters": {"executable": "export.py", "max_retries": "2"},
            }),
            &context(),
        )
        .unwrap();

        let job = task.downcast_ref::<BatchTask>().unwrap().job();
        assert_eq!(job.executable(), Some("export.py"));
        assert_eq!(job.job_name(), Some("common_batch_jobs/default"));
        assert_eq!(job.job_queue(), Some("default_queue"));
        assert_eq!(job.max_retries(), Some(2));
    }

    #[test]
    fn executable_is_required() {
        let err = TaskModel::build::<BatchTask>(
            &json!({
                "type": "batch",
                "description": "export",
                "inputs": null,
                "outputs": null,
                "task_parameters": {},
            }),
            &context(),
        )
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::MissingRequiredField);
        assert_eq!(err.field(), Some("task_parameters.executable"));
    }
}
