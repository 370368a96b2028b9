use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};
use serde_json::Value;

use super::BatchJob;
use crate::task::{DeclaredTask, TaskContext, TaskKind};

/// Runs a dbt command as a batch job
#[derive(Debug, Clone, PartialEq)]
pub struct DbtTask {
    job: BatchJob,
    project_dir: String,
    profile_dir: String,
    profile_name: String,
    target_name: String,
    dbt_command: String,
    select: Option<String>,
    vars: Option<Value>,
    create_external_athena_table: Option<bool>,
}

impl DbtTask {
    pub fn job(&self) -> &BatchJob {
        &self.job
    }

    pub fn project_dir(&self) -> &str {
        &self.project_dir
    }

    pub fn profile_dir(&self) -> &str {
        &self.profile_dir
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn dbt_command(&self) -> &str {
        &self.dbt_command
    }

    pub fn select(&self) -> Option<&str> {
        self.select.as_deref()
    }

    pub fn vars(&self) -> Option<&Value> {
        self.vars.as_ref()
    }

    /// Task-level override of `[lineage].create_external_athena_table`
    pub fn create_external_athena_table(&self) -> Option<bool> {
        self.create_external_athena_table
    }
}

impl TaskKind for DbtTask {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn parameter(name: &str) -> Attribute {
    Attribute::new(name)
        .validator(validators::string)
        .parent(&["task_parameters"])
}

impl DeclaredTask for DbtTask {
    const KIND: &'static str = "dbt";

    fn default_pool(context: &TaskContext) -> Option<String> {
        context.settings().batch.default_pool.clone()
    }

    fn attributes() -> Vec<Attribute> {
        let mut attributes = BatchJob::attributes(false);
        attributes.extend([
            parameter("project_dir").help("Directory holding dbt_project.yml"),
            parameter("profile_dir").help("Directory holding profiles.yml"),
            parameter("profile_name"),
            parameter("target_name").help("--target option"),
            parameter("dbt_command").help("E.g.: build, run, test"),
            parameter("select").optional().help("--select option"),
            Attribute::new("vars")
                .optional()
                .parent(&["task_parameters"])
                .help("--vars option"),
            Attribute::new("create_external_athena_table")
                .optional()
                .validator(validators::boolean)
                .parent(&["task_parameters"]),
        ]);
        attributes
    }

    fn from_config(config: &ConfigValidator, context: &TaskContext) -> Result<Self, ConfigError> {
        let defaults = &context.settings().batch;
        let job = BatchJob::from_config(config, context)?.or_defaults(
            defaults.default_job_name.as_deref(),
            None,
            None,
        );

        let vars = match config.parse("vars")? {
            Value::Null => None,
            other => Some(other),
        };

        Ok(Self {
            job,
            project_dir: config.require_str("project_dir")?,
            profile_dir: config.require_str("profile_dir")?,
            profile_name: config.require_str("profile_name")?,
            target_name: config.require_str("target_name")?,
            dbt_command: config.require_str("dbt_command")?,
            select: config.get_str("select")?,
            vars,
            create_external_athena_table: config.get_bool("create_external_athena_table")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::builtin_io_registry;
    use crate::task::TaskModel;
    use dagforge_core::Settings;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;

    fn context() -> TaskContext {
        TaskContext::new(
            "build_marts",
            "analytics",
            Path::new("dags/analytics"),
            Arc::new(Settings::default()),
            Arc::new(builtin_io_registry()),
        )
    }

    fn raw() -> Value {
        json!({
            "type": "dbt",
            "description": "build marts",
            "inputs": null,
            "outputs": null,
            "task_parameters": {
                "project_dir": "analytics",
                "profile_dir": "analytics/profiles",
                "profile_name": "athena",
                "target_name": "prod",
                "dbt_command": "build",
                "select": "marts.model1",
                "vars": {"run_date": "2024-01-01"},
                "create_external_athena_table": "true",
            },
        })
    }

    #[test]
    fn dbt_parameters() {
        let task = TaskModel::build::<DbtTask>(&raw(), &context()).unwrap();
        let dbt = task.downcast_ref::<DbtTask>().unwrap();

        assert_eq!(dbt.dbt_command(), "build");
        assert_eq!(dbt.select(), Some("marts.model1"));
        assert_eq!(dbt.vars(), Some(&json!({"run_date": "2024-01-01"})));
        assert_eq!(dbt.create_external_athena_table(), Some(true));
        assert_eq!(dbt.job().executable(), None);
    }

    #[test]
    fn command_is_required() {
        let mut raw = raw();
        raw["task_parameters"]
            .as_object_mut()
            .unwrap()
            .remove("dbt_command");

        let err = TaskModel::build::<DbtTask>(&raw, &context()).unwrap_err();
        assert_eq!(err.field(), Some("task_parameters.dbt_command"));
    }
}
