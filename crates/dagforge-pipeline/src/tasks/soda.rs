use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};

use super::BatchJob;
use crate::task::{DeclaredTask, TaskContext, TaskKind};

/// Data-quality scan of one table or dbt model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SodaTask {
    job: BatchJob,
    target_name: String,
    project_dir: Option<String>,
    profiles_dir: Option<String>,
    profile_name: Option<String>,
    output_table: Option<String>,
    output_s3_path: Option<String>,
    table_name: Option<String>,
    model_name: Option<String>,
    vars: Option<String>,
}

impl SodaTask {
    pub fn job(&self) -> &BatchJob {
        &self.job
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn project_dir(&self) -> Option<&str> {
        self.project_dir.as_deref()
    }

    pub fn profiles_dir(&self) -> Option<&str> {
        self.profiles_dir.as_deref()
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile_name.as_deref()
    }

    /// Table receiving the scan results
    pub fn output_table(&self) -> Option<&str> {
        self.output_table.as_deref()
    }

    pub fn output_s3_path(&self) -> Option<&str> {
        self.output_s3_path.as_deref()
    }

    /// Fully qualified `database.schema.table`
    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn vars(&self) -> Option<&str> {
        self.vars.as_deref()
    }
}

impl TaskKind for SodaTask {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn parameter(name: &str) -> Attribute {
    Attribute::new(name)
        .optional()
        .validator(validators::string)
        .parent(&["task_parameters"])
}

impl DeclaredTask for SodaTask {
    const KIND: &'static str = "soda";

    fn default_pool(context: &TaskContext) -> Option<String> {
        context.settings().batch.default_pool.clone()
    }

    fn attributes() -> Vec<Attribute> {
        let mut attributes = BatchJob::attributes(false);
        attributes.extend([
            parameter("project_dir").help("Directory holding dbt_project.yml"),
            parameter("profiles_dir").help("Directory holding profiles.yml"),
            parameter("profile_name"),
            Attribute::new("target_name")
                .validator(validators::string)
                .parent(&["task_parameters"]),
            parameter("table_name").help("database.schema.table; excludes model_name"),
            parameter("model_name").help("dbt model to scan; excludes table_name"),
            parameter("output_s3_path"),
            parameter("output_table"),
            parameter("vars"),
        ]);
        attributes
    }

    fn from_config(config: &ConfigValidator, context: &TaskContext) -> Result<Self, ConfigError> {
        config.ensure_exclusive("table_name", "model_name")?;

        let defaults = &context.settings().soda;
        let job = BatchJob::from_config(config, context)?.or_defaults(
            defaults.default_job_name.as_deref(),
            defaults.default_executable.as_deref(),
            defaults.default_executable_prefix.as_deref(),
        );

        let with_default = |name: &str, fallback: &Option<String>| -> Result<Option<String>, ConfigError> {
            Ok(config.get_str(name)?.or_else(|| fallback.clone()))
        };

        Ok(Self {
            job,
            target_name: config.require_str("target_name")?,
            project_dir: with_default("project_dir", &defaults.default_project_dir)?,
            profiles_dir: with_default("profiles_dir", &defaults.default_profiles_dir)?,
            profile_name: with_default("profile_name", &defaults.default_profile_name)?,
            output_table: with_default("output_table", &defaults.default_output_table)?,
            output_s3_path: with_default("output_s3_path", &defaults.default_output_s3_path)?,
            table_name: config.get_str("table_name")?,
            model_name: config.get_str("model_name")?,
            vars: config.get_str("vars")?,
        })
    }
}
