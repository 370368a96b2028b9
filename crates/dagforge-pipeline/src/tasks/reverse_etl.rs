use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};

use super::BatchJob;
use crate::task::{DeclaredTask, TaskContext, TaskKind};

const DEFAULT_JOB_NAME: &str = "common_batch_jobs/reverse_etl";
const DEFAULT_EXECUTABLE: &str = "reverse_etl.py";
const DEFAULT_EXECUTABLE_PREFIX: &str = "python";
const DEFAULT_NUM_THREADS: i64 = 4;
const DEFAULT_BATCH_SIZE: i64 = 10_000;
const DEFAULT_PROJECT_NAME: &str = "feature_store";

/// How rows changed since the last export are detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffStrategy {
    /// Re-export everything
    Full,

    /// Compare a per-row hash column
    Hash { column: String, from_time: String },

    /// Compare a last-updated timestamp column
    UpdatedAt { column: String, from_time: String },
}

/// Syncs a warehouse table into an operational store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseEtlTask {
    job: BatchJob,
    assume_role_arn: Option<String>,
    num_threads: i64,
    batch_size: i64,
    primary_id_column: String,
    secondary_id_column: Option<String>,
    custom_id_column: Option<String>,
    model_name: Option<String>,
    project_name: String,
    is_deleted_column: Option<String>,
    diff: DiffStrategy,
    days_to_live: Option<String>,
}

impl ReverseEtlTask {
    pub fn job(&self) -> &BatchJob {
        &self.job
    }

    pub fn assume_role_arn(&self) -> Option<&str> {
        self.assume_role_arn.as_deref()
    }

    pub fn num_threads(&self) -> i64 {
        self.num_threads
    }

    pub fn batch_size(&self) -> i64 {
        self.batch_size
    }

    pub fn primary_id_column(&self) -> &str {
        &self.primary_id_column
    }

    pub fn secondary_id_column(&self) -> Option<&str> {
        self.secondary_id_column.as_deref()
    }

    pub fn custom_id_column(&self) -> Option<&str> {
        self.custom_id_column.as_deref()
    }

    /// Defaults to the input's `schema.table` when unset
    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn is_deleted_column(&self) -> Option<&str> {
        self.is_deleted_column.as_deref()
    }

    pub fn diff(&self) -> &DiffStrategy {
        &self.diff
    }

    pub fn days_to_live(&self) -> Option<&str> {
        self.days_to_live.as_deref()
    }
}

impl TaskKind for ReverseEtlTask {
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

impl DeclaredTask for ReverseEtlTask {
    const KIND: &'static str = "reverse_etl";

    fn default_pool(context: &TaskContext) -> Option<String> {
        context.settings().batch.default_pool.clone()
    }

    fn attributes() -> Vec<Attribute> {
        let mut attributes = BatchJob::attributes(false);
        attributes.extend([
            parameter("assume_role_arn"),
            Attribute::new("num_threads")
                .default_value(DEFAULT_NUM_THREADS)
                .validator(validators::integer)
                .parent(&["task_parameters"]),
            Attribute::new("batch_size")
                .default_value(DEFAULT_BATCH_SIZE)
                .validator(validators::integer)
                .parent(&["task_parameters"]),
            Attribute::new("primary_id_column")
                .validator(validators::string)
                .parent(&["task_parameters"]),
            parameter("secondary_id_column"),
            parameter("custom_id_column"),
            parameter("model_name"),
            Attribute::new("project_name")
                .default_value(DEFAULT_PROJECT_NAME)
                .validator(validators::string)
                .parent(&["task_parameters"]),
            parameter("is_deleted_column"),
            parameter("hash_column").help("Excludes updated_at_column; needs from_time"),
            parameter("updated_at_column").help("Excludes hash_column; needs from_time"),
            parameter("from_time").help("YYYY-mm-ddTHH:MM, start of the incremental window"),
            parameter("days_to_live"),
        ]);
        attributes
    }

    fn from_config(config: &ConfigValidator, context: &TaskContext) -> Result<Self, ConfigError> {
        config.ensure_exclusive("hash_column", "updated_at_column")?;
        config.ensure_companion("from_time", &["hash_column", "updated_at_column"])?;

        let defaults = &context.settings().reverse_etl;
        let job = BatchJob::from_config(config, context)?.or_defaults(
            Some(defaults.default_job_name.as_deref().unwrap_or(DEFAULT_JOB_NAME)),
            Some(defaults.default_executable.as_deref().unwrap_or(DEFAULT_EXECUTABLE)),
            Some(
                defaults
                    .default_executable_prefix
                    .as_deref()
                    .unwrap_or(DEFAULT_EXECUTABLE_PREFIX),
            ),
        );

        let from_time = config.get_str("from_time")?.unwrap_or_default();
        let diff = match (config.get_str("hash_column")?, config.get_str("updated_at_column")?) {
            (Some(column), _) => DiffStrategy::Hash { column, from_time },
            (None, Some(column)) => DiffStrategy::UpdatedAt { column, from_time },
            (None, None) => DiffStrategy::Full,
        };

        Ok(Self {
            job,
            assume_role_arn: config.get_str("assume_role_arn")?,
            num_threads: config.get_i64("num_threads")?.unwrap_or(DEFAULT_NUM_THREADS),
            batch_size: config.get_i64("batch_size")?.unwrap_or(DEFAULT_BATCH_SIZE),
            primary_id_column: config.require_str("primary_id_column")?,
            secondary_id_column: config.get_str("secondary_id_column")?,
            custom_id_column: config.get_str("custom_id_column")?,
            model_name: config.get_str("model_name")?,
            project_name: config.require_str("project_name")?,
            is_deleted_column: config.get_str("is_deleted_column")?,
            diff,
            days_to_live: config.get_str("days_to_live")?,
        })
    }
}
