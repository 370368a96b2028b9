//! Pipelines
//!
//! A pipeline is read from `<directory>/pipeline.yaml`; its name is the
//! directory relative to the dags root, so it is never declared explicitly.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDateTime;
use dagforge_core::{validators, Attribute, AttributeSet, ConfigError, ConfigValidator, Settings};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::alert::{alerts_from_config, AlertConfig};
use crate::error::PipelineError;
use crate::registries::Registries;
use crate::task::TaskModel;

fn attributes() -> Vec<Attribute> {
    vec![
        Attribute::new("owner")
            .validator(validators::string)
            .help("<team|person>@domain.com"),
        Attribute::new("description").validator(validators::string),
        Attribute::new("schedule")
            .nullable()
            .validator(validators::cron)
            .help("crontab e.g.: 0 3 * * *"),
        Attribute::new("start_date")
            .validator(validators::timestamp)
            .help("2019-11-01T03:00"),
        Attribute::new("airflow_parameters").validator(validators::object),
        Attribute::new("default_args")
            .nullable()
            .validator(validators::object)
            .parent(&["airflow_parameters"]),
        Attribute::new("dag_parameters")
            .nullable()
            .validator(validators::object)
            .parent(&["airflow_parameters"]),
        Attribute::new("alerts")
            .nullable()
            .validator(validators::list)
            .help("List of alert configurations"),
    ]
}

/// A validated pipeline and the tasks it owns
pub struct PipelineModel {
    directory: PathBuf,
    name: String,
    location: String,
    owner: String,
    description: String,
    schedule: Option<String>,
    start_date: NaiveDateTime,
    default_args: Map<String, Value>,
    parameters: Map<String, Value>,
    alerts: Vec<AlertConfig>,
    tasks: Vec<TaskModel>,
}

impl PipelineModel {
    /// Validate the pipeline document stored in `directory`
    pub fn new(directory: &Path, raw: &Value, settings: &Settings) -> Result<Self, ConfigError> {
        let location = directory.join("pipeline.yaml").display().to_string();
        let config = ConfigValidator::new(
            location.clone(),
            raw.clone(),
            AttributeSet::from_attributes(attributes())?,
        )?;

        let start_date = config
            .get_timestamp("start_date")?
            .ok_or_else(|| ConfigError::MissingRequiredField {
                field: "start_date".to_string(),
                location: location.clone(),
            })?;

        let alert_configs = config.get_list("alerts")?;
        let alerts = alerts_from_config(
            alert_configs.as_deref(),
            &settings.alert.default_alert,
            &location,
        )?;

        Ok(Self {
            directory: directory.to_path_buf(),
            name: pipeline_name(directory, &settings.dags_dir),
            owner: config.require_str("owner")?,
            description: config.require_str("description")?,
            schedule: config.get_str("schedule")?,
            start_date,
            default_args: config.get_object("default_args")?.unwrap_or_default(),
            parameters: config.get_object("dag_parameters")?.unwrap_or_default(),
            alerts,
            tasks: Vec::new(),
            location,
        })
    }

    /// Build a pipeline and every task of a bundle, in declaration order
    pub fn from_bundle(bundle: &PipelineBundle, registries: &Registries) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new(&bundle.directory, &bundle.pipeline, &registries.settings)?;

        for (name, raw) in &bundle.tasks {
            pipeline.create_task(name, raw, registries)?;
        }

        tracing::debug!(pipeline = %pipeline.name, tasks = pipeline.tasks.len(), "pipeline built");
        Ok(pipeline)
    }

    /// Validate a task document and append it
    pub fn create_task(
        &mut self,
        name: &str,
        raw: &Value,
        registries: &Registries,
    ) -> Result<&TaskModel, PipelineError> {
        self.ensure_unique(name)?;

        let context = registries.task_context(name, &self.name, &self.directory);
        let task = registries.tasks.create_from_config(raw, &context)?;
        self.tasks.push(task);

        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Append an already built task
    pub fn add_task(&mut self, task: TaskModel) -> Result<(), PipelineError> {
        self.ensure_unique(task.name())?;
        self.tasks.push(task);
        Ok(())
    }

    fn ensure_unique(&self, name: &str) -> Result<(), PipelineError> {
        if self.task(name).is_some() {
            return Err(PipelineError::DuplicateTask {
                name: name.to_string(),
                pipeline: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn task(&self, name: &str) -> Option<&TaskModel> {
        self.tasks.iter().find(|task| task.name() == name)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// `None` for manually triggered pipelines
    pub fn schedule(&self) -> Option<&str> {
        self.schedule.as_deref()
    }

    pub fn start_date(&self) -> NaiveDateTime {
        self.start_date
    }

    pub fn default_args(&self) -> &Map<String, Value> {
        &self.default_args
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn alerts(&self) -> &[AlertConfig] {
        &self.alerts
    }

    pub fn tasks(&self) -> &[TaskModel] {
        &self.tasks
    }
}

impl fmt::Debug for PipelineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineModel")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("schedule", &self.schedule)
            .field("tasks", &self.tasks)
            .finish()
    }
}

/// `directory` relative to `dags_dir`, with path separators replaced by `-`
pub fn pipeline_name(directory: &Path, dags_dir: &Path) -> String {
    let relative = directory.strip_prefix(dags_dir).unwrap_or(directory);

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// A pipeline document plus its task documents, as handed over by a loader
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineBundle {
    pub directory: PathBuf,
    pub pipeline: Value,

    /// Task name → task document, in declaration order
    #[serde(default, deserialize_with = "ordered_entries")]
    pub tasks: Vec<(String, Value)>,
}

fn ordered_entries<'de, D>(deserializer: D) -> Result<Vec<(String, Value)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, Value)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of task name to task config")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry::<String, Value>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}
