//! Settings schema (dagforge.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Lineage adapter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Warehouse-catalog adapter (Athena / Glue catalog)
    #[default]
    Athena,

    /// Lake-table adapter (Databricks / Unity catalog)
    Databricks,
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Athena => write!(f, "athena"),
            Self::Databricks => write!(f, "databricks"),
        }
    }
}

/// Defaults for lineage compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageSettings {
    /// Which adapter compiles manifest nodes
    #[serde(default)]
    pub adapter: AdapterKind,

    /// Bucket the warehouse adapter writes table data to
    #[serde(default)]
    pub data_bucket: Option<String>,

    /// Root used when a node declares no location of its own,
    /// e.g. `s3://bucket-data-lake/warehouse`
    #[serde(default)]
    pub default_data_dir: Option<String>,

    /// Name prefix of staging models (warehouse adapter)
    #[serde(default = "default_staging_prefix")]
    pub staging_prefix: String,

    /// Schema substring of preparation models (lake adapter)
    #[serde(default = "default_preparation_marker")]
    pub preparation_schema_marker: String,

    /// Also register lake outputs as warehouse-catalog tables
    #[serde(default)]
    pub create_external_athena_table: bool,
}

fn default_staging_prefix() -> String {
    "stg_".to_string()
}

fn default_preparation_marker() -> String {
    "preparation".to_string()
}

impl Default for LineageSettings {
    fn default() -> Self {
        Self {
            adapter: AdapterKind::default(),
            data_bucket: None,
            default_data_dir: None,
            staging_prefix: default_staging_prefix(),
            preparation_schema_marker: default_preparation_marker(),
            create_external_athena_table: false,
        }
    }
}

/// Defaults shared by every batch-job task kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchDefaults {
    #[serde(default)]
    pub default_job_name: Option<String>,

    #[serde(default)]
    pub default_queue: Option<String>,

    #[serde(default)]
    pub default_pool: Option<String>,
}

/// Defaults for data-quality (soda) tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SodaDefaults {
    #[serde(default)]
    pub default_job_name: Option<String>,

    #[serde(default)]
    pub default_executable: Option<String>,

    #[serde(default)]
    pub default_executable_prefix: Option<String>,

    #[serde(default)]
    pub default_project_dir: Option<String>,

    #[serde(default)]
    pub default_profiles_dir: Option<String>,

    #[serde(default)]
    pub default_profile_name: Option<String>,

    #[serde(default)]
    pub default_output_table: Option<String>,

    #[serde(default)]
    pub default_output_s3_path: Option<String>,
}

/// Defaults for data-sync (reverse ETL) tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverseEtlDefaults {
    #[serde(default)]
    pub default_job_name: Option<String>,

    #[serde(default)]
    pub default_executable: Option<String>,

    #[serde(default)]
    pub default_executable_prefix: Option<String>,
}

/// Alert defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Alert used by pipelines that declare `alerts: null`
    #[serde(default = "default_alert")]
    pub default_alert: Value,
}

fn default_alert() -> Value {
    json!({"type": "slack", "channel": "#airflow-jobs"})
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            default_alert: default_alert(),
        }
    }
}

/// Main settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory pipelines live under; pipeline names are derived from it
    #[serde(default = "default_dags_dir")]
    pub dags_dir: PathBuf,

    #[serde(default)]
    pub lineage: LineageSettings,

    #[serde(default)]
    pub batch: BatchDefaults,

    #[serde(default)]
    pub soda: SodaDefaults,

    #[serde(default)]
    pub reverse_etl: ReverseEtlDefaults,

    #[serde(default)]
    pub alert: AlertSettings,
}

fn default_dags_dir() -> PathBuf {
    PathBuf::from("dags")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dags_dir: default_dags_dir(),
            lineage: LineageSettings::default(),
            batch: BatchDefaults::default(),
            soda: SodaDefaults::default(),
            reverse_etl: ReverseEtlDefaults::default(),
            alert: AlertSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(path.display().to_string(), e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load settings from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, SettingsError> {
        toml::from_str(toml).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save settings to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| SettingsError::Io(path.display().to_string(), e.to_string()))?;

        Ok(())
    }
}

/// Settings error types
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {0}: {1}")]
    Io(String, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
