//! Lineage defaults from a dbt profile
//!
//! A warehouse profile target names the directory dbt writes table data to.
//! That directory (and its bucket) is the fallback location for models that
//! declare no location of their own.

use dagforge_core::LineageSettings;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageDefaults {
    pub default_data_dir: Option<String>,
    pub data_bucket: Option<String>,
}

impl LineageDefaults {
    /// Defaults from one profile output (`outputs.<target>` in profiles.yml)
    ///
    /// Reads `s3_data_dir`, falling back to `s3_staging_dir`.
    pub fn from_profile_output(output: &Value) -> Self {
        let default_data_dir = ["s3_data_dir", "s3_staging_dir"]
            .iter()
            .find_map(|key| {
                output
                    .get(key)
                    .and_then(Value::as_str)
                    .filter(|dir| !dir.is_empty())
            })
            .map(str::to_string);

        let data_bucket = default_data_dir.as_deref().and_then(bucket_of);

        Self {
            default_data_dir,
            data_bucket,
        }
    }

    /// Defaults for `profile`/`target` of a whole parsed profiles document
    pub fn from_profiles(profiles: &Value, profile: &str, target: &str) -> Option<Self> {
        profiles
            .get(profile)?
            .get("outputs")?
            .get(target)
            .map(Self::from_profile_output)
    }

    /// Fill the settings fields that are still unset
    pub fn apply(&self, settings: &mut LineageSettings) {
        if settings.default_data_dir.is_none() {
            settings.default_data_dir = self.default_data_dir.clone();
        }
        if settings.data_bucket.is_none() {
            settings.data_bucket = self.data_bucket.clone();
        }
    }
}

/// `s3://bucket/some/path` → `bucket`
fn bucket_of(uri: &str) -> Option<String> {
    let without_scheme = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let bucket = without_scheme.split('/').next().unwrap_or_default();

    (!bucket.is_empty()).then(|| bucket.to_string())
}
