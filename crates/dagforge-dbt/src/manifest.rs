//! dbt manifest.json parsing
//!
//! Only the fields lineage compilation reads are modelled; everything else in
//! the manifest is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::ManifestError;

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Models, seeds, tests, snapshots
    #[serde(default)]
    pub nodes: HashMap<String, ManifestNode>,

    /// Source definitions
    #[serde(default)]
    pub sources: HashMap<String, ManifestNode>,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    pub fn get_node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes.get(unique_id)
    }

    pub fn get_source(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.sources.get(unique_id)
    }

    /// Look a dependency id up in the table its prefix names
    pub fn resolve(&self, unique_id: &str) -> Option<&ManifestNode> {
        if unique_id.starts_with("source.") {
            self.get_source(unique_id)
        } else {
            self.get_node(unique_id)
        }
    }

    /// Find a node by unique_id, or by short name among models then sources.
    ///
    /// When several nodes share a short name the smallest unique_id wins.
    pub fn find_node_id(&self, name: &str) -> Option<&str> {
        if name.contains('.') {
            if let Some(node) = self.resolve(name) {
                return Some(&node.unique_id);
            }
        }

        first_named(&self.nodes, name, ResourceKind::Model)
            .or_else(|| first_named(&self.sources, name, ResourceKind::Source))
    }
}

fn first_named<'a>(
    table: &'a HashMap<String, ManifestNode>,
    name: &str,
    kind: ResourceKind,
) -> Option<&'a str> {
    table
        .iter()
        .filter(|(_, node)| node.name == name && node.resource_kind() == kind)
        .map(|(id, _)| id.as_str())
        .min()
}

/// Kind of manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Model,
    Source,
    Seed,
    Other,
}

/// How a node's result is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialization {
    Table,
    Incremental,
    View,
    Ephemeral,
    Other(String),
    /// No materialization configured
    Unset,
}

impl Materialization {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => Self::Unset,
            Some("table") => Self::Table,
            Some("incremental") => Self::Incremental,
            Some("view") => Self::View,
            Some("ephemeral") => Self::Ephemeral,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// Whether the node's data lives at an object-store location
    pub fn has_location(&self) -> bool {
        matches!(self, Self::Table | Self::Incremental)
    }
}

/// A node or source in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Unique identifier (e.g., "model.my_project.users")
    pub unique_id: String,

    /// Node name (e.g., "users"); the table name for sources
    pub name: String,

    /// Resource type (model, seed, source, ...); derived from the id when absent
    #[serde(default)]
    pub resource_type: Option<String>,

    /// Database name; the catalog on lake adapters
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default)]
    pub config: NodeConfig,

    /// Config as written, before dbt rendered it
    #[serde(default)]
    pub unrendered_config: NodeConfig,

    #[serde(default)]
    pub depends_on: DependsOn,
}

impl ManifestNode {
    pub fn resource_kind(&self) -> ResourceKind {
        let kind = match &self.resource_type {
            Some(kind) => kind.as_str(),
            None => self.unique_id.split('.').next().unwrap_or_default(),
        };

        match kind {
            "model" => ResourceKind::Model,
            "source" => ResourceKind::Source,
            "seed" => ResourceKind::Seed,
            _ => ResourceKind::Other,
        }
    }

    pub fn materialization(&self) -> Materialization {
        Materialization::parse(self.config.materialized.as_deref())
    }

    /// Rendered config first, then the unrendered one
    pub fn external_location(&self) -> Option<&str> {
        self.config
            .external_location
            .as_deref()
            .or(self.unrendered_config.external_location.as_deref())
    }

    pub fn location_root(&self) -> Option<&str> {
        self.config
            .location_root
            .as_deref()
            .or(self.unrendered_config.location_root.as_deref())
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on.nodes
    }
}

/// Node configuration (from dbt_project.yml or model config)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub materialized: Option<String>,

    /// Full object-store URI of the node's data (warehouse adapters)
    #[serde(default)]
    pub external_location: Option<String>,

    /// Root URI the node's data lives under (lake adapters)
    #[serde(default)]
    pub location_root: Option<String>,
}

/// Dependencies structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependsOn {
    /// Unique ids this node depends on, in declaration order
    #[serde(default)]
    pub nodes: Vec<String>,
}
