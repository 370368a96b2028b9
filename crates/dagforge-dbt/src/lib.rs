//! dbt lineage compilation
//!
//! This crate handles:
//! - Parsing manifest.json (dbt-generated artifacts)
//! - Adapter strategies for warehouse-catalog and lake-table engines
//! - Compiling a model's lineage into task input/output descriptors
//! - Lineage defaults derived from dbt profiles

pub mod adapter;
pub mod athena;
pub mod compiler;
pub mod databricks;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod profile;

pub use adapter::{adapter_for, AdapterStrategy};
pub use athena::AthenaAdapter;
pub use compiler::{CompiledIo, LineageCompiler, ValidatedIo};
pub use databricks::DatabricksAdapter;
pub use descriptor::{dedup, Descriptor};
pub use error::{LineageError, ManifestError};
pub use manifest::{DependsOn, Manifest, ManifestNode, Materialization, NodeConfig, ResourceKind};
pub use profile::LineageDefaults;
