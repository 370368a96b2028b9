//! Lineage compiler
//!
//! Walks a model's declared dependencies and compiles them into the IO
//! descriptors a task running the model must wait on, plus the descriptors of
//! what the model itself produces.
//!
//! Per dependency, in this order:
//! - source: a followed catalog table, no further recursion
//! - seed: the adapter's seed descriptor
//! - ephemeral: a placeholder, then the node's own dependencies
//! - preparation (adapter predicate): an unfollowed table, then the node's own
//!   dependencies
//! - anything else: a followed table, plus its location for table and
//!   incremental materializations
//!
//! Each node is expanded once per compilation; later paths reaching it add
//! nothing. The concatenated list is deduplicated on the full field set,
//! keeping the first occurrence.

use std::collections::HashSet;

use dagforge_core::LineageSettings;
use dagforge_pipeline::{IoContext, IoModel, IoRegistry};
use serde::{Deserialize, Serialize};

use crate::adapter::{adapter_for, AdapterStrategy};
use crate::descriptor::{dedup, Descriptor};
use crate::error::LineageError;
use crate::manifest::{Manifest, ManifestNode, Materialization, ResourceKind};

/// Compiled inputs and outputs of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledIo {
    pub inputs: Vec<Descriptor>,
    pub outputs: Vec<Descriptor>,
}

/// Inputs and outputs validated as IO models
#[derive(Debug)]
pub struct ValidatedIo {
    pub inputs: Vec<IoModel>,
    pub outputs: Vec<IoModel>,
}

impl CompiledIo {
    /// Validate every descriptor through the IO registry
    pub fn validate(&self, registry: &IoRegistry, location: &str) -> Result<ValidatedIo, LineageError> {
        let context = IoContext::new(location);
        let build = |descriptors: &[Descriptor]| -> Result<Vec<IoModel>, LineageError> {
            descriptors
                .iter()
                .map(|descriptor| {
                    registry
                        .create_from_config(&descriptor.to_value(), &context)
                        .map_err(LineageError::from)
                })
                .collect()
        };

        Ok(ValidatedIo {
            inputs: build(&self.inputs)?,
            outputs: build(&self.outputs)?,
        })
    }
}

/// Compiles manifest lineage with one adapter
#[derive(Debug)]
pub struct LineageCompiler {
    manifest: Manifest,
    adapter: Box<dyn AdapterStrategy>,
}

impl LineageCompiler {
    pub fn new(manifest: Manifest, adapter: Box<dyn AdapterStrategy>) -> Self {
        Self { manifest, adapter }
    }

    /// Compiler using the adapter selected by `[lineage].adapter`
    pub fn from_settings(manifest: Manifest, settings: &LineageSettings) -> Self {
        Self::new(manifest, adapter_for(settings))
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn adapter(&self) -> &dyn AdapterStrategy {
        self.adapter.as_ref()
    }

    /// Inputs and outputs of a model, given its short name or unique id
    pub fn generate_io(&self, model: &str) -> Result<CompiledIo, LineageError> {
        let node_id = self
            .manifest
            .find_node_id(model)
            .ok_or_else(|| LineageError::ModelNotFound(model.to_string()))?;

        let compiled = CompiledIo {
            inputs: self.compile_dependencies(node_id)?,
            outputs: self.compile_outputs(node_id)?,
        };

        tracing::info!(
            model = %node_id,
            adapter = %self.adapter.kind(),
            inputs = compiled.inputs.len(),
            outputs = compiled.outputs.len(),
            "compiled model IO"
        );

        Ok(compiled)
    }

    /// External descriptors the node depends on, deduplicated, first-seen order
    pub fn compile_dependencies(&self, node_id: &str) -> Result<Vec<Descriptor>, LineageError> {
        let node = self.target(node_id)?;
        let mut walk = Walk::starting_at(&node.unique_id);

        let mut descriptors = Vec::new();
        for dependency in node.dependencies() {
            descriptors.extend(self.compile_node(dependency, &mut walk)?);
        }

        Ok(dedup(descriptors))
    }

    /// Descriptors of what the node itself produces
    pub fn compile_outputs(&self, node_id: &str) -> Result<Vec<Descriptor>, LineageError> {
        let node = self.target(node_id)?;
        let materialization = node.materialization();

        if matches!(materialization, Materialization::View | Materialization::Ephemeral)
            || self.adapter.is_preparation(node)
        {
            return Ok(vec![self.adapter.placeholder_task(node)]);
        }

        let mut outputs = vec![self.adapter.table_task(node, false)?];
        if materialization.has_location() {
            outputs.push(self.adapter.output_location_task(node)?);
        }
        if let Some(registration) = self.adapter.cross_registration_task(node)? {
            outputs.push(registration);
        }

        Ok(outputs)
    }

    fn target(&self, node_id: &str) -> Result<&ManifestNode, LineageError> {
        self.manifest
            .resolve(node_id)
            .ok_or_else(|| LineageError::ModelNotFound(node_id.to_string()))
    }

    /// Descriptors for one dependency, empty when it was already compiled
    /// earlier in this walk
    fn compile_node(&self, node_id: &str, walk: &mut Walk) -> Result<Vec<Descriptor>, LineageError> {
        if walk.in_progress.iter().any(|id| id == node_id) {
            let mut path = walk.in_progress.clone();
            path.push(node_id.to_string());
            return Err(LineageError::CyclicDependency { path });
        }

        if walk.expanded.contains(node_id) {
            return Ok(Vec::new());
        }

        let node = self
            .manifest
            .resolve(node_id)
            .ok_or_else(|| LineageError::UnresolvedDependency {
                id: node_id.to_string(),
                referenced_by: walk.in_progress.last().cloned().unwrap_or_default(),
            })?;

        tracing::debug!(node = %node_id, depth = walk.in_progress.len(), "compiling dependency");

        let descriptors = self.expand(node, walk)?;
        walk.expanded.insert(node_id.to_string());

        Ok(descriptors)
    }

    fn expand(&self, node: &ManifestNode, walk: &mut Walk) -> Result<Vec<Descriptor>, LineageError> {
        match node.resource_kind() {
            ResourceKind::Source => return Ok(vec![self.adapter.source_task(node)?]),
            ResourceKind::Seed => return Ok(vec![self.adapter.seed_task(node)?]),
            ResourceKind::Model | ResourceKind::Other => {}
        }

        let materialization = node.materialization();
        if materialization == Materialization::Ephemeral {
            let head = self.adapter.placeholder_task(node);
            return self.splice(head, node, walk);
        }

        if self.adapter.is_preparation(node) {
            let head = self.adapter.table_task(node, false)?;
            return self.splice(head, node, walk);
        }

        let mut descriptors = vec![self.adapter.table_task(node, true)?];
        if materialization.has_location() {
            descriptors.push(self.adapter.location_task(node)?);
        }
        Ok(descriptors)
    }

    /// `head` followed by the compiled dependencies of `node`, in declared order
    fn splice(
        &self,
        head: Descriptor,
        node: &ManifestNode,
        walk: &mut Walk,
    ) -> Result<Vec<Descriptor>, LineageError> {
        let mut descriptors = vec![head];

        walk.in_progress.push(node.unique_id.clone());
        for dependency in node.dependencies() {
            match self.compile_node(dependency, walk) {
                Ok(compiled) => descriptors.extend(compiled),
                Err(err) => {
                    walk.in_progress.pop();
                    return Err(err);
                }
            }
        }
        walk.in_progress.pop();

        Ok(descriptors)
    }
}

/// Traversal state of one `compile_dependencies` call
///
/// A node in `expanded` already emitted its descriptors at its first-seen
/// position, so reconverging paths stop there.
#[derive(Debug)]
struct Walk {
    /// Chain of nodes being expanded, target first
    in_progress: Vec<String>,
    expanded: HashSet<String>,
}

impl Walk {
    fn starting_at(target: &str) -> Self {
        Self {
            in_progress: vec![target.to_string()],
            expanded: HashSet::new(),
        }
    }
}
