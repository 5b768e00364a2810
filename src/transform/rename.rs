//! Reference renaming
//!
//! After a rewrite, nodes that were deleted or replaced leave references
//! behind. A [`RenameMap`] records where each of them should point instead
//! and [`rename_node_inputs`] applies it in a single pass over the graph.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::error::{GraphResult, TransformError};
use crate::graph::{RefKind, TensorRef};
use crate::proto::GraphDef;

/// Where references to a renamed node should point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    /// Replacement for output 0 of the renamed node
    pub target: TensorRef,
    /// Consumers whose references are left untouched
    pub keep: BTreeSet<String>,
}

impl RenameEntry {
    /// Rename every reference to `target`
    pub fn new(target: TensorRef) -> Self {
        Self {
            target,
            keep: BTreeSet::new(),
        }
    }

    /// Rename every reference except those held by `keep`
    pub fn except<I, S>(target: TensorRef, keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target,
            keep: keep.into_iter().map(Into::into).collect(),
        }
    }
}

/// Old node name → rename entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
    entries: BTreeMap<String, RenameEntry>,
}

impl RenameMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    ///
    /// A key may be declared once. Targets must be data references.
    pub fn insert(&mut self, key: impl Into<String>, entry: RenameEntry) -> GraphResult<()> {
        let key = key.into();
        if entry.target.is_control() {
            return Err(TransformError::InvariantViolation(format!(
                "rename target for '{}' is a control reference '{}'",
                key, entry.target
            )));
        }
        if entry.target.node == key {
            return Err(TransformError::InvariantViolation(format!(
                "node '{}' renamed to itself",
                key
            )));
        }
        if self.entries.contains_key(&key) {
            return Err(TransformError::InvariantViolation(format!(
                "node '{}' renamed twice",
                key
            )));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Entry for `key`
    pub fn get(&self, key: &str) -> Option<&RenameEntry> {
        self.entries.get(key)
    }

    /// Check whether `key` is renamed
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renamed node names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RenameEntry)> {
        self.entries.iter()
    }

    /// Collapse chains so every target is a node that is not itself renamed
    ///
    /// Runs once after all matches are final, so the result does not depend
    /// on the order in which matches were accepted.
    pub fn resolve_chains(&mut self) -> GraphResult<()> {
        let mut resolved = BTreeMap::new();

        for (key, entry) in &self.entries {
            let mut target = entry.target.clone();
            let mut seen: FxHashSet<&str> = FxHashSet::default();
            seen.insert(key.as_str());

            while let Some((via, next)) = self.entries.get_key_value(&target.node) {
                if !seen.insert(via.as_str()) {
                    return Err(TransformError::InvariantViolation(format!(
                        "rename cycle through '{}'",
                        key
                    )));
                }
                let hop = forward_data(&target, &next.target)?;
                trace!(from = %key, via = %target.node, to = %hop, "collapsing rename chain");
                target = hop;
            }

            if target != entry.target {
                resolved.insert(key.clone(), target);
            }
        }

        for (key, target) in resolved {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.target = target;
            }
        }
        Ok(())
    }

    /// Rewrite one reference held by `consumer`
    ///
    /// Returns `None` when the reference is left as is.
    pub fn apply(&self, reference: &TensorRef, consumer: &str) -> GraphResult<Option<TensorRef>> {
        let Some(entry) = self.entries.get(&reference.node) else {
            return Ok(None);
        };
        if entry.keep.contains(consumer) {
            return Ok(None);
        }
        match reference.kind {
            RefKind::Control => Ok(Some(entry.target.to_control())),
            RefKind::Output(_) => forward_data(reference, &entry.target).map(Some),
        }
    }
}

/// Map a data reference to a renamed node onto that node's target
fn forward_data(reference: &TensorRef, target: &TensorRef) -> GraphResult<TensorRef> {
    match reference.kind {
        RefKind::Output(0) => Ok(target.clone()),
        RefKind::Output(index) => Err(TransformError::InvariantViolation(format!(
            "output {} of renamed node '{}' has no replacement",
            index, reference.node
        ))),
        RefKind::Control => Ok(target.to_control()),
    }
}

/// Apply `renames` to every input of every node in one pass
///
/// Every target must name a node of `graph`. Returns the number of
/// references rewritten.
pub fn rename_node_inputs(graph: &mut GraphDef, renames: &RenameMap) -> GraphResult<usize> {
    if renames.is_empty() {
        return Ok(0);
    }

    let names: FxHashSet<&str> = graph.node.iter().map(|n| n.name.as_str()).collect();
    for (key, entry) in renames.iter() {
        if !names.contains(entry.target.node.as_str()) {
            return Err(TransformError::InvariantViolation(format!(
                "rename target '{}' for '{}' does not exist",
                entry.target, key
            )));
        }
    }

    let mut renamed = 0;
    for node in &mut graph.node {
        for input in &mut node.input {
            let reference = TensorRef::parse(input).map_err(|_| {
                TransformError::InvariantViolation(format!(
                    "node '{}' holds malformed reference '{}'",
                    node.name, input
                ))
            })?;
            if let Some(new_reference) = renames.apply(&reference, &node.name)? {
                debug!(node = %node.name, from = %input, to = %new_reference, "renaming input");
                *input = new_reference.to_string();
                renamed += 1;
            }
        }
    }

    Ok(renamed)
}
