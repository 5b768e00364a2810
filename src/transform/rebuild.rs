//! Graph reassembly after matching
//!
//! Collects the replacement fragments of accepted matches and emits the
//! intermediate graph: every fragment at its root's position, every other
//! unconsumed node copied through in original order.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{GraphResult, TransformError};
use crate::proto::{GraphDef, NodeDef};

use super::rename::RenameMap;

/// Accumulates accepted replacements for one transform invocation
#[derive(Debug)]
pub struct GraphRebuilder<'g> {
    input: &'g GraphDef,
    /// Root position → replacement nodes
    fragments: FxHashMap<usize, Vec<NodeDef>>,
    /// Names owned by accepted matches
    consumed: FxHashSet<String>,
}

impl<'g> GraphRebuilder<'g> {
    /// Create a rebuilder for `input`
    pub fn new(input: &'g GraphDef) -> Self {
        Self {
            input,
            fragments: FxHashMap::default(),
            consumed: FxHashSet::default(),
        }
    }

    /// Names already consumed by accepted matches
    pub fn consumed(&self) -> &FxHashSet<String> {
        &self.consumed
    }

    /// Check whether `name` belongs to an accepted match
    pub fn is_consumed(&self, name: &str) -> bool {
        self.consumed.contains(name)
    }

    /// Number of accepted fragments
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Record an accepted match
    ///
    /// Fails if the match overlaps an earlier one.
    pub fn add_fragment<I, S>(
        &mut self,
        root_position: usize,
        consumed: I,
        nodes: Vec<NodeDef>,
    ) -> GraphResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = consumed
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        if let Some(overlap) = names.iter().find(|name| self.consumed.contains(*name)) {
            return Err(TransformError::InvariantViolation(format!(
                "node '{}' consumed by two matches",
                overlap
            )));
        }
        if self.fragments.contains_key(&root_position) {
            return Err(TransformError::InvariantViolation(format!(
                "two matches rooted at position {}",
                root_position
            )));
        }

        self.consumed.extend(names);
        self.fragments.insert(root_position, nodes);
        Ok(())
    }

    /// Emit the intermediate graph
    pub fn build(mut self) -> GraphDef {
        let mut nodes = Vec::with_capacity(self.input.node.len());

        for (position, node) in self.input.node.iter().enumerate() {
            if let Some(fragment) = self.fragments.remove(&position) {
                nodes.extend(fragment);
            } else if !self.consumed.contains(&node.name) {
                nodes.push(node.clone());
            }
        }

        GraphDef {
            node: nodes,
            library: self.input.library.clone(),
            version: self.input.version,
            versions: self.input.versions.clone(),
            debug_info: self.input.debug_info.clone(),
        }
    }
}

/// Fail if two nodes share a name
pub fn check_unique_names(graph: &GraphDef) -> GraphResult<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for node in &graph.node {
        if !seen.insert(node.name.as_str()) {
            return Err(TransformError::InvariantViolation(format!(
                "rewrite produced duplicate node '{}'",
                node.name
            )));
        }
    }
    Ok(())
}

/// Names present in `input` but absent from `output`, in input order
pub fn removed_names<'a>(input: &'a GraphDef, output: &GraphDef) -> Vec<&'a str> {
    let live: FxHashSet<&str> = output.node.iter().map(|n| n.name.as_str()).collect();
    input
        .node
        .iter()
        .map(|n| n.name.as_str())
        .filter(|name| !live.contains(name))
        .collect()
}

/// Check that deletions and rename keys agree
///
/// Every removed node must be a rename key. A rename key whose node is
/// still present must carry a keep set, otherwise its references would be
/// redirected away from a live node by accident.
pub fn check_rename_completeness(
    input: &GraphDef,
    output: &GraphDef,
    renames: &RenameMap,
) -> GraphResult<()> {
    let removed = removed_names(input, output);

    let unmapped: Vec<&str> = removed
        .iter()
        .copied()
        .filter(|name| !renames.contains_key(name))
        .collect();
    if !unmapped.is_empty() {
        return Err(TransformError::InvariantViolation(format!(
            "removed nodes without rename entry: {}",
            unmapped.join(", ")
        )));
    }

    let removed: FxHashSet<&str> = removed.into_iter().collect();
    for (key, entry) in renames.iter() {
        if !removed.contains(key.as_str()) && entry.keep.is_empty() {
            return Err(TransformError::InvariantViolation(format!(
                "rename key '{}' is still a live node",
                key
            )));
        }
    }

    Ok(())
}
