//! Core rewrite loop
//!
//! Scans every node in graph order as a candidate root, matches the
//! pattern, hands accepted structural matches to a rewrite policy, then
//! rebuilds the graph and renames references to removed nodes.

use std::fmt;

use tracing::{debug, info, trace};

use crate::error::{GraphResult, TransformError};
use crate::graph::{check_graph, find_dangling_references, GraphContext, RequiredNames, TensorRef};
use crate::pattern::{GraphMatcher, NodeMatch, OpTypePattern};
use crate::proto::{GraphDef, NodeDef};

use super::rebuild::{check_rename_completeness, check_unique_names, removed_names, GraphRebuilder};
use super::rename::{rename_node_inputs, RenameEntry, RenameMap};

/// Policy decision for one match
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// Leave the matched nodes exactly as they are
    Skip,
    /// Replace the consumed nodes of the match
    Replace(Replacement),
}

/// Nodes that take the place of a match, plus renames for removed nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replacement {
    /// Every node the match contributes to the output
    pub nodes: Vec<NodeDef>,
    /// Old node name → where its references go
    pub renames: Vec<(String, RenameEntry)>,
}

impl Replacement {
    /// Empty replacement: the match is deleted
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node
    pub fn node(mut self, node: NodeDef) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add several nodes
    pub fn nodes<I: IntoIterator<Item = NodeDef>>(mut self, nodes: I) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Redirect every reference to `old` to `target`
    pub fn rename(mut self, old: &str, target: TensorRef) -> Self {
        self.renames
            .push((old.to_string(), RenameEntry::new(target)));
        self
    }

    /// Redirect references to `old`, except those held by `keep`
    pub fn rename_except<'a, I>(mut self, old: &str, target: TensorRef, keep: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.renames
            .push((old.to_string(), RenameEntry::except(target, keep)));
        self
    }
}

impl From<Replacement> for Rewrite {
    fn from(replacement: Replacement) -> Self {
        Rewrite::Replace(replacement)
    }
}

/// Read-only view handed to rewrite policies
pub struct RewriteContext<'a> {
    graph: &'a GraphContext<'a>,
    required: &'a RequiredNames,
    transform: &'a str,
}

impl<'a> RewriteContext<'a> {
    /// Create a policy context
    pub fn new(graph: &'a GraphContext<'a>, required: &'a RequiredNames, transform: &'a str) -> Self {
        Self {
            graph,
            required,
            transform,
        }
    }

    /// The input graph
    pub fn graph(&self) -> &'a GraphContext<'a> {
        self.graph
    }

    /// Names that must survive the transform
    pub fn required_names(&self) -> &'a RequiredNames {
        self.required
    }

    /// Check whether `name` is a declared input or output
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Name of the running transform
    pub fn transform(&self) -> &'a str {
        self.transform
    }

    /// Consumers of `name` that are not owned by `m`
    pub fn external_consumers(&self, name: &str, m: &NodeMatch<'_>) -> Vec<&'a str> {
        let owned = m.consumed_names();
        self.graph
            .get_consumer_names(name)
            .iter()
            .map(|s| s.as_str())
            .filter(|consumer| !owned.contains(consumer))
            .collect()
    }

    /// True when something outside `m` reads `name`
    pub fn has_external_consumers(&self, name: &str, m: &NodeMatch<'_>) -> bool {
        !self.external_consumers(name, m).is_empty()
    }

    /// Log a policy rejection and return [`Rewrite::Skip`]
    pub fn reject(&self, node: &str, reason: &str) -> Rewrite {
        info!(transform = self.transform, node, reason, "skipping rewrite");
        Rewrite::Skip
    }
}

/// Statistics from a transform run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransformStats {
    /// Structural matches found
    pub matches_found: usize,
    /// Matches replaced
    pub rewrites_applied: usize,
    /// Matches left untouched
    pub rewrites_skipped: usize,
    /// Nodes present in the input but not the output
    pub nodes_removed: usize,
    /// Input references rewritten by the renamer
    pub references_renamed: usize,
}

impl TransformStats {
    /// Add another run's counters to this one
    pub fn merge(&mut self, other: &TransformStats) {
        self.matches_found += other.matches_found;
        self.rewrites_applied += other.rewrites_applied;
        self.rewrites_skipped += other.rewrites_skipped;
        self.nodes_removed += other.nodes_removed;
        self.references_renamed += other.references_renamed;
    }
}

impl fmt::Display for TransformStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matches, {} applied, {} skipped, {} nodes removed, {} references renamed",
            self.matches_found,
            self.rewrites_applied,
            self.rewrites_skipped,
            self.nodes_removed,
            self.references_renamed
        )
    }
}

/// Result of one engine run
#[derive(Debug, Clone)]
pub struct RewriteOutput {
    /// The rewritten graph
    pub graph: GraphDef,
    /// Final rename map, chains collapsed
    pub renames: RenameMap,
    /// Counters
    pub stats: TransformStats,
}

/// Pattern-driven rewrite engine
///
/// Each run builds a fresh graph; the input is never modified.
pub struct RewriteEngine<'a> {
    pattern: &'a OpTypePattern,
    required: &'a RequiredNames,
    label: &'a str,
}

impl<'a> RewriteEngine<'a> {
    /// Create an engine for `pattern` protecting `required`
    pub fn new(pattern: &'a OpTypePattern, required: &'a RequiredNames) -> Self {
        Self {
            pattern,
            required,
            label: "rewrite",
        }
    }

    /// Name used in logs and policy contexts
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    /// Run the engine with `policy` deciding every structural match
    pub fn run<F>(&self, graph: &GraphDef, mut policy: F) -> GraphResult<RewriteOutput>
    where
        F: FnMut(&NodeMatch<'_>, &RewriteContext<'_>) -> GraphResult<Rewrite>,
    {
        check_graph(graph)?;
        let ctx = GraphContext::new(graph)?;
        let matcher = GraphMatcher::new(&ctx);
        let rewrite_ctx = RewriteContext::new(&ctx, self.required, self.label);

        let mut rebuilder = GraphRebuilder::new(graph);
        let mut renames = RenameMap::new();
        let mut stats = TransformStats::default();

        for (position, node) in graph.node.iter().enumerate() {
            if rebuilder.is_consumed(&node.name) {
                continue;
            }
            let Some(m) = matcher.match_at(node, self.pattern, rebuilder.consumed()) else {
                continue;
            };
            stats.matches_found += 1;
            trace!(transform = self.label, root = %node.name, "matched {}", m.debug_string());

            let consumed = m.consumed_names();
            if let Some(protected) = consumed.iter().find(|name| self.required.contains(**name)) {
                info!(
                    transform = self.label,
                    root = %node.name,
                    node = *protected,
                    "skipping rewrite of required node"
                );
                stats.rewrites_skipped += 1;
                continue;
            }

            match policy(&m, &rewrite_ctx)? {
                Rewrite::Skip => {
                    stats.rewrites_skipped += 1;
                }
                Rewrite::Replace(replacement) => {
                    check_replacement(&ctx, &m, &replacement)?;
                    debug!(
                        transform = self.label,
                        root = %node.name,
                        nodes = replacement.nodes.len(),
                        renames = replacement.renames.len(),
                        "applying rewrite"
                    );
                    for (key, entry) in replacement.renames {
                        renames.insert(key, entry)?;
                    }
                    rebuilder.add_fragment(position, &consumed, replacement.nodes)?;
                    stats.rewrites_applied += 1;
                }
            }
        }

        let mut output = rebuilder.build();
        check_unique_names(&output)?;
        check_rename_completeness(graph, &output, &renames)?;
        stats.nodes_removed = removed_names(graph, &output).len();

        renames.resolve_chains()?;
        stats.references_renamed = rename_node_inputs(&mut output, &renames)?;

        let dangling = find_dangling_references(&output);
        if !dangling.is_empty() {
            let detail: Vec<String> = dangling
                .iter()
                .map(|(node, input)| format!("{} -> {}", node, input))
                .collect();
            return Err(TransformError::InvariantViolation(format!(
                "dangling references after rewrite: {}",
                detail.join(", ")
            )));
        }

        debug!(transform = self.label, %stats, "rewrite finished");
        Ok(RewriteOutput {
            graph: output,
            renames,
            stats,
        })
    }
}

/// Run `policy` over every match of `pattern` in `graph`
pub fn replace_matching_op_types<F>(
    graph: &GraphDef,
    pattern: &OpTypePattern,
    required: &RequiredNames,
    policy: F,
) -> GraphResult<RewriteOutput>
where
    F: FnMut(&NodeMatch<'_>, &RewriteContext<'_>) -> GraphResult<Rewrite>,
{
    RewriteEngine::new(pattern, required).run(graph, policy)
}

/// A replacement may only emit and rename nodes its match owns, plus fresh names
fn check_replacement(
    ctx: &GraphContext<'_>,
    m: &NodeMatch<'_>,
    replacement: &Replacement,
) -> GraphResult<()> {
    let owned = m.consumed_names();

    for node in &replacement.nodes {
        if ctx.has_node(&node.name) && !owned.contains(&node.name.as_str()) {
            return Err(TransformError::InvariantViolation(format!(
                "match rooted at '{}' emitted node '{}' it does not own",
                m.name(),
                node.name
            )));
        }
    }

    for (key, _) in &replacement.renames {
        if !owned.contains(&key.as_str()) {
            return Err(TransformError::InvariantViolation(format!(
                "match rooted at '{}' renamed node '{}' it does not own",
                m.name(),
                key
            )));
        }
    }

    Ok(())
}
