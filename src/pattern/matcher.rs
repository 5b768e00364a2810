//! Pattern matching engine for dataflow graphs
//!
//! Matches an [`OpTypePattern`] top-down from a candidate root: the root's
//! op is checked first, then each child pattern against the producer of the
//! corresponding data input. Control inputs never take part in matching.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::graph::{GraphContext, TensorRef};
use crate::proto::NodeDef;

use super::op_type::OpTypePattern;

/// A matched subgraph mirroring the pattern that produced it
#[derive(Debug, Clone)]
pub struct NodeMatch<'g> {
    /// The matched node
    pub node: &'g NodeDef,
    /// Child matches, one per declared child pattern
    pub inputs: Vec<NodeMatch<'g>>,
    /// Bound by a wildcard: not consumed by the match, inputs not inspected
    pub boundary: bool,
    /// Data reference the parent used to reach this node (`None` at the root)
    pub edge: Option<TensorRef>,
}

impl<'g> NodeMatch<'g> {
    /// Name of the matched node
    pub fn name(&self) -> &'g str {
        &self.node.name
    }

    /// Child match at `index`
    pub fn input(&self, index: usize) -> Option<&NodeMatch<'g>> {
        self.inputs.get(index)
    }

    /// Descend through child indices, e.g. `[0, 0, 1]`
    pub fn node_at(&self, path: &[usize]) -> Option<&NodeMatch<'g>> {
        path.iter()
            .try_fold(self, |current, &index| current.inputs.get(index))
    }

    /// Reference to feed into a replacement node in place of this match
    ///
    /// The exact edge the parent consumed, or output 0 at the root.
    pub fn reference(&self) -> TensorRef {
        self.edge
            .clone()
            .unwrap_or_else(|| TensorRef::output(self.node.name.clone(), 0))
    }

    /// Names of the nodes the match owns, pre-order
    pub fn consumed_names(&self) -> Vec<&'g str> {
        let mut names = Vec::new();
        self.visit(&mut |m| {
            if !m.boundary {
                names.push(m.name());
            }
        });
        names
    }

    /// Names of wildcard-bound nodes, pre-order
    pub fn boundary_names(&self) -> Vec<&'g str> {
        let mut names = Vec::new();
        self.visit(&mut |m| {
            if m.boundary {
                names.push(m.name());
            }
        });
        names
    }

    /// Consumed nodes, pre-order
    pub fn consumed_nodes(&self) -> Vec<&'g NodeDef> {
        let mut nodes = Vec::new();
        self.visit(&mut |m| {
            if !m.boundary {
                nodes.push(m.node);
            }
        });
        nodes
    }

    /// Every node in the match, pre-order
    pub fn all_nodes(&self) -> Vec<&'g NodeDef> {
        let mut nodes = Vec::new();
        self.visit(&mut |m| nodes.push(m.node));
        nodes
    }

    /// Check whether `name` is owned by this match
    pub fn consumes(&self, name: &str) -> bool {
        self.consumed_names().contains(&name)
    }

    fn visit<F: FnMut(&NodeMatch<'g>)>(&self, f: &mut F) {
        f(self);
        for child in &self.inputs {
            child.visit(f);
        }
    }

    /// Render as `name(child, child)` for diagnostics
    pub fn debug_string(&self) -> String {
        if self.inputs.is_empty() {
            return if self.boundary {
                format!("*{}", self.node.name)
            } else {
                self.node.name.clone()
            };
        }
        let children: Vec<String> = self.inputs.iter().map(|c| c.debug_string()).collect();
        format!("{}({})", self.node.name, children.join(", "))
    }
}

/// Structural matcher over a [`GraphContext`]
pub struct GraphMatcher<'c, 'g> {
    ctx: &'c GraphContext<'g>,
}

impl<'c, 'g> GraphMatcher<'c, 'g> {
    /// Create a new matcher
    pub fn new(ctx: &'c GraphContext<'g>) -> Self {
        Self { ctx }
    }

    /// Try to match `pattern` rooted at `node`
    ///
    /// Nodes in `excluded` may only be bound by wildcards. Returns `None` on
    /// any structural mismatch, including a node claimed twice by the match.
    pub fn match_at(
        &self,
        node: &'g NodeDef,
        pattern: &OpTypePattern,
        excluded: &FxHashSet<String>,
    ) -> Option<NodeMatch<'g>> {
        let matched = self.match_node(node, pattern, None, excluded)?;

        let mut consumed: FxHashSet<&str> = FxHashSet::default();
        for name in matched.consumed_names() {
            if !consumed.insert(name) {
                trace!(root = %node.name, node = name, "node claimed twice by one match");
                return None;
            }
        }
        if let Some(name) = matched
            .boundary_names()
            .into_iter()
            .find(|name| consumed.contains(name))
        {
            trace!(root = %node.name, node = name, "node is both consumed and boundary");
            return None;
        }

        Some(matched)
    }

    /// Greedy non-overlapping scan in graph order, for diagnostics
    ///
    /// No policy or required-name check is consulted: every structural
    /// match claims its consumed nodes, so a match the rewrite engine would
    /// skip can still hide a later overlapping one here. The engine drives
    /// [`GraphMatcher::match_at`] itself and only claims accepted matches.
    pub fn find_matches(&self, pattern: &OpTypePattern) -> Vec<NodeMatch<'g>> {
        let mut excluded: FxHashSet<String> = FxHashSet::default();
        let mut matches = Vec::new();

        for node in self.ctx.nodes() {
            if excluded.contains(&node.name) {
                continue;
            }
            if let Some(m) = self.match_at(node, pattern, &excluded) {
                excluded.extend(m.consumed_names().into_iter().map(str::to_string));
                matches.push(m);
            }
        }

        matches
    }

    fn match_node(
        &self,
        node: &'g NodeDef,
        pattern: &OpTypePattern,
        edge: Option<TensorRef>,
        excluded: &FxHashSet<String>,
    ) -> Option<NodeMatch<'g>> {
        if pattern.is_wildcard() {
            return Some(NodeMatch {
                node,
                inputs: Vec::new(),
                boundary: true,
                edge,
            });
        }

        if excluded.contains(&node.name) {
            trace!(node = %node.name, "already consumed");
            return None;
        }
        if !pattern.matches_op(&node.op) {
            return None;
        }

        let data_inputs = self.ctx.data_inputs(&node.name);
        if !pattern.inputs.is_empty() || pattern.open_ended {
            let declared = pattern.inputs.len();
            if data_inputs.len() < declared || (data_inputs.len() > declared && !pattern.open_ended)
            {
                trace!(
                    node = %node.name,
                    expected = declared,
                    found = data_inputs.len(),
                    "input arity mismatch"
                );
                return None;
            }
        }

        let mut inputs = Vec::with_capacity(pattern.inputs.len());
        for (child_pattern, reference) in pattern.inputs.iter().zip(data_inputs) {
            let child_node = self.ctx.resolve(reference)?;
            let child =
                self.match_node(child_node, child_pattern, Some(reference.clone()), excluded)?;
            inputs.push(child);
        }

        Some(NodeMatch {
            node,
            inputs,
            boundary: false,
            edge,
        })
    }
}
