//! Graph context for dataflow graph manipulation
//!
//! `GraphContext` is the read-only view the matcher and rewrite policies
//! work against. It borrows a `GraphDef` and keeps lookup maps for nodes,
//! parsed input references, and consumers.

use crate::error::{GraphResult, TransformError};
use crate::proto::{GraphDef, NodeDef};

use super::maps::{build_consumer_map, build_input_refs, build_node_map, ConsumerMap, NodeMap};
use super::reference::TensorRef;

/// Graph context for efficient graph operations
///
/// Built once per transform invocation and discarded with it.
#[derive(Debug)]
pub struct GraphContext<'g> {
    graph: &'g GraphDef,

    /// Maps node name → position (preserves graph order)
    node_map: NodeMap,

    /// Parsed inputs, one row per node position
    input_refs: Vec<Vec<TensorRef>>,

    /// Maps node name → names of nodes that reference it
    consumer_map: ConsumerMap,
}

impl<'g> GraphContext<'g> {
    /// Create a new context, failing on duplicate names or malformed references
    pub fn new(graph: &'g GraphDef) -> GraphResult<Self> {
        let node_map = build_node_map(graph)?;
        let input_refs = build_input_refs(graph).map_err(|err| match err {
            TransformError::MalformedReference(input) => {
                TransformError::InputMalformed(format!("malformed reference '{}'", input))
            }
            other => other,
        })?;
        let consumer_map = build_consumer_map(graph, &input_refs);

        Ok(Self {
            graph,
            node_map,
            input_refs,
            consumer_map,
        })
    }

    /// The underlying graph
    pub fn graph(&self) -> &'g GraphDef {
        self.graph
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a node by name
    pub fn get_node(&self, name: &str) -> Option<&'g NodeDef> {
        self.node_map.get(name).map(|&pos| &self.graph.node[pos])
    }

    /// Position of a node in the original node list
    pub fn position(&self, name: &str) -> Option<usize> {
        self.node_map.get(name).copied()
    }

    /// Check if a node exists
    pub fn has_node(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node.len()
    }

    /// Iterate over all nodes in order
    pub fn nodes(&self) -> impl Iterator<Item = &'g NodeDef> {
        self.graph.node.iter()
    }

    /// Find all nodes with the given op type
    pub fn find_nodes_by_op(&self, op: &str) -> Vec<&'g NodeDef> {
        self.graph.node.iter().filter(|n| n.op == op).collect()
    }

    /// Node a reference points at
    pub fn resolve(&self, reference: &TensorRef) -> Option<&'g NodeDef> {
        self.get_node(&reference.node)
    }

    // ========================================================================
    // Input references
    // ========================================================================

    /// Parsed inputs of the node at `position`
    pub fn input_refs_at(&self, position: usize) -> &[TensorRef] {
        self.input_refs
            .get(position)
            .map(|refs| refs.as_slice())
            .unwrap_or(&[])
    }

    /// Parsed inputs of a node by name
    pub fn input_refs(&self, name: &str) -> Option<&[TensorRef]> {
        self.position(name).map(|pos| self.input_refs_at(pos))
    }

    /// Data inputs of a node in order, control inputs skipped
    pub fn data_inputs(&self, name: &str) -> Vec<&TensorRef> {
        self.input_refs(name)
            .map(|refs| refs.iter().filter(|r| !r.is_control()).collect())
            .unwrap_or_default()
    }

    /// Control inputs of a node in order
    pub fn control_inputs(&self, name: &str) -> Vec<&TensorRef> {
        self.input_refs(name)
            .map(|refs| refs.iter().filter(|r| r.is_control()).collect())
            .unwrap_or_default()
    }

    /// Producer of the `index`-th data input
    pub fn get_input_node(&self, name: &str, index: usize) -> Option<&'g NodeDef> {
        self.data_inputs(name)
            .get(index)
            .and_then(|r| self.resolve(r))
    }

    // ========================================================================
    // Consumers
    // ========================================================================

    /// Names of nodes that reference `name`, once per edge
    pub fn get_consumer_names(&self, name: &str) -> &[String] {
        self.consumer_map
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Consumer nodes of `name`
    pub fn get_consumers(&self, name: &str) -> Vec<&'g NodeDef> {
        self.get_consumer_names(name)
            .iter()
            .filter_map(|consumer| self.get_node(consumer))
            .collect()
    }

    /// Number of edges, data or control, that leave `name`
    pub fn consumer_count(&self, name: &str) -> usize {
        self.get_consumer_names(name).len()
    }

    /// True when exactly one edge leaves `name`
    pub fn is_single_consumer(&self, name: &str) -> bool {
        self.consumer_count(name) == 1
    }

    /// True when every edge leaving `name` ends at a node in `allowed`
    pub fn consumers_within<'a, I>(&self, name: &str, allowed: I) -> bool
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        self.get_consumer_names(name)
            .iter()
            .all(|consumer| allowed.clone().into_iter().any(|a| a == consumer))
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Every `(node, input)` pair whose referenced node does not exist
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for (node, refs) in self.graph.node.iter().zip(&self.input_refs) {
            for reference in refs {
                if !self.node_map.contains_key(&reference.node) {
                    dangling.push((node.name.clone(), reference.to_string()));
                }
            }
        }
        dangling
    }
}
