//! Graph map types and builders
//!
//! Defines the lookup structures the matcher and the rewrite engine use.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{GraphResult, TransformError};
use crate::proto::GraphDef;

use super::reference::{node_name_from_input, TensorRef};

/// Type alias for node map: node_name → position in `GraphDef.node` (order preserved)
pub type NodeMap = IndexMap<String, usize>;

/// Type alias for consumer map: node_name → names of nodes that reference it
/// SmallVec optimized for common case of 1-4 consumers
pub type ConsumerMap = FxHashMap<String, SmallVec<[String; 4]>>;

/// Node names that must never be deleted or renamed away
pub type RequiredNames = BTreeSet<String>;

/// Build node map from graph nodes
///
/// Fails on duplicate names, which make every reference ambiguous.
pub fn build_node_map(graph: &GraphDef) -> GraphResult<NodeMap> {
    let mut map = IndexMap::with_capacity(graph.node.len());

    for (position, node) in graph.node.iter().enumerate() {
        if node.name.is_empty() {
            return Err(TransformError::InputMalformed(format!(
                "node at position {} ({}) has no name",
                position, node.op
            )));
        }
        if map.insert(node.name.clone(), position).is_some() {
            return Err(TransformError::InputMalformed(format!(
                "duplicate node name '{}'",
                node.name
            )));
        }
    }

    Ok(map)
}

/// Parse every node's inputs once
pub fn build_input_refs(graph: &GraphDef) -> GraphResult<Vec<Vec<TensorRef>>> {
    graph
        .node
        .iter()
        .map(|node| {
            node.input
                .iter()
                .map(|input| TensorRef::parse(input))
                .collect::<GraphResult<Vec<_>>>()
        })
        .collect()
}

/// Build consumer map from parsed inputs
///
/// A consumer appears once per referencing edge, data or control.
pub fn build_consumer_map(graph: &GraphDef, refs: &[Vec<TensorRef>]) -> ConsumerMap {
    let mut map: ConsumerMap = FxHashMap::default();

    for (node, inputs) in graph.node.iter().zip(refs) {
        for input in inputs {
            map.entry(input.node.clone())
                .or_default()
                .push(node.name.clone());
        }
    }

    map
}

/// Build the required name set from declared graph inputs and outputs
pub fn build_required_names<I, S>(declared: I) -> RequiredNames
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    declared
        .into_iter()
        .map(|name| node_name_from_input(name.as_ref()).to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
