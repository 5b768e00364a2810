//! GraphDef reader
//!
//! Load binary `GraphDef` files or bytes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use prost::Message;
use tracing::debug;

use crate::error::GraphResult;
use crate::proto::GraphDef;

/// Load a graph from a file path
///
/// # Example
///
/// ```ignore
/// use graph_transforms::io::load_graph;
///
/// let graph = load_graph("frozen.pb")?;
/// println!("{} nodes", graph.node.len());
/// ```
pub fn load_graph<P: AsRef<Path>>(path: P) -> GraphResult<GraphDef> {
    let path = path.as_ref();

    let mut reader = BufReader::new(File::open(path)?);
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    debug!(path = %path.display(), bytes = buffer.len(), "read graph file");
    load_graph_from_bytes(&buffer)
}

/// Decode a graph from bytes
pub fn load_graph_from_bytes(bytes: &[u8]) -> GraphResult<GraphDef> {
    Ok(GraphDef::decode(bytes)?)
}

/// Summary of a graph's contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphInfo {
    /// Number of nodes
    pub node_count: usize,
    /// Producer version, when recorded
    pub producer: Option<i32>,
    /// Op type → number of nodes
    pub op_counts: BTreeMap<String, usize>,
}

/// Collect a [`GraphInfo`] summary
pub fn get_graph_info(graph: &GraphDef) -> GraphInfo {
    let mut op_counts = BTreeMap::new();
    for node in &graph.node {
        *op_counts.entry(node.op.clone()).or_insert(0) += 1;
    }
    GraphInfo {
        node_count: graph.node.len(),
        producer: graph.versions.as_ref().map(|v| v.producer),
        op_counts,
    }
}
