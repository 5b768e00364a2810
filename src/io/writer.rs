//! GraphDef writer
//!
//! Save graphs to files or bytes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use prost::Message;
use tracing::debug;

use crate::error::GraphResult;
use crate::proto::GraphDef;

/// Save a graph to a file
///
/// # Example
///
/// ```ignore
/// use graph_transforms::io::save_graph;
///
/// save_graph(&graph, "transformed.pb")?;
/// ```
pub fn save_graph<P: AsRef<Path>>(graph: &GraphDef, path: P) -> GraphResult<()> {
    let path = path.as_ref();
    let bytes = graph_to_bytes(graph);

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote graph file");
    Ok(())
}

/// Encode a graph to bytes
pub fn graph_to_bytes(graph: &GraphDef) -> Vec<u8> {
    graph.encode_to_vec()
}

/// Size of the encoded graph in bytes
pub fn graph_size(graph: &GraphDef) -> usize {
    graph.encoded_len()
}
