//! GraphDef I/O module
//!
//! This module provides functions for loading and saving binary `GraphDef`
//! files, and a one-shot file-to-file transform.
//!
//! # Example
//!
//! ```ignore
//! use graph_transforms::io::{load_graph, save_graph, transform_file, TransformFileOptions};
//!
//! // Load and save
//! let graph = load_graph("frozen.pb")?;
//! save_graph(&graph, "copy.pb")?;
//!
//! // One-shot transform
//! let options = TransformFileOptions {
//!     inputs: vec!["input".into()],
//!     outputs: vec!["logits".into()],
//!     transforms: "remove_noop_split fold_transposed_pads".into(),
//!     ..Default::default()
//! };
//! let stats = transform_file("frozen.pb", "transformed.pb", &options)?;
//! println!("Removed {} nodes", stats.nodes_removed);
//! ```

pub mod reader;
pub mod writer;

// Re-exports
pub use reader::{get_graph_info, load_graph, load_graph_from_bytes, GraphInfo};
pub use writer::{graph_size, graph_to_bytes, save_graph};

use std::path::Path;

use tracing::info;

use crate::error::GraphResult;
use crate::proto::GraphDef;
use crate::transformers::{PipelineStats, TransformPipeline};

/// File transform statistics
#[derive(Debug, Clone, Default)]
pub struct TransformFileStats {
    /// Input node count
    pub original_nodes: usize,
    /// Output node count
    pub transformed_nodes: usize,
    /// Nodes removed
    pub nodes_removed: usize,
    /// Input file size in bytes
    pub original_size: usize,
    /// Output file size in bytes
    pub transformed_size: usize,
    /// Pipeline statistics
    pub pipeline: PipelineStats,
}

impl TransformFileStats {
    /// Calculate node reduction percentage
    pub fn node_reduction_percent(&self) -> f64 {
        if self.original_nodes == 0 {
            0.0
        } else {
            (self.nodes_removed as f64 / self.original_nodes as f64) * 100.0
        }
    }
}

/// File transform options
#[derive(Debug, Clone)]
pub struct TransformFileOptions {
    /// Declared graph inputs
    pub inputs: Vec<String>,
    /// Declared graph outputs
    pub outputs: Vec<String>,
    /// Transform list, e.g. `"remove_noop_padv2(force=true) swap_trans_relu"`
    pub transforms: String,
    /// Maximum passes over the transform list
    pub iterations: usize,
}

impl Default for TransformFileOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            transforms: String::new(),
            iterations: 1,
        }
    }
}

/// Transform a graph in memory
pub fn transform_graph_with_options(
    graph: &GraphDef,
    options: &TransformFileOptions,
) -> GraphResult<(GraphDef, PipelineStats)> {
    TransformPipeline::parse(&options.transforms)?
        .with_inputs(options.inputs.iter().cloned())
        .with_outputs(options.outputs.iter().cloned())
        .with_iterations(options.iterations)
        .run(graph)
}

/// Load `input`, run the configured transforms, save to `output`
///
/// This is the main entry point for file-based transforms.
pub fn transform_file<P1: AsRef<Path>, P2: AsRef<Path>>(
    input: P1,
    output: P2,
    options: &TransformFileOptions,
) -> GraphResult<TransformFileStats> {
    let graph = load_graph(input)?;
    let (transformed, pipeline) = transform_graph_with_options(&graph, options)?;
    save_graph(&transformed, output)?;

    let stats = TransformFileStats {
        original_nodes: graph.node.len(),
        transformed_nodes: transformed.node.len(),
        nodes_removed: graph.node.len().saturating_sub(transformed.node.len()),
        original_size: graph_size(&graph),
        transformed_size: graph_size(&transformed),
        pipeline,
    };
    info!(
        nodes_before = stats.original_nodes,
        nodes_after = stats.transformed_nodes,
        "transformed graph file"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::proto::extensions::{make_const_node, make_node};
    use crate::proto::AttrValue;
    use crate::tensor::vec_to_tensor_i32;

    fn make_test_graph() -> GraphDef {
        let mut split = make_node("Split", &["dim", "x"], "split");
        split.set_attr("num_split", AttrValue::int(1));
        GraphDef {
            node: vec![
                make_node("Placeholder", &[], "x"),
                make_const_node("dim", vec_to_tensor_i32(&[0])),
                split,
                make_node("Relu", &["split"], "y"),
            ],
            ..Default::default()
        }
    }

    fn options(transforms: &str) -> TransformFileOptions {
        TransformFileOptions {
            inputs: vec!["x".to_string()],
            outputs: vec!["y".to_string()],
            transforms: transforms.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_transform_file() {
        let dir = std::env::temp_dir();
        let input_path = dir.join(format!("transform_in_{}.pb", std::process::id()));
        let output_path = dir.join(format!("transform_out_{}.pb", std::process::id()));
        save_graph(&make_test_graph(), &input_path).unwrap();

        let stats = transform_file(&input_path, &output_path, &options("remove_noop_split")).unwrap();
        assert_eq!(stats.nodes_removed, 1);
        assert!(stats.transformed_size < stats.original_size);

        let loaded = load_graph(&output_path).unwrap();
        let y = loaded.node.iter().find(|n| n.name == "y").unwrap();
        assert_eq!(y.input, vec!["x"]);

        std::fs::remove_file(&input_path).ok();
        std::fs::remove_file(&output_path).ok();
    }

    #[test]
    fn test_transform_file_keeps_library() {
        let dir = std::env::temp_dir();
        let input_path = dir.join(format!("library_in_{}.pb", std::process::id()));
        let output_path = dir.join(format!("library_out_{}.pb", std::process::id()));
        let graph = GraphDef {
            library: Some(vec![10, 0]),
            debug_info: Some(vec![10, 3, b'a', b'.', b'c']),
            ..make_test_graph()
        };
        save_graph(&graph, &input_path).unwrap();

        transform_file(&input_path, &output_path, &options("remove_noop_split")).unwrap();
        let loaded = load_graph(&output_path).unwrap();
        assert_eq!(loaded.node.len(), 3);
        assert_eq!(loaded.library, graph.library);
        assert_eq!(loaded.debug_info, graph.debug_info);

        std::fs::remove_file(&input_path).ok();
        std::fs::remove_file(&output_path).ok();
    }

    #[test]
    fn test_bad_transform_list() {
        let err = transform_graph_with_options(&make_test_graph(), &options("split(")).unwrap_err();
        assert!(matches!(err, TransformError::InvalidParameter(_)));
    }

    #[test]
    fn test_node_reduction_percent() {
        let stats = TransformFileStats {
            original_nodes: 10,
            nodes_removed: 2,
            ..Default::default()
        };
        assert!((stats.node_reduction_percent() - 20.0).abs() < 0.01);
    }
}
