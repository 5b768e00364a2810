//! Built-in graph transformers
//!
//! This module provides the ready-to-use rewrites for layout and no-op
//! cleanup:
//!
//! - **Elimination**: drop single-output `Split` and empty `PadV2` nodes
//! - **Substitution**: `Dilation2D` → `MaxPool`
//! - **Layout**: fold pads between cancelling transposes, move element-wise
//!   ops in front of a transpose
//!
//! # Overview
//!
//! Each transformer implements the [`RewritePolicy`] trait and is exposed
//! as a free function registered by name in the process-wide registry.
//!
//! # Example
//!
//! ```ignore
//! use graph_transforms::transform::TransformFuncContext;
//! use graph_transforms::transformers::{RemoveNoopSplit, RewritePolicy};
//!
//! let context = TransformFuncContext::new(["input"], ["logits"]);
//! let out = RemoveNoopSplit::new().run(&graph, &context)?;
//!
//! println!("Removed {} splits", out.stats.nodes_removed);
//! ```
//!
//! # Using TransformPipeline
//!
//! For convenience, use [`TransformPipeline`] to run a transform list:
//!
//! ```ignore
//! use graph_transforms::transformers::TransformPipeline;
//!
//! let pipeline = TransformPipeline::parse("remove_noop_split swap_trans_relu")?
//!     .with_inputs(["input"])
//!     .with_outputs(["logits"]);
//! let (graph, stats) = pipeline.run(&graph)?;
//! ```

/// Common utilities and types
pub mod common;
/// Dilation2D to MaxPool
pub mod dilation_to_maxpool;
/// Fold Pad between layout transposes
pub mod fold_transposed_pads;
/// Remove single-output Split
pub mod remove_noop_split;
/// Remove empty PadV2
pub mod remove_noop_padv2;
/// Swap Transpose + Mul + Add
pub mod swap_trans_mul_add;
/// Swap Transpose + Relu
pub mod swap_trans_relu;

// Re-export common types
pub use common::{RewritePolicy, NCHW_TO_NHWC, NHWC_TO_NCHW};

// Re-export transformers
pub use dilation_to_maxpool::{dilation2d_to_maxpool2d, Dilation2DToMaxPool2D};
pub use fold_transposed_pads::{fold_transposed_pads, FoldTransposedPads};
pub use remove_noop_padv2::{remove_noop_padv2, RemoveNoopPadV2};
pub use remove_noop_split::{remove_noop_split, RemoveNoopSplit};
pub use swap_trans_mul_add::{swap_trans_mul_add, SwapTransMulAdd};
pub use swap_trans_relu::{swap_trans_relu, SwapTransRelu};

use tracing::{debug, info, warn};

use crate::error::{GraphResult, TransformError};
use crate::graph::validate_declared_names;
use crate::proto::GraphDef;
use crate::transform::{
    global_registry, parse_transform_list, TransformFunc, TransformFuncContext, TransformList,
    TransformRegistry,
};

/// Built-in transforms in registration order
const BUILTIN_TRANSFORMS: [(&str, TransformFunc); 6] = [
    ("remove_noop_split", remove_noop_split),
    ("remove_noop_padv2", remove_noop_padv2),
    ("dilation2d_to_maxpool2d", dilation2d_to_maxpool2d),
    ("fold_transposed_pads", fold_transposed_pads),
    ("swap_trans_relu", swap_trans_relu),
    ("swap_trans_mul_add", swap_trans_mul_add),
];

/// Register every built-in transform
///
/// Names already present are left as they are.
pub fn register_builtin_transforms(registry: &mut TransformRegistry) {
    for (name, func) in BUILTIN_TRANSFORMS {
        if let Err(err) = registry.register(name, func) {
            debug!(transform = name, %err, "builtin transform not registered");
        }
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    /// Full passes over the transform list
    pub passes: usize,
    /// Individual transform invocations
    pub transforms_run: usize,
    /// Node count of the input graph
    pub nodes_before: usize,
    /// Node count of the output graph
    pub nodes_after: usize,
}

/// Runs a list of registered transforms in sequence
///
/// Each transform's output is the next one's input. With `iterations`
/// above one the whole list is repeated until a pass leaves the graph
/// unchanged or the limit is reached.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    /// Transforms and their parameters, in order
    pub transforms: TransformList,
    /// Declared graph inputs
    pub inputs: Vec<String>,
    /// Declared graph outputs
    pub outputs: Vec<String>,
    /// Maximum number of passes over the list
    pub iterations: usize,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self {
            transforms: TransformList::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            iterations: 1,
        }
    }
}

impl TransformPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline from a transform list such as `"a b(key=value)"`
    pub fn parse(transforms: &str) -> GraphResult<Self> {
        Ok(Self {
            transforms: parse_transform_list(transforms)?,
            ..Self::default()
        })
    }

    /// Set the declared graph inputs
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the declared graph outputs
    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the pass limit
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Run against the global registry
    pub fn run(&self, graph: &GraphDef) -> GraphResult<(GraphDef, PipelineStats)> {
        self.run_with(global_registry(), graph)
    }

    /// Run against `registry`
    pub fn run_with(
        &self,
        registry: &TransformRegistry,
        graph: &GraphDef,
    ) -> GraphResult<(GraphDef, PipelineStats)> {
        if let Some((name, _)) = self.transforms.iter().find(|(name, _)| !registry.contains(name)) {
            return Err(TransformError::UnknownTransform(name.clone()));
        }

        let declared: Vec<&String> = self.inputs.iter().chain(self.outputs.iter()).collect();
        for warning in validate_declared_names(graph, &declared).warnings {
            warn!("{}", warning);
        }

        let mut stats = PipelineStats {
            nodes_before: graph.node.len(),
            ..PipelineStats::default()
        };
        let mut current = graph.clone();

        for pass in 0..self.iterations.max(1) {
            let before = current.clone();
            for (name, params) in &self.transforms {
                let context = TransformFuncContext::new(self.inputs.clone(), self.outputs.clone())
                    .with_params(params.clone());
                current = registry.apply(name, &current, &context)?;
                stats.transforms_run += 1;
                debug!(transform = %name, pass, nodes = current.node.len(), "transform applied");
            }
            stats.passes += 1;
            if current == before {
                break;
            }
        }

        stats.nodes_after = current.node.len();
        info!(
            passes = stats.passes,
            transforms = stats.transforms_run,
            nodes_before = stats.nodes_before,
            nodes_after = stats.nodes_after,
            "pipeline finished"
        );
        Ok((current, stats))
    }
}

/// Parse `transforms` and run them once over `graph`
pub fn transform_graph(
    graph: &GraphDef,
    inputs: &[&str],
    outputs: &[&str],
    transforms: &str,
) -> GraphResult<GraphDef> {
    TransformPipeline::parse(transforms)?
        .with_inputs(inputs.iter().copied())
        .with_outputs(outputs.iter().copied())
        .run(graph)
        .map(|(graph, _)| graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::extensions::{make_const_node, make_node};
    use crate::proto::AttrValue;
    use crate::tensor::vec_to_tensor_i32;

    fn split(name: &str, input: &str) -> crate::proto::NodeDef {
        let mut node = make_node("Split", &["dim", input], name);
        node.set_attr("num_split", AttrValue::int(1));
        node
    }

    fn graph() -> GraphDef {
        GraphDef {
            node: vec![
                make_node("Placeholder", &[], "x"),
                make_node("Conv2D", &["x"], "conv"),
                make_const_node("dim", vec_to_tensor_i32(&[0])),
                make_const_node("perm", vec_to_tensor_i32(&[0, 3, 1, 2])),
                make_node("Transpose", &["conv", "perm"], "transpose"),
                split("split", "transpose"),
                make_node("Relu", &["split"], "relu"),
                make_node("Identity", &["relu"], "y"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = global_registry();
        for (name, _) in BUILTIN_TRANSFORMS {
            assert!(registry.contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_register_twice_keeps_first() {
        let mut registry = TransformRegistry::new();
        register_builtin_transforms(&mut registry);
        register_builtin_transforms(&mut registry);
        assert_eq!(registry.len(), BUILTIN_TRANSFORMS.len());
    }

    #[test]
    fn test_pipeline_chains_transforms() {
        let out = transform_graph(&graph(), &["x"], &["y"], "remove_noop_split swap_trans_relu")
            .unwrap();

        let relu = out.node.iter().find(|n| n.name == "relu").unwrap();
        assert_eq!(relu.input, vec!["conv"]);
        let y = out.node.iter().find(|n| n.name == "y").unwrap();
        assert_eq!(y.input, vec!["transpose"]);
        assert!(out.node.iter().all(|n| n.name != "split"));
    }

    #[test]
    fn test_unknown_transform_fails_before_running() {
        let err = transform_graph(&graph(), &["x"], &["y"], "remove_noop_split nope").unwrap_err();
        assert!(matches!(err, TransformError::UnknownTransform(name) if name == "nope"));
    }

    #[test]
    fn test_iterations_stop_at_fixed_point() {
        let pipeline = TransformPipeline::parse("remove_noop_split")
            .unwrap()
            .with_inputs(["x"])
            .with_outputs(["y"])
            .with_iterations(5);
        let (_, stats) = pipeline.run(&graph()).unwrap();
        assert_eq!(stats.passes, 2);
        assert_eq!(stats.nodes_before - stats.nodes_after, 1);
    }

    #[test]
    fn test_failure_names_the_transform() {
        let bad = GraphDef {
            node: vec![make_node("Relu", &["ghost"], "relu")],
            ..Default::default()
        };
        let err = transform_graph(&bad, &[], &["relu"], "swap_trans_relu").unwrap_err();
        match err {
            TransformError::TransformFailed { transform, source } => {
                assert_eq!(transform, "swap_trans_relu");
                assert!(matches!(*source, TransformError::InputMalformed(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
