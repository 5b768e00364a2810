use crate::error::GraphResult;
use crate::pattern::{NodeMatch, OpTypePattern};
use crate::proto::GraphDef;
use crate::transform::{Replacement, Rewrite, RewriteContext, TransformFuncContext};
use crate::transformers::common::{const_values_i64, RewritePolicy};

/// Removes `PadV2` nodes that pad nothing
///
/// A `PadV2(input, paddings, constant_values)` whose paddings are a
/// constant of all zeros is replaced by its input. With `force` set every
/// `PadV2` is removed regardless of its paddings.
#[derive(Debug, Default)]
pub struct RemoveNoopPadV2 {
    /// Remove every PadV2, not only the provably empty ones
    pub force: bool,
}

impl RemoveNoopPadV2 {
    /// Create a new RemoveNoopPadV2 transformer
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the `force` parameter
    pub fn from_context(context: &TransformFuncContext) -> GraphResult<Self> {
        Ok(Self {
            force: context.get_one_bool_parameter("force", false)?,
        })
    }
}

impl RewritePolicy for RemoveNoopPadV2 {
    fn name(&self) -> &'static str {
        "remove_noop_padv2"
    }

    fn pattern(&self) -> OpTypePattern {
        OpTypePattern::with_inputs(
            "PadV2",
            vec![OpTypePattern::any(), OpTypePattern::any(), OpTypePattern::any()],
        )
    }

    fn rewrite(&self, m: &NodeMatch<'_>, ctx: &RewriteContext<'_>) -> GraphResult<Rewrite> {
        let (Some(input), Some(paddings)) = (m.input(0), m.input(1)) else {
            return Ok(Rewrite::Skip);
        };

        if !self.force {
            match const_values_i64(paddings.node) {
                Some(values) if values.iter().all(|&v| v == 0) => {}
                Some(_) => return Ok(Rewrite::Skip),
                None => return Ok(ctx.reject(m.name(), "paddings are not a decodable constant")),
            }
        }

        Ok(Replacement::new()
            .rename(m.name(), input.reference())
            .into())
    }
}

/// Registered entry point
pub fn remove_noop_padv2(graph: &GraphDef, context: &TransformFuncContext) -> GraphResult<GraphDef> {
    RemoveNoopPadV2::from_context(context)?
        .run(graph, context)
        .map(|out| out.graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::extensions::{make_const_node, make_node};
    use crate::proto::{DataType, NodeDef, TensorProto};
    use crate::tensor::{make_shape, vec_to_tensor_f32};

    // Paddings for a rank-2 input; short value lists repeat their last value
    fn paddings(name: &str, rows: &[i32]) -> NodeDef {
        let tensor = TensorProto {
            dtype: DataType::DtInt32 as i32,
            tensor_shape: Some(make_shape(&[2, 2])),
            int_val: rows.to_vec(),
            ..Default::default()
        };
        make_const_node(name, tensor)
    }

    fn graph_with(pad_rows: &[i32]) -> GraphDef {
        GraphDef {
            node: vec![
                make_node("Placeholder", &[], "x"),
                paddings("paddings", pad_rows),
                make_const_node("value", vec_to_tensor_f32(&[0.0], &[])),
                make_node("PadV2", &["x:1", "paddings", "value", "^x"], "pad"),
                make_node("Relu", &["pad"], "y"),
                make_node("NoOp", &["^pad"], "sync"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_padding_is_removed() {
        let graph = graph_with(&[0, 0, 0, 0]);
        let context = TransformFuncContext::new(["x"], ["y", "sync"]);
        let out = remove_noop_padv2(&graph, &context).unwrap();

        assert!(out.node.iter().all(|n| n.name != "pad"));
        let relu = out.node.iter().find(|n| n.name == "y").unwrap();
        assert_eq!(relu.input, vec!["x:1"]);
        let sync = out.node.iter().find(|n| n.name == "sync").unwrap();
        assert_eq!(sync.input, vec!["^x"]);
    }

    #[test]
    fn test_single_zero_fills_paddings() {
        let graph = graph_with(&[0]);
        let out = remove_noop_padv2(&graph, &TransformFuncContext::new(["x"], ["y"])).unwrap();
        assert!(out.node.iter().all(|n| n.name != "pad"));
    }

    #[test]
    fn test_real_padding_is_kept_unless_forced() {
        let graph = graph_with(&[1, 1, 0, 0]);
        let context = TransformFuncContext::new(["x"], ["y"]);
        let out = remove_noop_padv2(&graph, &context).unwrap();
        assert_eq!(out, graph);

        let forced = context.with_param("force", "true");
        let out = remove_noop_padv2(&graph, &forced).unwrap();
        assert!(out.node.iter().all(|n| n.name != "pad"));
    }

    #[test]
    fn test_non_constant_paddings_are_kept() {
        let mut graph = graph_with(&[0, 0, 0, 0]);
        graph.node[1] = make_node("Placeholder", &[], "paddings");
        let out = remove_noop_padv2(&graph, &TransformFuncContext::new(["x"], ["y"])).unwrap();
        assert_eq!(out, graph);
    }

    #[test]
    fn test_oversized_paddings_are_kept() {
        let mut graph = graph_with(&[0]);
        let tensor = TensorProto {
            dtype: DataType::DtInt32 as i32,
            tensor_shape: Some(make_shape(&[1 << 33, 1 << 33])),
            int_val: vec![0],
            ..Default::default()
        };
        graph.node[1] = make_const_node("paddings", tensor);

        let out = remove_noop_padv2(&graph, &TransformFuncContext::new(["x"], ["y"])).unwrap();
        assert_eq!(out, graph);
    }

    #[test]
    fn test_bad_force_value_is_an_error() {
        let graph = graph_with(&[0, 0]);
        let context = TransformFuncContext::new(["x"], ["y"]).with_param("force", "maybe");
        assert!(remove_noop_padv2(&graph, &context).is_err());
    }
}
