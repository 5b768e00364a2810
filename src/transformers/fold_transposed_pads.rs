use ndarray::Axis;

use crate::error::GraphResult;
use crate::pattern::{NodeMatch, OpTypePattern};
use crate::proto::{AttrValue, DataType, GraphDef, NodeDef, TensorProto};
use crate::tensor::{array_to_tensor_i32, array_to_tensor_i64, i32_to_dtype, tensor_to_array_i64};
use crate::transform::{Replacement, Rewrite, RewriteContext, TransformFuncContext};
use crate::transformers::common::{
    carry_control_inputs, const_tensor, is_permutation, RewritePolicy, NCHW_TO_NHWC, NHWC_TO_NCHW,
};

/// Padding rows in the order the outer layout sees them
const ROW_ORDER: [usize; 4] = [0, 2, 3, 1];

/// Folds a `Pad` sandwiched between layout transposes
///
/// ```text
/// Transpose(Pad(Transpose(x, [0,3,1,2]), paddings), [0,2,3,1])
///   => Pad(x, paddings')
/// ```
///
/// The two transposes cancel, so the pad can run on `x` directly once its
/// rows are reordered from NCHW to NHWC. The inner transpose and both
/// permutation constants stay in the graph; references to the outer
/// transpose move to the pad.
#[derive(Debug, Default)]
pub struct FoldTransposedPads;

impl FoldTransposedPads {
    /// Create a new FoldTransposedPads transformer
    pub fn new() -> Self {
        Self
    }

    /// Rows of a `[4, 2]` paddings tensor reordered for the outer layout
    fn reorder_paddings(paddings: &TensorProto) -> Option<TensorProto> {
        let values = tensor_to_array_i64(paddings).ok()?;
        if values.shape() != [4, 2] {
            return None;
        }
        let reordered = values.select(Axis(0), &ROW_ORDER);

        match i32_to_dtype(paddings.dtype).ok()? {
            DataType::DtInt64 => Some(array_to_tensor_i64(&reordered)),
            DataType::DtInt32 => Some(array_to_tensor_i32(&reordered.mapv(|v| v as i32))),
            _ => None,
        }
    }
}

impl RewritePolicy for FoldTransposedPads {
    fn name(&self) -> &'static str {
        "fold_transposed_pads"
    }

    fn pattern(&self) -> OpTypePattern {
        let inner = OpTypePattern::with_inputs(
            "Transpose",
            vec![OpTypePattern::any(), OpTypePattern::new("Const")],
        );
        let pad = OpTypePattern::with_inputs("Pad", vec![inner, OpTypePattern::new("Const")]);
        OpTypePattern::with_inputs("Transpose", vec![pad, OpTypePattern::new("Const")])
    }

    fn rewrite(&self, m: &NodeMatch<'_>, ctx: &RewriteContext<'_>) -> GraphResult<Rewrite> {
        let (Some(pad), Some(perm2), Some(paddings), Some(transpose1), Some(perm1), Some(input)) = (
            m.node_at(&[0]),
            m.node_at(&[1]),
            m.node_at(&[0, 1]),
            m.node_at(&[0, 0]),
            m.node_at(&[0, 0, 1]),
            m.node_at(&[0, 0, 0]),
        ) else {
            return Ok(Rewrite::Skip);
        };

        if !is_permutation(perm1.node, &NHWC_TO_NCHW) || !is_permutation(perm2.node, &NCHW_TO_NHWC) {
            return Ok(ctx.reject(pad.name(), "transpose permutations do not cancel"));
        }
        if ctx.has_external_consumers(pad.name(), m) {
            return Ok(ctx.reject(pad.name(), "pad output is used outside the match"));
        }
        if ctx.has_external_consumers(paddings.name(), m) {
            return Ok(ctx.reject(paddings.name(), "paddings are shared"));
        }
        let Some(new_paddings) = const_tensor(paddings.node).and_then(Self::reorder_paddings) else {
            return Ok(ctx.reject(paddings.name(), "paddings are not a [4, 2] integer constant"));
        };

        let mut paddings_node = paddings.node.clone();
        paddings_node.set_attr("value", AttrValue::tensor(new_paddings));

        let mut pad_node = NodeDef {
            name: pad.node.name.clone(),
            op: "Pad".to_string(),
            device: pad.node.device.clone(),
            input: vec![input.reference().to_string(), paddings.reference().to_string()],
            experimental_debug_info: pad.node.experimental_debug_info.clone(),
            ..Default::default()
        };
        pad_node.copy_attr(pad.node, "T", "T");
        pad_node.copy_attr(pad.node, "Tpaddings", "Tpaddings");
        carry_control_inputs(&mut pad_node, [pad.node, m.node]);

        Ok(Replacement::new()
            .node(perm1.node.clone())
            .node(transpose1.node.clone())
            .node(paddings_node)
            .node(pad_node)
            .node(perm2.node.clone())
            .rename(m.name(), pad.reference())
            .into())
    }
}

/// Registered entry point
pub fn fold_transposed_pads(
    graph: &GraphDef,
    context: &TransformFuncContext,
) -> GraphResult<GraphDef> {
    FoldTransposedPads::new()
        .run(graph, context)
        .map(|out| out.graph)
}
