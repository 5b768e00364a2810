use ndarray::IxDyn;

use crate::error::GraphResult;
use crate::graph::TensorRef;
use crate::pattern::{NodeMatch, OpTypePattern};
use crate::proto::{AttrValue, DataType, GraphDef, NodeDef, TensorProto};
use crate::tensor::{array_to_tensor_f32, i32_to_dtype, tensor_to_array_f32};
use crate::transform::{Replacement, Rewrite, RewriteContext, TransformFuncContext};
use crate::transformers::common::{
    const_tensor, drop_control_input, is_permutation, set_data_input, RewritePolicy,
    NCHW_TO_NHWC, NHWC_TO_NCHW,
};

/// Moves a scale-and-shift in front of the layout transpose that feeds it
///
/// ```text
/// Add(Mul(Transpose(x, [0,3,1,2]), W), B)
///   => Transpose(AddV2(Mul(x, W'), B'), [0,3,1,2])
/// ```
///
/// `W` and `B` are rank-4 float constants laid out for the transposed
/// tensor; `W'` and `B'` are the same values shuffled back with
/// `[0,2,3,1]`. Every node keeps its name and the add's consumers move to
/// the transpose.
#[derive(Debug, Default)]
pub struct SwapTransMulAdd;

impl SwapTransMulAdd {
    /// Create a new SwapTransMulAdd transformer
    pub fn new() -> Self {
        Self
    }

    /// Shuffle a rank-4 float constant from NCHW to NHWC
    fn to_nhwc(tensor: &TensorProto) -> Option<TensorProto> {
        if i32_to_dtype(tensor.dtype).ok()? != DataType::DtFloat {
            return None;
        }
        let values = tensor_to_array_f32(tensor).ok()?;
        if values.ndim() != 4 {
            return None;
        }
        let axes: Vec<usize> = NCHW_TO_NHWC.iter().map(|&a| a as usize).collect();
        Some(array_to_tensor_f32(&values.permuted_axes(IxDyn(&axes))))
    }

    fn shuffled_const(node: &NodeDef) -> Option<NodeDef> {
        let tensor = const_tensor(node).and_then(Self::to_nhwc)?;
        let mut shuffled = node.clone();
        shuffled.set_attr("value", AttrValue::tensor(tensor));
        Some(shuffled)
    }
}

impl RewritePolicy for SwapTransMulAdd {
    fn name(&self) -> &'static str {
        "swap_trans_mul_add"
    }

    fn pattern(&self) -> OpTypePattern {
        let transpose = OpTypePattern::new("Transpose")
            .input(OpTypePattern::any())
            .input(OpTypePattern::new("Const"));
        let mul = OpTypePattern::new("Mul")
            .input(transpose)
            .input(OpTypePattern::new("Const"));
        OpTypePattern::new("Add|AddV2")
            .input(mul)
            .input(OpTypePattern::new("Const"))
    }

    fn rewrite(&self, m: &NodeMatch<'_>, ctx: &RewriteContext<'_>) -> GraphResult<Rewrite> {
        let (Some(mul), Some(bias), Some(transpose), Some(weights), Some(input), Some(perm)) = (
            m.node_at(&[0]),
            m.node_at(&[1]),
            m.node_at(&[0, 0]),
            m.node_at(&[0, 1]),
            m.node_at(&[0, 0, 0]),
            m.node_at(&[0, 0, 1]),
        ) else {
            return Ok(Rewrite::Skip);
        };

        if !is_permutation(perm.node, &NHWC_TO_NCHW) {
            return Ok(ctx.reject(transpose.name(), "permutation is not [0, 3, 1, 2]"));
        }
        for interior in [mul, transpose, weights, bias] {
            if ctx.has_external_consumers(interior.name(), m) {
                return Ok(ctx.reject(interior.name(), "used outside the match"));
            }
        }
        let (Some(new_weights), Some(new_bias)) =
            (Self::shuffled_const(weights.node), Self::shuffled_const(bias.node))
        else {
            return Ok(ctx.reject(m.name(), "weights and bias must be rank-4 float constants"));
        };

        let mut new_mul = mul.node.clone();
        drop_control_input(&mut new_mul, transpose.name());
        let mut add = m.node.clone();
        add.op = "AddV2".to_string();
        drop_control_input(&mut add, transpose.name());
        let mut new_transpose = transpose.node.clone();
        let rewired = set_data_input(&mut new_mul, 0, &input.reference())
            && set_data_input(&mut add, 0, &TensorRef::output(mul.name(), 0))
            && set_data_input(&mut new_transpose, 0, &TensorRef::output(m.name(), 0));
        if !rewired {
            return Ok(Rewrite::Skip);
        }

        Ok(Replacement::new()
            .nodes([new_weights, new_mul, new_bias, add, perm.node.clone(), new_transpose])
            .rename_except(
                m.name(),
                TensorRef::output(transpose.name(), 0),
                [transpose.name()],
            )
            .into())
    }
}

/// Registered entry point
pub fn swap_trans_mul_add(
    graph: &GraphDef,
    context: &TransformFuncContext,
) -> GraphResult<GraphDef> {
    SwapTransMulAdd::new()
        .run(graph, context)
        .map(|out| out.graph)
}
