use crate::error::GraphResult;
use crate::graph::TensorRef;
use crate::pattern::{NodeMatch, OpTypePattern};
use crate::proto::GraphDef;
use crate::transform::{Replacement, Rewrite, RewriteContext, TransformFuncContext};
use crate::transformers::common::{drop_control_input, set_data_input, RewritePolicy};

/// Moves a `Relu` in front of the `Transpose` that feeds it
///
/// ```text
/// Relu(Transpose(x, perm))  =>  Transpose(Relu(x), perm)
/// ```
///
/// Both nodes keep their names. Consumers of the relu are moved to the
/// transpose, which now produces the same values.
#[derive(Debug, Default)]
pub struct SwapTransRelu;

impl SwapTransRelu {
    /// Create a new SwapTransRelu transformer
    pub fn new() -> Self {
        Self
    }
}

impl RewritePolicy for SwapTransRelu {
    fn name(&self) -> &'static str {
        "swap_trans_relu"
    }

    fn pattern(&self) -> OpTypePattern {
        OpTypePattern::new("Relu").input(
            OpTypePattern::new("Transpose")
                .input(OpTypePattern::any())
                .input(OpTypePattern::new("Const")),
        )
    }

    fn rewrite(&self, m: &NodeMatch<'_>, ctx: &RewriteContext<'_>) -> GraphResult<Rewrite> {
        let (Some(transpose), Some(input), Some(perm)) =
            (m.node_at(&[0]), m.node_at(&[0, 0]), m.node_at(&[0, 1]))
        else {
            return Ok(Rewrite::Skip);
        };

        if ctx.is_required(input.name()) {
            return Ok(ctx.reject(input.name(), "input is a declared graph input or output"));
        }
        if ctx.has_external_consumers(transpose.name(), m) {
            return Ok(ctx.reject(transpose.name(), "transpose output is used outside the match"));
        }

        let mut relu = m.node.clone();
        drop_control_input(&mut relu, transpose.name());
        let mut new_transpose = transpose.node.clone();
        if !set_data_input(&mut relu, 0, &input.reference())
            || !set_data_input(&mut new_transpose, 0, &TensorRef::output(relu.name.clone(), 0))
        {
            return Ok(Rewrite::Skip);
        }

        Ok(Replacement::new()
            .node(relu)
            .node(perm.node.clone())
            .node(new_transpose)
            .rename_except(
                m.name(),
                TensorRef::output(transpose.name(), 0),
                [transpose.name()],
            )
            .into())
    }
}

/// Registered entry point
pub fn swap_trans_relu(graph: &GraphDef, context: &TransformFuncContext) -> GraphResult<GraphDef> {
    SwapTransRelu::new().run(graph, context).map(|out| out.graph)
}
