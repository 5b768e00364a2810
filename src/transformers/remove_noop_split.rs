use crate::error::GraphResult;
use crate::pattern::{NodeMatch, OpTypePattern};
use crate::proto::GraphDef;
use crate::transform::{Replacement, Rewrite, RewriteContext, TransformFuncContext};
use crate::transformers::common::RewritePolicy;

/// Removes `Split` nodes that produce a single output
///
/// `Split(split_dim, value)` with `num_split == 1` forwards `value`
/// unchanged, so every reference to the split is redirected to the exact
/// edge it consumed.
#[derive(Debug, Default)]
pub struct RemoveNoopSplit;

impl RemoveNoopSplit {
    /// Create a new RemoveNoopSplit transformer
    pub fn new() -> Self {
        Self
    }
}

impl RewritePolicy for RemoveNoopSplit {
    fn name(&self) -> &'static str {
        "remove_noop_split"
    }

    fn pattern(&self) -> OpTypePattern {
        OpTypePattern::with_inputs("Split", vec![OpTypePattern::any(), OpTypePattern::any()])
    }

    fn rewrite(&self, m: &NodeMatch<'_>, ctx: &RewriteContext<'_>) -> GraphResult<Rewrite> {
        let num_split = match m.node.attr_i("num_split") {
            Ok(n) => n,
            Err(_) => return Ok(ctx.reject(m.name(), "num_split attribute missing")),
        };
        if num_split != 1 {
            return Ok(Rewrite::Skip);
        }
        let Some(value) = m.input(1) else {
            return Ok(ctx.reject(m.name(), "split has no value input"));
        };
        Ok(Replacement::new()
            .rename(m.name(), value.reference())
            .into())
    }
}

/// Registered entry point
pub fn remove_noop_split(graph: &GraphDef, context: &TransformFuncContext) -> GraphResult<GraphDef> {
    RemoveNoopSplit::new().run(graph, context).map(|out| out.graph)
}
