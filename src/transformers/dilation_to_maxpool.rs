use crate::error::GraphResult;
use crate::pattern::{NodeMatch, OpTypePattern};
use crate::proto::{AttrValue, GraphDef, NodeDef};
use crate::tensor::tensor_dims;
use crate::transform::{Replacement, Rewrite, RewriteContext, TransformFuncContext};
use crate::transformers::common::{carry_control_inputs, const_tensor, RewritePolicy};

/// Window used when the filter shape is not known
const DEFAULT_KSIZE: [i64; 4] = [1, 2, 2, 1];

/// Replaces `Dilation2D` with `MaxPool`
///
/// The pool keeps the dilation's name and device so no reference needs to
/// move. When the filter is a constant the window covers the filter's
/// dilated extent, `(f - 1) * rate + 1` per spatial axis; the filter values
/// themselves are dropped, which makes this an approximation rather than
/// an exact rewrite.
#[derive(Debug, Default)]
pub struct Dilation2DToMaxPool2D;

impl Dilation2DToMaxPool2D {
    /// Create a new Dilation2DToMaxPool2D transformer
    pub fn new() -> Self {
        Self
    }

    /// Spatial rates `[rate_height, rate_width]`; `None` when malformed
    fn rates(dilation: &NodeDef) -> Option<[i64; 2]> {
        if !dilation.has_attr("rates") {
            return Some([1, 1]);
        }
        match *dilation.attr_list_i("rates").ok()? {
            [1, height, width, 1] if height >= 1 && width >= 1 => Some([height, width]),
            _ => None,
        }
    }

    fn ksize(filter: &NodeDef, rates: [i64; 2]) -> Vec<i64> {
        let dims = const_tensor(filter).and_then(|t| tensor_dims(t).ok());
        let extent = |size: usize, rate: i64| {
            (size as i64 - 1).saturating_mul(rate).saturating_add(1)
        };
        match dims.as_deref() {
            Some(&[height, width, _depth]) if height > 0 && width > 0 => vec![
                1,
                extent(height, rates[0]),
                extent(width, rates[1]),
                1,
            ],
            _ => DEFAULT_KSIZE.to_vec(),
        }
    }
}

impl RewritePolicy for Dilation2DToMaxPool2D {
    fn name(&self) -> &'static str {
        "dilation2d_to_maxpool2d"
    }

    fn pattern(&self) -> OpTypePattern {
        OpTypePattern::with_inputs("Dilation2D", vec![OpTypePattern::any(), OpTypePattern::any()])
    }

    fn rewrite(&self, m: &NodeMatch<'_>, ctx: &RewriteContext<'_>) -> GraphResult<Rewrite> {
        let (Some(input), Some(filter)) = (m.input(0), m.input(1)) else {
            return Ok(Rewrite::Skip);
        };
        let dilation = m.node;
        let Some(rates) = Self::rates(dilation) else {
            return Ok(ctx.reject(m.name(), "rates must be [1, rh, rw, 1] with positive rates"));
        };

        let mut pool = NodeDef {
            name: dilation.name.clone(),
            op: "MaxPool".to_string(),
            device: dilation.device.clone(),
            input: vec![input.reference().to_string()],
            experimental_debug_info: dilation.experimental_debug_info.clone(),
            ..Default::default()
        };
        carry_control_inputs(&mut pool, [dilation]);

        pool.set_attr("ksize", AttrValue::list_i(Self::ksize(filter.node, rates)));
        for attr in ["T", "strides", "padding", "use_cudnn_on_gpu"] {
            pool.copy_attr(dilation, attr, attr);
        }

        Ok(Replacement::new().node(pool).into())
    }
}

/// Registered entry point
pub fn dilation2d_to_maxpool2d(
    graph: &GraphDef,
    context: &TransformFuncContext,
) -> GraphResult<GraphDef> {
    Dilation2DToMaxPool2D::new()
        .run(graph, context)
        .map(|out| out.graph)
}
