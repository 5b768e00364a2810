//! Common utilities for transformers
//!
//! Shared helper functions and the policy trait every built-in transform
//! implements.

use tracing::debug;

use crate::error::GraphResult;
use crate::graph::TensorRef;
use crate::pattern::{NodeMatch, OpTypePattern};
use crate::proto::{GraphDef, NodeDef, TensorProto};
use crate::tensor::tensor_to_array_i64;
use crate::transform::{Rewrite, RewriteContext, RewriteEngine, RewriteOutput, TransformFuncContext};

/// Permutation from NHWC to NCHW
pub const NHWC_TO_NCHW: [i64; 4] = [0, 3, 1, 2];

/// Permutation from NCHW to NHWC
pub const NCHW_TO_NHWC: [i64; 4] = [0, 2, 3, 1];

/// A pattern plus the policy that decides each of its matches
pub trait RewritePolicy {
    /// Registered transform name
    fn name(&self) -> &'static str;

    /// Pattern the engine matches
    fn pattern(&self) -> OpTypePattern;

    /// Validate a structural match and produce its replacement
    fn rewrite(&self, m: &NodeMatch<'_>, ctx: &RewriteContext<'_>) -> GraphResult<Rewrite>;

    /// Run the policy over `graph`
    fn run(&self, graph: &GraphDef, context: &TransformFuncContext) -> GraphResult<RewriteOutput> {
        let required = context.required_names();
        let pattern = self.pattern();
        let output = RewriteEngine::new(&pattern, &required)
            .with_label(self.name())
            .run(graph, |m, ctx| self.rewrite(m, ctx))?;
        debug!(transform = self.name(), stats = %output.stats, "transform done");
        Ok(output)
    }
}

/// Tensor payload of a `Const` node
pub fn const_tensor(node: &NodeDef) -> Option<&TensorProto> {
    if !node.is_op("Const") {
        return None;
    }
    node.attr_tensor("value").ok()
}

/// Integer contents of a `Const` node, flattened
pub fn const_values_i64(node: &NodeDef) -> Option<Vec<i64>> {
    let tensor = const_tensor(node)?;
    tensor_to_array_i64(tensor)
        .ok()
        .map(|array| array.iter().copied().collect())
}

/// Check whether a `Const` node holds exactly `expected`
pub fn is_permutation(node: &NodeDef, expected: &[i64]) -> bool {
    const_values_i64(node).is_some_and(|values| values == expected)
}

/// Replace the `index`-th data input of `node`, leaving control inputs alone
///
/// Returns false if the node has no such data input.
pub fn set_data_input(node: &mut NodeDef, index: usize, reference: &TensorRef) -> bool {
    let slot = node
        .input
        .iter_mut()
        .filter(|input| !input.starts_with('^'))
        .nth(index);
    match slot {
        Some(input) => {
            *input = reference.to_string();
            true
        }
        None => false,
    }
}

/// Remove `^name` from the inputs of `node`
///
/// Used when `node` moves in front of `name`, where the edge would close a
/// cycle.
pub fn drop_control_input(node: &mut NodeDef, name: &str) {
    let control = TensorRef::control(name).to_string();
    node.input.retain(|input| *input != control);
}

/// Append the control inputs of `sources` to `node`, skipping duplicates
pub fn carry_control_inputs<'a, I>(node: &mut NodeDef, sources: I)
where
    I: IntoIterator<Item = &'a NodeDef>,
{
    for source in sources {
        for control in source.control_inputs() {
            if !node.input.contains(control) {
                node.input.push(control.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::extensions::{make_const_node, make_node};
    use crate::tensor::vec_to_tensor_i32;

    #[test]
    fn test_is_permutation() {
        let perm = make_const_node("perm", vec_to_tensor_i32(&[0, 3, 1, 2]));
        assert!(is_permutation(&perm, &NHWC_TO_NCHW));
        assert!(!is_permutation(&perm, &NCHW_TO_NHWC));

        let not_const = make_node("Placeholder", &[], "p");
        assert!(!is_permutation(&not_const, &NHWC_TO_NCHW));
    }

    #[test]
    fn test_set_data_input_skips_controls() {
        let mut node = make_node("Relu", &["^c", "a"], "relu");
        assert!(set_data_input(&mut node, 0, &TensorRef::output("b", 2)));
        assert_eq!(node.input, vec!["^c", "b:2"]);
        assert!(!set_data_input(&mut node, 1, &TensorRef::output("b", 0)));
    }

    #[test]
    fn test_drop_control_input() {
        let mut node = make_node("Relu", &["t", "^t", "^c"], "relu");
        drop_control_input(&mut node, "t");
        assert_eq!(node.input, vec!["t", "^c"]);
    }

    #[test]
    fn test_carry_control_inputs() {
        let mut node = make_node("Pad", &["x", "^a"], "pad");
        let other = make_node("Transpose", &["pad", "^a", "^b"], "t");
        carry_control_inputs(&mut node, [&other]);
        assert_eq!(node.input, vec!["x", "^a", "^b"]);
    }
}
