//! Graph-level properties every transform run must keep
//!
//! Random layer chains with side branches, control edges and declared
//! outputs are pushed through every built-in transform, one at a time and
//! as a repeated pipeline.

use std::collections::BTreeSet;

use proptest::prelude::*;

use graph_transforms::graph::find_dangling_references;
use graph_transforms::proto::extensions::{make_const_node, make_node};
use graph_transforms::proto::{AttrValue, DataType, GraphDef, NodeDef, TensorProto};
use graph_transforms::tensor::{make_shape, vec_to_tensor_f32, vec_to_tensor_i32};
use graph_transforms::transform::{TransformFunc, TransformFuncContext};
use graph_transforms::transformers::{
    dilation2d_to_maxpool2d, fold_transposed_pads, remove_noop_padv2, remove_noop_split,
    swap_trans_mul_add, swap_trans_relu, Dilation2DToMaxPool2D, FoldTransposedPads,
    RemoveNoopPadV2, RemoveNoopSplit, RewritePolicy, SwapTransMulAdd, SwapTransRelu,
    TransformPipeline,
};

const TRANSFORMS: [(&str, TransformFunc); 6] = [
    ("remove_noop_split", remove_noop_split),
    ("remove_noop_padv2", remove_noop_padv2),
    ("dilation2d_to_maxpool2d", dilation2d_to_maxpool2d),
    ("fold_transposed_pads", fold_transposed_pads),
    ("swap_trans_relu", swap_trans_relu),
    ("swap_trans_mul_add", swap_trans_mul_add),
];

fn policies() -> Vec<Box<dyn RewritePolicy>> {
    vec![
        Box::new(RemoveNoopSplit::new()),
        Box::new(RemoveNoopPadV2::new()),
        Box::new(Dilation2DToMaxPool2D::new()),
        Box::new(FoldTransposedPads::new()),
        Box::new(SwapTransRelu::new()),
        Box::new(SwapTransMulAdd::new()),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Layer {
    NoopSplit,
    RealSplit,
    Relu,
    Transpose,
    /// Transpose, Pad, Transpose with cancelling permutations
    Sandwich,
    /// Transpose, Mul, Add with rank-4 float constants
    MulAdd,
    /// PadV2 with all-zero paddings
    ZeroPadV2,
    Dilation,
}

#[derive(Debug, Clone, Copy)]
struct Step {
    layer: Layer,
    control: bool,
    side: bool,
    declared: bool,
}

fn layer() -> impl Strategy<Value = Layer> {
    prop_oneof![
        3 => Just(Layer::NoopSplit),
        1 => Just(Layer::RealSplit),
        2 => Just(Layer::Relu),
        2 => Just(Layer::Transpose),
        2 => Just(Layer::Sandwich),
        2 => Just(Layer::MulAdd),
        2 => Just(Layer::ZeroPadV2),
        1 => Just(Layer::Dilation),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    (layer(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(layer, control, side, declared)| Step {
            layer,
            control,
            side,
            declared,
        },
    )
}

fn split(name: &str, input: &str, num_split: i64) -> NodeDef {
    let mut node = make_node("Split", &["dim", input], name);
    node.set_attr("num_split", AttrValue::int(num_split));
    node
}

fn int_const(name: &str, values: &[i32], dims: &[usize]) -> NodeDef {
    let tensor = TensorProto {
        dtype: DataType::DtInt32 as i32,
        tensor_shape: Some(make_shape(dims)),
        int_val: values.to_vec(),
        ..Default::default()
    };
    make_const_node(name, tensor)
}

/// Append the helper nodes of one layer and return its output node
fn layer_nodes(nodes: &mut Vec<NodeDef>, layer: Layer, name: &str, prev: &str) -> NodeDef {
    match layer {
        Layer::NoopSplit => split(name, prev, 1),
        Layer::RealSplit => split(name, prev, 2),
        Layer::Relu => make_node("Relu", &[prev], name),
        Layer::Transpose => {
            let perm = format!("{}_perm", name);
            nodes.push(make_const_node(&perm, vec_to_tensor_i32(&[0, 3, 1, 2])));
            make_node("Transpose", &[prev, perm.as_str()], name)
        }
        Layer::Sandwich => {
            let (perm_in, inner) = (format!("{}_perm_in", name), format!("{}_in", name));
            let (paddings, pad) = (format!("{}_paddings", name), format!("{}_pad", name));
            let perm_out = format!("{}_perm_out", name);
            nodes.push(make_const_node(&perm_in, vec_to_tensor_i32(&[0, 3, 1, 2])));
            nodes.push(make_node("Transpose", &[prev, perm_in.as_str()], &inner));
            nodes.push(int_const(&paddings, &[0, 0, 1, 1, 2, 2, 0, 0], &[4, 2]));
            nodes.push(make_node("Pad", &[inner.as_str(), paddings.as_str()], &pad));
            nodes.push(make_const_node(&perm_out, vec_to_tensor_i32(&[0, 2, 3, 1])));
            make_node("Transpose", &[pad.as_str(), perm_out.as_str()], name)
        }
        Layer::MulAdd => {
            let (perm, transpose) = (format!("{}_perm", name), format!("{}_t", name));
            let (weights, mul) = (format!("{}_w", name), format!("{}_mul", name));
            let bias = format!("{}_b", name);
            nodes.push(make_const_node(&perm, vec_to_tensor_i32(&[0, 3, 1, 2])));
            nodes.push(make_node("Transpose", &[prev, perm.as_str()], &transpose));
            nodes.push(make_const_node(&weights, vec_to_tensor_f32(&[2.0, 3.0], &[1, 2, 1, 1])));
            nodes.push(make_node("Mul", &[transpose.as_str(), weights.as_str()], &mul));
            nodes.push(make_const_node(&bias, vec_to_tensor_f32(&[0.5, 1.5], &[1, 2, 1, 1])));
            make_node("Add", &[mul.as_str(), bias.as_str()], name)
        }
        Layer::ZeroPadV2 => {
            let (paddings, value) = (format!("{}_paddings", name), format!("{}_value", name));
            nodes.push(int_const(&paddings, &[0], &[2, 2]));
            nodes.push(make_const_node(&value, vec_to_tensor_f32(&[0.0], &[])));
            make_node("PadV2", &[prev, paddings.as_str(), value.as_str()], name)
        }
        Layer::Dilation => {
            let filter = format!("{}_filter", name);
            nodes.push(make_const_node(&filter, vec_to_tensor_f32(&[0.0], &[2, 2, 1])));
            let mut node = make_node("Dilation2D", &[prev, filter.as_str()], name);
            node.set_attr("strides", AttrValue::list_i(vec![1, 1, 1, 1]));
            node.set_attr("rates", AttrValue::list_i(vec![1, 1, 1, 1]));
            node.set_attr("padding", AttrValue::string("SAME"));
            node
        }
    }
}

/// Build the graph and the declared outputs
fn build(steps: &[Step]) -> (GraphDef, Vec<String>) {
    let mut nodes = vec![
        make_node("Placeholder", &[], "x"),
        make_const_node("dim", vec_to_tensor_i32(&[0])),
    ];
    let mut outputs = Vec::new();
    let mut prev = "x".to_string();

    for (i, step) in steps.iter().enumerate() {
        let name = format!("n{}", i);
        let mut node = layer_nodes(&mut nodes, step.layer, &name, &prev);
        if step.control {
            node.input.push(format!("^{}", prev.split(':').next().unwrap_or("x")));
        }
        nodes.push(node);

        if step.side {
            let side = format!("side{}", i);
            nodes.push(make_node("Identity", &[name.as_str(), "^x"], &side));
            if step.declared {
                outputs.push(format!("{}:0", side));
            }
        } else if step.declared {
            outputs.push(name.clone());
        }

        prev = match step.layer {
            Layer::RealSplit => format!("{}:1", name),
            _ => name,
        };
    }

    nodes.push(make_node("Identity", &[prev.as_str()], "y"));
    outputs.push("y".to_string());

    (
        GraphDef {
            node: nodes,
            ..Default::default()
        },
        outputs,
    )
}

fn names(graph: &GraphDef) -> BTreeSet<String> {
    graph.node.iter().map(|n| n.name.clone()).collect()
}

fn base(reference: &str) -> &str {
    let name = reference.strip_prefix('^').unwrap_or(reference);
    name.split(':').next().unwrap_or(name)
}

fn full_pipeline(outputs: &[String]) -> TransformPipeline {
    let list: Vec<&str> = TRANSFORMS.iter().map(|(name, _)| *name).collect();
    TransformPipeline::parse(&list.join(" "))
        .unwrap()
        .with_inputs(["x"])
        .with_outputs(outputs.iter().cloned())
        .with_iterations(4)
}

proptest! {
    #[test]
    fn test_no_dangling_references(steps in prop::collection::vec(step(), 1..24)) {
        let (graph, outputs) = build(&steps);
        let context = TransformFuncContext::new(["x"], outputs.clone());

        for (name, transform) in TRANSFORMS {
            let out = transform(&graph, &context).unwrap();
            let dangling = find_dangling_references(&out);
            prop_assert!(dangling.is_empty(), "{} left {:?}", name, dangling);
        }

        let (out, _) = full_pipeline(&outputs).run(&graph).unwrap();
        prop_assert!(find_dangling_references(&out).is_empty());
    }

    #[test]
    fn test_rename_completeness(steps in prop::collection::vec(step(), 1..24)) {
        let (graph, outputs) = build(&steps);
        let context = TransformFuncContext::new(["x"], outputs);

        for policy in policies() {
            let out = policy.run(&graph, &context).unwrap();
            let live = names(&out.graph);
            let removed: BTreeSet<String> = names(&graph).difference(&live).cloned().collect();
            let gone: BTreeSet<String> =
                out.renames.keys().filter(|k| !live.contains(*k)).cloned().collect();
            prop_assert_eq!(&removed, &gone, "{}", policy.name());

            for (key, entry) in out.renames.iter() {
                if live.contains(key) {
                    prop_assert!(!entry.keep.is_empty(), "{} kept {}", policy.name(), key);
                }
            }
        }
    }

    #[test]
    fn test_noop_removal_is_idempotent(steps in prop::collection::vec(step(), 1..24)) {
        let (graph, outputs) = build(&steps);
        let context = TransformFuncContext::new(["x"], outputs);

        for transform in [remove_noop_split as TransformFunc, remove_noop_padv2] {
            let once = transform(&graph, &context).unwrap();
            let twice = transform(&once, &context).unwrap();
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_required_nodes_survive(steps in prop::collection::vec(step(), 1..24)) {
        let (graph, outputs) = build(&steps);
        let context = TransformFuncContext::new(["x"], outputs.clone());

        let mut results: Vec<(&str, GraphDef)> = TRANSFORMS
            .iter()
            .map(|(name, transform)| (*name, transform(&graph, &context).unwrap()))
            .collect();
        results.push(("pipeline", full_pipeline(&outputs).run(&graph).unwrap().0));

        for (transform, out) in &results {
            for declared in &outputs {
                let name = base(declared);
                let before = graph.node.iter().find(|n| n.name == name).unwrap();
                let after = out.node.iter().find(|n| n.name == name);
                prop_assert!(after.is_some(), "{} removed required node {}", transform, name);
                let after = after.unwrap();
                prop_assert_eq!(&after.op, &before.op);
                prop_assert_eq!(&after.attr, &before.attr);
            }
        }
    }

    #[test]
    fn test_control_edges_stay_control(steps in prop::collection::vec(step(), 1..24)) {
        let (graph, outputs) = build(&steps);
        let context = TransformFuncContext::new(["x"], outputs);

        let out = remove_noop_split(&graph, &context).unwrap();
        let live = names(&out);
        for (before, after) in graph
            .node
            .iter()
            .filter_map(|n| out.node.iter().find(|o| o.name == n.name).map(|o| (n, o)))
        {
            let controls_before = before.input.iter().filter(|i| i.starts_with('^')).count();
            let controls_after: Vec<_> = after.input.iter().filter(|i| i.starts_with('^')).collect();
            prop_assert_eq!(controls_before, controls_after.len());
            for control in controls_after {
                prop_assert!(!control.contains(':'), "indexed control edge {}", control);
                prop_assert!(live.contains(base(control)));
            }
        }
    }
}

#[test]
fn test_split_elision_scenario() {
    let graph = GraphDef {
        node: vec![
            make_node("Placeholder", &[], "X"),
            make_const_node("dim", vec_to_tensor_i32(&[0])),
            split("split", "X", 1),
            make_node("Relu", &["split:0"], "Y"),
        ],
        ..Default::default()
    };
    let out = remove_noop_split(&graph, &TransformFuncContext::new(["X"], ["Y"])).unwrap();

    assert!(out.node.iter().all(|n| n.name != "split"));
    let y = out.node.iter().find(|n| n.name == "Y").unwrap();
    assert_eq!(y.input, vec!["X"]);
}

#[test]
fn test_generated_layers_are_rewritten() {
    let step = |layer| Step {
        layer,
        control: false,
        side: false,
        declared: false,
    };
    let (graph, outputs) = build(&[
        step(Layer::Sandwich),
        step(Layer::MulAdd),
        step(Layer::ZeroPadV2),
        step(Layer::Dilation),
    ]);
    let (out, _) = full_pipeline(&outputs).run(&graph).unwrap();

    let find = |name: &str| out.node.iter().find(|n| n.name == name);
    assert!(find("n0").is_none(), "outer transpose folded into the pad");
    assert_eq!(find("n0_pad").unwrap().input[0], "x");
    assert_eq!(find("n1_t").unwrap().input[0], "n1");
    assert!(find("n2").is_none());
    assert_eq!(find("n3").unwrap().op, "MaxPool");
    assert!(find_dangling_references(&out).is_empty());
}
