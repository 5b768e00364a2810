//! Benchmark for transformation operations
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use graph_transforms::graph::GraphContext;
use graph_transforms::pattern::{GraphMatcher, OpTypePattern};
use graph_transforms::proto::extensions::{make_const_node, make_node};
use graph_transforms::proto::{AttrValue, GraphDef};
use graph_transforms::tensor::vec_to_tensor_i32;
use graph_transforms::transform::TransformFuncContext;
use graph_transforms::transformers::remove_noop_split;

/// `x -> split_0 -> ... -> split_{n-1} -> y`, every split a no-op
fn split_chain(len: usize) -> GraphDef {
    let mut node = vec![
        make_node("Placeholder", &[], "x"),
        make_const_node("dim", vec_to_tensor_i32(&[0])),
    ];
    let mut prev = "x".to_string();
    for i in 0..len {
        let name = format!("split_{}", i);
        let mut split = make_node("Split", &["dim", prev.as_str()], &name);
        split.set_attr("num_split", AttrValue::int(1));
        node.push(split);
        prev = name;
    }
    node.push(make_node("Relu", &[prev.as_str()], "y"));
    GraphDef {
        node,
        ..Default::default()
    }
}

fn transform_benchmark(c: &mut Criterion) {
    let context = TransformFuncContext::new(["x"], ["y"]);
    let mut group = c.benchmark_group("remove_noop_split");
    for len in [10, 100, 1000] {
        let graph = split_chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &graph, |b, graph| {
            b.iter(|| remove_noop_split(black_box(graph), &context))
        });
    }
    group.finish();
}

fn match_benchmark(c: &mut Criterion) {
    let graph = split_chain(1000);
    let pattern: OpTypePattern = "Split(*, *)".parse().expect("valid pattern");
    c.bench_function("find_matches_1000", |b| {
        b.iter(|| {
            let ctx = GraphContext::new(black_box(&graph)).expect("well-formed graph");
            GraphMatcher::new(&ctx).find_matches(&pattern).len()
        })
    });
}

criterion_group!(benches, transform_benchmark, match_benchmark);
criterion_main!(benches);
