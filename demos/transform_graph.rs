//! Example: apply a transform list to a GraphDef file
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --example transform_graph -- \
//!     --in_graph=frozen.pb --out_graph=transformed.pb \
//!     --inputs=input --outputs=logits \
//!     --transforms="remove_noop_split fold_transposed_pads"
//! ```

use std::env;

use tracing_subscriber::EnvFilter;

use graph_transforms::io::{get_graph_info, load_graph};
use graph_transforms::prelude::*;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} --in_graph=<file> --out_graph=<file> --transforms=<list> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --inputs=a,b       Declared graph inputs");
    eprintln!("  --outputs=c,d      Declared graph outputs");
    eprintln!("  --iterations=N     Repeat the list until the graph settles (max N passes)");
    eprintln!("  --info             Show graph info only, don't transform");
    eprintln!();
    eprintln!("Transforms:");
    for name in graph_transforms::transform::global_registry().names() {
        eprintln!("  {}", name);
    }
    std::process::exit(1);
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn main() -> GraphResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("transform_graph");

    let mut in_graph = None;
    let mut out_graph = None;
    let mut info_only = false;
    let mut options = TransformFileOptions::default();

    for arg in args.iter().skip(1) {
        if arg == "--info" {
            info_only = true;
            continue;
        }
        let Some((flag, value)) = arg.split_once('=') else {
            usage(program);
        };
        match flag {
            "--in_graph" => in_graph = Some(value.to_string()),
            "--out_graph" => out_graph = Some(value.to_string()),
            "--inputs" => options.inputs = split_list(value),
            "--outputs" => options.outputs = split_list(value),
            "--transforms" => options.transforms = value.to_string(),
            "--iterations" => {
                options.iterations = value
                    .parse()
                    .map_err(|_| TransformError::InvalidParameter(format!("bad --iterations '{}'", value)))?;
            }
            _ => usage(program),
        }
    }

    let Some(in_graph) = in_graph else {
        usage(program);
    };

    if info_only {
        let info = get_graph_info(&load_graph(&in_graph)?);
        println!("Graph Information:");
        println!("  Nodes: {}", info.node_count);
        if let Some(producer) = info.producer {
            println!("  Producer: {}", producer);
        }
        for (op, count) in &info.op_counts {
            println!("  {:<24} {}", op, count);
        }
        return Ok(());
    }

    let Some(out_graph) = out_graph else {
        usage(program);
    };

    let stats = transform_file(&in_graph, &out_graph, &options)?;

    println!("Transform Results:");
    println!("  Passes: {}", stats.pipeline.passes);
    println!("  Transforms run: {}", stats.pipeline.transforms_run);
    println!(
        "  Nodes: {} -> {} ({:.1}% reduction)",
        stats.original_nodes,
        stats.transformed_nodes,
        stats.node_reduction_percent()
    );
    println!(
        "  Size: {} -> {} bytes",
        stats.original_size, stats.transformed_size
    );

    Ok(())
}
