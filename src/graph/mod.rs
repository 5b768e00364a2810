//! Graph model for dataflow graphs
//!
//! This module provides the read-only infrastructure every transform works
//! against:
//!
//! - [`reference`]: structured form of the `name`, `name:k` and `^name` edges
//! - [`maps`]: type definitions and builders for graph maps
//! - [`GraphContext`]: node, input, and consumer lookups over a borrowed graph
//! - [`validation`]: well-formedness checks for input and output graphs
//!
//! # Example
//!
//! ```ignore
//! use graph_transforms::graph::GraphContext;
//!
//! let ctx = GraphContext::new(&graph)?;
//!
//! for reference in ctx.data_inputs("relu") {
//!     println!("{} reads {}", "relu", reference);
//! }
//!
//! if ctx.is_single_consumer("transpose") {
//!     // Safe to move...
//! }
//! ```
//!
//! # Maps
//!
//! | Map | Description |
//! |-----|-------------|
//! | `node_map` | node name → position (order preserved) |
//! | `input_refs` | position → parsed input references |
//! | `consumer_map` | node name → consumer node names |

pub mod context;
pub mod maps;
pub mod reference;
pub mod validation;

// Re-export main types
pub use context::GraphContext;
pub use maps::{build_required_names, ConsumerMap, NodeMap, RequiredNames};
pub use reference::{node_name_from_input, RefKind, TensorRef};
pub use validation::{
    check_graph, find_dangling_references, validate_declared_names, validate_graph, ValidationResult,
};
