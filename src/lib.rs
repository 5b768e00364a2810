//! # Graph Transforms
//!
//! Pattern-driven rewrites for dataflow computation graphs.
//!
//! This crate matches nested op-type patterns against a `GraphDef`, lets a
//! per-transform policy decide each match, rebuilds the graph and renames
//! every reference to removed nodes in one pass.
//!
//! ## Features
//!
//! - **Pattern Matching**: Top-down structural matching with wildcards
//! - **Rewrite Engine**: Protected names, overlap checks, rename resolution
//! - **Built-in Transforms**: No-op removal and layout rewrites
//!
//! ## Example
//!
//! ```ignore
//! use graph_transforms::prelude::*;
//!
//! let graph = load_graph("frozen.pb")?;
//! let out = transform_graph(&graph, &["input"], &["logits"], "remove_noop_split")?;
//! save_graph(&out, "transformed.pb")?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

pub mod error;
pub mod graph;
pub mod io;
pub mod pattern;
pub mod proto;
pub mod tensor;
pub mod transform;
pub mod transformers;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use graph_transforms::prelude::*`
pub mod prelude {
    pub use crate::error::{GraphResult, TransformError};
    pub use crate::graph::{GraphContext, TensorRef};
    pub use crate::io::{load_graph, save_graph, transform_file, TransformFileOptions};
    pub use crate::pattern::{GraphMatcher, NodeMatch, OpTypePattern};
    pub use crate::proto::{AttrValue, DataType, GraphDef, NodeDef, TensorProto};
    pub use crate::transform::{
        apply_transform, replace_matching_op_types, Replacement, Rewrite, RewriteContext,
        TransformFuncContext,
    };
    pub use crate::transformers::{transform_graph, RewritePolicy, TransformPipeline};
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{GraphResult, TransformError};

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
