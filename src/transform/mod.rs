//! Graph transformation module
//!
//! This module provides the rewrite infrastructure every transform uses:
//!
//! - [`RewriteEngine`]: match, validate, rebuild, rename
//! - [`rebuild`]: reassembly of the output graph from replacement fragments
//! - [`rename`]: global renaming of references to removed nodes
//! - [`registry`]: name → transform function map
//! - [`TransformFuncContext`]: declared names and parameters of one call
//!
//! # Overview
//!
//! A transform is a pure function from graph to graph. The typical
//! workflow inside one is:
//!
//! 1. Compute the required names from the context
//! 2. Run the engine with a pattern and a rewrite policy
//! 3. Return the rebuilt graph
//!
//! # Example
//!
//! ```ignore
//! use graph_transforms::pattern::OpTypePattern;
//! use graph_transforms::transform::{replace_matching_op_types, Replacement, Rewrite};
//!
//! let pattern: OpTypePattern = "Identity(*)".parse()?;
//! let out = replace_matching_op_types(&graph, &pattern, &required, |m, ctx| {
//!     let target = m.inputs[0].reference();
//!     Ok(Replacement::new().rename(m.name(), target).into())
//! })?;
//! ```

pub mod context;
pub mod core;
pub mod params;
pub mod rebuild;
pub mod registry;
pub mod rename;

// Re-export main types and functions
pub use context::TransformFuncContext;
pub use self::core::{
    replace_matching_op_types, Replacement, Rewrite, RewriteContext, RewriteEngine,
    RewriteOutput, TransformStats,
};
pub use params::{parse_transform_list, TransformList, TransformParameters};
pub use rebuild::GraphRebuilder;
pub use registry::{apply_transform, global_registry, TransformFunc, TransformRegistry};
pub use rename::{rename_node_inputs, RenameEntry, RenameMap};
