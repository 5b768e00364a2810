//! Pattern matching module for dataflow graph rewrites
//!
//! Patterns are nested op-type templates matched top-down from a candidate
//! root node.
//!
//! # Overview
//!
//! The pattern matching system works by:
//! 1. Defining patterns as trees of op types (`*` matches anything)
//! 2. Matching the root op, then each child against the producer of the
//!    corresponding data input
//! 3. Leaving attribute checks to the rewrite policy that receives the match
//!
//! # Example
//!
//! ```ignore
//! use graph_transforms::pattern::{GraphMatcher, OpTypePattern};
//!
//! let pattern: OpTypePattern = "Relu(Transpose(*, Const))".parse()?;
//! let matcher = GraphMatcher::new(&ctx);
//!
//! for m in matcher.find_matches(&pattern) {
//!     // m.node = Relu, m.inputs[0].node = Transpose
//!     println!("Found swappable pair: {}", m.debug_string());
//! }
//! ```

pub mod matcher;
pub mod op_type;

// Re-export main types
pub use matcher::{GraphMatcher, NodeMatch};
pub use op_type::{OpTypePattern, WILDCARD};
