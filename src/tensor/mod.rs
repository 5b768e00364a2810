//! Tensor utilities for graph constants
//!
//! This module provides utilities for working with tensor payloads:
//! - Data type mappings (`dtype`)
//! - Shape utilities (`shape`)
//! - Conversion between TensorProto and ndarray (`convert`)
//!
//! # Example
//!
//! ```ignore
//! use graph_transforms::tensor::{tensor_to_array_f32, array_to_tensor_f32};
//!
//! // Read a Const node's payload
//! let weights = tensor_to_array_f32(node.attr_tensor("value")?)?;
//!
//! // NCHW -> NHWC
//! let shuffled = weights.permuted_axes(IxDyn(&[0, 2, 3, 1]));
//!
//! // Write it back with its new shape
//! let tensor = array_to_tensor_f32(&shuffled);
//! ```

pub mod convert;
pub mod dtype;
pub mod shape;

// Re-export commonly used items
pub use convert::{
    array_to_tensor_f32, array_to_tensor_i32, array_to_tensor_i64, tensor_to_array_f32,
    tensor_to_array_i64, vec_to_tensor_f32, vec_to_tensor_i32, MAX_DECODED_ELEMENTS,
};
pub use dtype::{dtype_name, dtype_size, i32_to_dtype, is_float_type, is_int_type};
pub use shape::{element_count, is_dynamic, make_shape, numel, shape_dims, tensor_dims};
