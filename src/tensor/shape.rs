//! Shape utilities for tensors
//!
//! Functions for reading and building `TensorShapeProto` values.

use crate::error::{GraphResult, TransformError};
use crate::proto::tensor_shape_proto::Dim;
use crate::proto::{TensorProto, TensorShapeProto};

/// Calculate total number of elements from shape
pub fn numel(shape: &[i64]) -> usize {
    if shape.is_empty() {
        1 // scalar
    } else {
        shape
            .iter()
            .fold(1usize, |acc, &d| acc.saturating_mul(d.max(0) as usize))
    }
}

/// Number of elements in a static shape
///
/// Fails with `ShapeMismatch` when the product does not fit in `usize`.
pub fn element_count(dims: &[usize]) -> GraphResult<usize> {
    dims.iter().try_fold(1usize, |acc, &d| {
        acc.checked_mul(d).ok_or_else(|| {
            TransformError::ShapeMismatch(format!("tensor shape {:?} overflows", dims))
        })
    })
}

/// Check if shape contains unknown dimensions (negative values)
pub fn is_dynamic(shape: &[i64]) -> bool {
    shape.iter().any(|&d| d < 0)
}

/// Dimension sizes of a shape proto; a missing shape is a scalar
pub fn shape_dims(shape: Option<&TensorShapeProto>) -> Vec<i64> {
    shape
        .map(|s| s.dim.iter().map(|d| d.size).collect())
        .unwrap_or_default()
}

/// Static dimensions of a tensor payload
///
/// Fails on unknown rank or unknown dimensions.
pub fn tensor_dims(tensor: &TensorProto) -> GraphResult<Vec<usize>> {
    if tensor.tensor_shape.as_ref().is_some_and(|s| s.unknown_rank) {
        return Err(TransformError::ShapeMismatch(
            "tensor has unknown rank".to_string(),
        ));
    }
    let dims = shape_dims(tensor.tensor_shape.as_ref());
    if is_dynamic(&dims) {
        return Err(TransformError::ShapeMismatch(format!(
            "tensor shape {:?} has unknown dimensions",
            dims
        )));
    }
    Ok(dims.into_iter().map(|d| d as usize).collect())
}

/// Build a shape proto from dimension sizes
pub fn make_shape(dims: &[usize]) -> TensorShapeProto {
    TensorShapeProto {
        dim: dims
            .iter()
            .map(|&size| Dim {
                size: size as i64,
                name: String::new(),
            })
            .collect(),
        unknown_rank: false,
    }
}
