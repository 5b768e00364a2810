//! Tensor conversion utilities
//!
//! Convert between `TensorProto` payloads and ndarray types.
//!
//! A payload stores its elements either packed little-endian in
//! `tensor_content` or in the typed value field for its dtype. Typed fields
//! may hold fewer values than the shape needs; the last value then repeats.

use ndarray::{Array, ArrayD, IxDyn};

use crate::error::{GraphResult, TransformError};
use crate::proto::{DataType, TensorProto};

use super::dtype::{dtype_size, i32_to_dtype};
use super::shape::{element_count, make_shape, tensor_dims};

/// Largest element count a payload is decoded to
pub const MAX_DECODED_ELEMENTS: usize = 1 << 26;

/// Convert TensorProto to f32 ndarray
pub fn tensor_to_array_f32(tensor: &TensorProto) -> GraphResult<ArrayD<f32>> {
    let dtype = i32_to_dtype(tensor.dtype)?;
    let shape = tensor_dims(tensor)?;
    let expected_len = decoded_len(&shape)?;

    let data: Vec<f32> = if !tensor.tensor_content.is_empty() {
        decode_content_to_f32(&tensor.tensor_content, dtype, expected_len)?
    } else {
        let values: Vec<f32> = match dtype {
            DataType::DtFloat => tensor.float_val.clone(),
            DataType::DtDouble => tensor.double_val.iter().map(|&v| v as f32).collect(),
            DataType::DtInt32 | DataType::DtInt16 | DataType::DtInt8 | DataType::DtUint8 => {
                tensor.int_val.iter().map(|&v| v as f32).collect()
            }
            DataType::DtInt64 => tensor.int64_val.iter().map(|&v| v as f32).collect(),
            _ => return Err(TransformError::InvalidDataType(tensor.dtype)),
        };
        fill_to_shape(values, expected_len)?
    };

    Array::from_shape_vec(IxDyn(&shape), data).map_err(|e| TransformError::Internal(e.to_string()))
}

/// Convert TensorProto to i64 ndarray
pub fn tensor_to_array_i64(tensor: &TensorProto) -> GraphResult<ArrayD<i64>> {
    let dtype = i32_to_dtype(tensor.dtype)?;
    let shape = tensor_dims(tensor)?;
    let expected_len = decoded_len(&shape)?;

    let data: Vec<i64> = if !tensor.tensor_content.is_empty() {
        decode_content_to_i64(&tensor.tensor_content, dtype, expected_len)?
    } else {
        let values: Vec<i64> = match dtype {
            DataType::DtInt64 => tensor.int64_val.clone(),
            DataType::DtInt32 | DataType::DtInt16 | DataType::DtInt8 | DataType::DtUint8 => {
                tensor.int_val.iter().map(|&v| v as i64).collect()
            }
            _ => return Err(TransformError::InvalidDataType(tensor.dtype)),
        };
        fill_to_shape(values, expected_len)?
    };

    Array::from_shape_vec(IxDyn(&shape), data).map_err(|e| TransformError::Internal(e.to_string()))
}

/// Create float TensorProto from an array
pub fn array_to_tensor_f32(array: &ArrayD<f32>) -> TensorProto {
    TensorProto {
        dtype: DataType::DtFloat as i32,
        tensor_shape: Some(make_shape(array.shape())),
        tensor_content: array.iter().flat_map(|v| v.to_le_bytes()).collect(),
        ..Default::default()
    }
}

/// Create int32 TensorProto from an array
pub fn array_to_tensor_i32(array: &ArrayD<i32>) -> TensorProto {
    TensorProto {
        dtype: DataType::DtInt32 as i32,
        tensor_shape: Some(make_shape(array.shape())),
        tensor_content: array.iter().flat_map(|v| v.to_le_bytes()).collect(),
        ..Default::default()
    }
}

/// Create int64 TensorProto from an array
pub fn array_to_tensor_i64(array: &ArrayD<i64>) -> TensorProto {
    TensorProto {
        dtype: DataType::DtInt64 as i32,
        tensor_shape: Some(make_shape(array.shape())),
        tensor_content: array.iter().flat_map(|v| v.to_le_bytes()).collect(),
        ..Default::default()
    }
}

/// Create 1D int32 TensorProto from a slice
pub fn vec_to_tensor_i32(data: &[i32]) -> TensorProto {
    TensorProto {
        dtype: DataType::DtInt32 as i32,
        tensor_shape: Some(make_shape(&[data.len()])),
        int_val: data.to_vec(),
        ..Default::default()
    }
}

/// Create a tensor of `dims` with typed float values
pub fn vec_to_tensor_f32(data: &[f32], dims: &[usize]) -> TensorProto {
    TensorProto {
        dtype: DataType::DtFloat as i32,
        tensor_shape: Some(make_shape(dims)),
        float_val: data.to_vec(),
        ..Default::default()
    }
}

// ============================================================================
// Internal helpers
// ============================================================================

fn decoded_len(shape: &[usize]) -> GraphResult<usize> {
    let len = element_count(shape)?;
    if len > MAX_DECODED_ELEMENTS {
        return Err(TransformError::ShapeMismatch(format!(
            "tensor of {} elements exceeds the decode limit of {}",
            len, MAX_DECODED_ELEMENTS
        )));
    }
    Ok(len)
}

fn fill_to_shape<T: Copy + Default>(mut values: Vec<T>, expected: usize) -> GraphResult<Vec<T>> {
    if values.len() > expected {
        return Err(TransformError::ShapeMismatch(format!(
            "{} values for a shape of {} elements",
            values.len(),
            expected
        )));
    }
    let fill = values.last().copied().unwrap_or_default();
    values.resize(expected, fill);
    Ok(values)
}

fn check_content_len(content: &[u8], dtype: DataType, expected: usize) -> GraphResult<()> {
    let elem_size = dtype_size(dtype)?;
    if expected.checked_mul(elem_size) != Some(content.len()) {
        return Err(TransformError::ShapeMismatch(format!(
            "tensor content size {} does not match expected {} * {}",
            content.len(),
            expected,
            elem_size
        )));
    }
    Ok(())
}

fn decode_content_to_f32(content: &[u8], dtype: DataType, expected: usize) -> GraphResult<Vec<f32>> {
    check_content_len(content, dtype, expected)?;

    match dtype {
        DataType::DtFloat => Ok(content
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        DataType::DtDouble => Ok(content
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect()),
        DataType::DtInt32 => Ok(content
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32)
            .collect()),
        DataType::DtInt64 => Ok(content
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect()),
        DataType::DtUint8 => Ok(content.iter().map(|&b| b as f32).collect()),
        DataType::DtInt8 => Ok(content.iter().map(|&b| b as i8 as f32).collect()),
        _ => Err(TransformError::InvalidDataType(dtype as i32)),
    }
}

fn decode_content_to_i64(content: &[u8], dtype: DataType, expected: usize) -> GraphResult<Vec<i64>> {
    check_content_len(content, dtype, expected)?;

    match dtype {
        DataType::DtInt64 => Ok(content
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect()),
        DataType::DtInt32 => Ok(content
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64)
            .collect()),
        DataType::DtInt16 => Ok(content
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as i64)
            .collect()),
        DataType::DtUint8 => Ok(content.iter().map(|&b| b as i64).collect()),
        DataType::DtInt8 => Ok(content.iter().map(|&b| b as i8 as i64).collect()),
        _ => Err(TransformError::InvalidDataType(dtype as i32)),
    }
}
