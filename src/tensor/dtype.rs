//! Tensor data type mappings
//!
//! Maps between `DataType` tags and element sizes and names.

use crate::error::{GraphResult, TransformError};
use crate::proto::DataType;

/// Size in bytes of one element
pub fn dtype_size(dtype: DataType) -> GraphResult<usize> {
    match dtype {
        DataType::DtFloat => Ok(4),
        DataType::DtDouble => Ok(8),
        DataType::DtInt32 => Ok(4),
        DataType::DtUint8 => Ok(1),
        DataType::DtInt16 => Ok(2),
        DataType::DtInt8 => Ok(1),
        DataType::DtComplex64 => Ok(8),
        DataType::DtInt64 => Ok(8),
        DataType::DtBool => Ok(1),
        DataType::DtBfloat16 => Ok(2),
        DataType::DtUint16 => Ok(2),
        DataType::DtHalf => Ok(2),
        DataType::DtUint32 => Ok(4),
        DataType::DtUint64 => Ok(8),
        DataType::DtString | DataType::DtInvalid => Err(TransformError::InvalidDataType(dtype as i32)),
    }
}

/// Convert i32 to DataType enum
pub fn i32_to_dtype(value: i32) -> GraphResult<DataType> {
    DataType::try_from(value).map_err(|_| TransformError::InvalidDataType(value))
}

/// Short lowercase name, as used in diagnostics
pub fn dtype_name(dtype: DataType) -> &'static str {
    match dtype {
        DataType::DtInvalid => "invalid",
        DataType::DtFloat => "float",
        DataType::DtDouble => "double",
        DataType::DtInt32 => "int32",
        DataType::DtUint8 => "uint8",
        DataType::DtInt16 => "int16",
        DataType::DtInt8 => "int8",
        DataType::DtString => "string",
        DataType::DtComplex64 => "complex64",
        DataType::DtInt64 => "int64",
        DataType::DtBool => "bool",
        DataType::DtBfloat16 => "bfloat16",
        DataType::DtUint16 => "uint16",
        DataType::DtHalf => "half",
        DataType::DtUint32 => "uint32",
        DataType::DtUint64 => "uint64",
    }
}

/// Check if data type is floating point
pub fn is_float_type(dtype: DataType) -> bool {
    matches!(
        dtype,
        DataType::DtFloat | DataType::DtDouble | DataType::DtHalf | DataType::DtBfloat16
    )
}

/// Check if data type is integer
pub fn is_int_type(dtype: DataType) -> bool {
    matches!(
        dtype,
        DataType::DtInt8
            | DataType::DtInt16
            | DataType::DtInt32
            | DataType::DtInt64
            | DataType::DtUint8
            | DataType::DtUint16
            | DataType::DtUint32
            | DataType::DtUint64
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(dtype_size(DataType::DtFloat).unwrap(), 4);
        assert_eq!(dtype_size(DataType::DtInt64).unwrap(), 8);
        assert_eq!(dtype_size(DataType::DtUint8).unwrap(), 1);
        assert!(dtype_size(DataType::DtString).is_err());
    }

    #[test]
    fn test_i32_to_dtype() {
        assert_eq!(i32_to_dtype(1).unwrap(), DataType::DtFloat);
        assert_eq!(i32_to_dtype(9).unwrap(), DataType::DtInt64);
        assert!(i32_to_dtype(999).is_err());
    }

    #[test]
    fn test_type_classes() {
        assert!(is_float_type(DataType::DtHalf));
        assert!(!is_float_type(DataType::DtInt32));
        assert!(is_int_type(DataType::DtUint8));
        assert!(!is_int_type(DataType::DtBool));
        assert_eq!(dtype_name(DataType::DtInt32), "int32");
    }
}
