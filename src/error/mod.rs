//! Error types for graph-transforms
//!
//! This module defines all error types used throughout the crate.
//!
//! Structural mismatches never surface here: the matcher reports them as
//! `None`. Policy rejections are `Rewrite::Skip`. What remains are fatal
//! conditions that abort a transform.

use thiserror::Error;

/// Main error type for graph transformation operations
#[derive(Error, Debug)]
pub enum TransformError {
    /// The input graph is broken before any transform runs
    #[error("Malformed input graph: {0}")]
    InputMalformed(String),

    /// A rewrite produced an inconsistent graph (engine or policy defect)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A reference string that can not be parsed
    #[error("Malformed reference '{0}'")]
    MalformedReference(String),

    /// Attribute exists but holds a different variant
    #[error("Attribute '{attr}' has type {found}, expected {expected}")]
    TypeMismatch {
        /// Attribute name
        attr: String,
        /// Requested variant
        expected: &'static str,
        /// Stored variant
        found: &'static str,
    },

    /// Attribute missing from a node
    #[error("Attribute '{attr}' not found on node '{node}'")]
    AttrNotFound {
        /// Node name
        node: String,
        /// Attribute name
        attr: String,
    },

    /// Pattern text could not be parsed
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Transform parameter is missing, repeated or unparsable
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No transform registered under this name
    #[error("Unknown transform: {0}")]
    UnknownTransform(String),

    /// A named transform failed
    #[error("Transform '{transform}' failed: {source}")]
    TransformFailed {
        /// Name of the transform that failed
        transform: String,
        /// Underlying error
        #[source]
        source: Box<TransformError>,
    },

    /// Invalid tensor data type
    #[error("Invalid data type: {0}")]
    InvalidDataType(i32),

    /// Tensor payload does not agree with its shape
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protobuf decode error
    #[error("Protobuf decode error: {0}")]
    ProtoDecode(#[from] prost::DecodeError),

    /// Protobuf encode error
    #[error("Protobuf encode error: {0}")]
    ProtoEncode(#[from] prost::EncodeError),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransformError {
    /// Wrap this error with the name of the transform that produced it
    pub fn in_transform(self, transform: &str) -> Self {
        match self {
            err @ TransformError::TransformFailed { .. } => err,
            err => TransformError::TransformFailed {
                transform: transform.to_string(),
                source: Box::new(err),
            },
        }
    }

    /// True for errors that indicate a defect in the engine or a policy
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            TransformError::InvariantViolation(_) => true,
            TransformError::TransformFailed { source, .. } => source.is_invariant_violation(),
            _ => false,
        }
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, TransformError>;
