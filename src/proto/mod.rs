//! Graph Protocol Buffer types
//!
//! Wire-compatible subset of the TensorFlow `GraphDef` schema, declared with
//! `prost` derives. Fields the rewrite engine never inspects (the function
//! library, debug info, full type info) are kept as raw encoded messages so
//! that a load, transform, save cycle writes them back unchanged.
//! Additional extension methods are provided in the `extensions` submodule.

use std::collections::BTreeMap;

/// A dataflow graph: an ordered list of nodes
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GraphDef {
    /// Nodes in declaration order
    #[prost(message, repeated, tag = "1")]
    pub node: Vec<NodeDef>,
    /// Encoded `FunctionDefLibrary`
    #[prost(bytes = "vec", optional, tag = "2")]
    pub library: Option<Vec<u8>>,
    /// Deprecated single version number
    #[prost(int32, tag = "3")]
    pub version: i32,
    /// Producer/consumer versioning
    #[prost(message, optional, tag = "4")]
    pub versions: Option<VersionDef>,
    /// Encoded `GraphDebugInfo`
    #[prost(bytes = "vec", optional, tag = "5")]
    pub debug_info: Option<Vec<u8>>,
}

/// Graph version information
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VersionDef {
    /// Version of the code that produced this graph
    #[prost(int32, tag = "1")]
    pub producer: i32,
    /// Oldest consumer version able to read this graph
    #[prost(int32, tag = "2")]
    pub min_consumer: i32,
    /// Consumer versions known to be broken
    #[prost(int32, repeated, tag = "3")]
    pub bad_consumers: Vec<i32>,
}

/// A single operation instance
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeDef {
    /// Unique node name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Operation type tag
    #[prost(string, tag = "2")]
    pub op: String,
    /// References: `name`, `name:k` or `^name`
    #[prost(string, repeated, tag = "3")]
    pub input: Vec<String>,
    /// Opaque placement string
    #[prost(string, tag = "4")]
    pub device: String,
    /// Attribute bag
    #[prost(btree_map = "string, message", tag = "5")]
    pub attr: BTreeMap<String, AttrValue>,
    /// Encoded `NodeDef.ExperimentalDebugInfo`
    #[prost(bytes = "vec", optional, tag = "6")]
    pub experimental_debug_info: Option<Vec<u8>>,
    /// Encoded `FullTypeDef`
    #[prost(bytes = "vec", optional, tag = "7")]
    pub experimental_type: Option<Vec<u8>>,
}

/// Tagged attribute value
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttrValue {
    /// The stored variant
    #[prost(oneof = "attr_value::Value", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9")]
    pub value: Option<attr_value::Value>,
}

/// Nested types for [`AttrValue`]
pub mod attr_value {
    /// List-of-scalar attribute payload
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListValue {
        /// Byte strings
        #[prost(bytes = "vec", repeated, tag = "2")]
        pub s: Vec<Vec<u8>>,
        /// Integers
        #[prost(int64, repeated, tag = "3")]
        pub i: Vec<i64>,
        /// Floats
        #[prost(float, repeated, tag = "4")]
        pub f: Vec<f32>,
        /// Booleans
        #[prost(bool, repeated, tag = "5")]
        pub b: Vec<bool>,
        /// Data types
        #[prost(enumeration = "super::DataType", repeated, tag = "6")]
        pub r#type: Vec<i32>,
        /// Shapes
        #[prost(message, repeated, tag = "7")]
        pub shape: Vec<super::TensorShapeProto>,
        /// Tensors
        #[prost(message, repeated, tag = "8")]
        pub tensor: Vec<super::TensorProto>,
    }

    /// Attribute variants
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        /// List of scalars
        #[prost(message, tag = "1")]
        List(ListValue),
        /// Byte string
        #[prost(bytes = "vec", tag = "2")]
        S(Vec<u8>),
        /// Integer
        #[prost(int64, tag = "3")]
        I(i64),
        /// Float
        #[prost(float, tag = "4")]
        F(f32),
        /// Boolean
        #[prost(bool, tag = "5")]
        B(bool),
        /// Data type
        #[prost(enumeration = "super::DataType", tag = "6")]
        Type(i32),
        /// Shape
        #[prost(message, tag = "7")]
        Shape(super::TensorShapeProto),
        /// Opaque tensor payload
        #[prost(message, tag = "8")]
        Tensor(super::TensorProto),
        /// Function placeholder name
        #[prost(string, tag = "9")]
        Placeholder(String),
    }
}

/// Serialized tensor payload
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    /// Element type
    #[prost(enumeration = "DataType", tag = "1")]
    pub dtype: i32,
    /// Shape metadata
    #[prost(message, optional, tag = "2")]
    pub tensor_shape: Option<TensorShapeProto>,
    /// Serialization version
    #[prost(int32, tag = "3")]
    pub version_number: i32,
    /// Little-endian packed element bytes
    #[prost(bytes = "vec", tag = "4")]
    pub tensor_content: Vec<u8>,
    /// Typed float values
    #[prost(float, repeated, tag = "5")]
    pub float_val: Vec<f32>,
    /// Typed double values
    #[prost(double, repeated, tag = "6")]
    pub double_val: Vec<f64>,
    /// Typed int32/int16/int8/uint8 values
    #[prost(int32, repeated, tag = "7")]
    pub int_val: Vec<i32>,
    /// Typed string values
    #[prost(bytes = "vec", repeated, tag = "8")]
    pub string_val: Vec<Vec<u8>>,
    /// Typed int64 values
    #[prost(int64, repeated, tag = "10")]
    pub int64_val: Vec<i64>,
    /// Typed bool values
    #[prost(bool, repeated, tag = "11")]
    pub bool_val: Vec<bool>,
}

/// Tensor shape
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorShapeProto {
    /// Dimensions, outermost first
    #[prost(message, repeated, tag = "2")]
    pub dim: Vec<tensor_shape_proto::Dim>,
    /// Rank is unknown
    #[prost(bool, tag = "3")]
    pub unknown_rank: bool,
}

/// Nested types for [`TensorShapeProto`]
pub mod tensor_shape_proto {
    /// One dimension
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Dim {
        /// Size, or -1 when unknown
        #[prost(int64, tag = "1")]
        pub size: i64,
        /// Optional dimension name
        #[prost(string, tag = "2")]
        pub name: String,
    }
}

/// Element data types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    /// Not set
    DtInvalid = 0,
    /// 32-bit float
    DtFloat = 1,
    /// 64-bit float
    DtDouble = 2,
    /// 32-bit signed integer
    DtInt32 = 3,
    /// 8-bit unsigned integer
    DtUint8 = 4,
    /// 16-bit signed integer
    DtInt16 = 5,
    /// 8-bit signed integer
    DtInt8 = 6,
    /// Byte string
    DtString = 7,
    /// Complex of two f32
    DtComplex64 = 8,
    /// 64-bit signed integer
    DtInt64 = 9,
    /// Boolean
    DtBool = 10,
    /// Brain float
    DtBfloat16 = 14,
    /// 16-bit unsigned integer
    DtUint16 = 17,
    /// 16-bit float
    DtHalf = 19,
    /// 32-bit unsigned integer
    DtUint32 = 22,
    /// 64-bit unsigned integer
    DtUint64 = 23,
}

/// Extension methods for graph protobuf types
pub mod extensions;
