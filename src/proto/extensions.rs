//! Extension methods for graph protobuf types
//!
//! Provides typed accessors over the dynamic attribute bag and small node
//! constructors used by the transformers and tests.

use crate::error::{GraphResult, TransformError};

use super::attr_value::{ListValue, Value};
use super::*;

// ============================================================================
// AttrValue extensions
// ============================================================================

impl AttrValue {
    /// Create an integer attribute
    pub fn int(value: i64) -> Self {
        Self {
            value: Some(Value::I(value)),
        }
    }

    /// Create a float attribute
    pub fn float(value: f32) -> Self {
        Self {
            value: Some(Value::F(value)),
        }
    }

    /// Create a boolean attribute
    pub fn boolean(value: bool) -> Self {
        Self {
            value: Some(Value::B(value)),
        }
    }

    /// Create a string attribute
    pub fn string(value: &str) -> Self {
        Self {
            value: Some(Value::S(value.as_bytes().to_vec())),
        }
    }

    /// Create a data type attribute
    pub fn data_type(dtype: DataType) -> Self {
        Self {
            value: Some(Value::Type(dtype as i32)),
        }
    }

    /// Create a tensor attribute
    pub fn tensor(tensor: TensorProto) -> Self {
        Self {
            value: Some(Value::Tensor(tensor)),
        }
    }

    /// Create an integer list attribute
    pub fn list_i(values: Vec<i64>) -> Self {
        Self {
            value: Some(Value::List(ListValue {
                i: values,
                ..Default::default()
            })),
        }
    }

    /// Name of the stored variant, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match &self.value {
            None => "none",
            Some(Value::List(_)) => "list",
            Some(Value::S(_)) => "string",
            Some(Value::I(_)) => "int",
            Some(Value::F(_)) => "float",
            Some(Value::B(_)) => "bool",
            Some(Value::Type(_)) => "type",
            Some(Value::Shape(_)) => "shape",
            Some(Value::Tensor(_)) => "tensor",
            Some(Value::Placeholder(_)) => "placeholder",
        }
    }
}

// ============================================================================
// NodeDef extensions
// ============================================================================

impl NodeDef {
    /// Check if this node has a specific op type
    pub fn is_op(&self, op: &str) -> bool {
        self.op == op
    }

    /// Check if node has attribute
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr.contains_key(name)
    }

    /// Get an attribute, failing when it is absent
    pub fn attr_value(&self, name: &str) -> GraphResult<&AttrValue> {
        self.attr.get(name).ok_or_else(|| TransformError::AttrNotFound {
            node: self.name.clone(),
            attr: name.to_string(),
        })
    }

    /// Get an integer attribute
    pub fn attr_i(&self, name: &str) -> GraphResult<i64> {
        match self.attr_value(name)? {
            AttrValue {
                value: Some(Value::I(v)),
            } => Ok(*v),
            other => Err(type_mismatch(name, "int", other)),
        }
    }

    /// Get a float attribute
    pub fn attr_f(&self, name: &str) -> GraphResult<f32> {
        match self.attr_value(name)? {
            AttrValue {
                value: Some(Value::F(v)),
            } => Ok(*v),
            other => Err(type_mismatch(name, "float", other)),
        }
    }

    /// Get a boolean attribute
    pub fn attr_b(&self, name: &str) -> GraphResult<bool> {
        match self.attr_value(name)? {
            AttrValue {
                value: Some(Value::B(v)),
            } => Ok(*v),
            other => Err(type_mismatch(name, "bool", other)),
        }
    }

    /// Get a string attribute as raw bytes
    pub fn attr_s(&self, name: &str) -> GraphResult<&[u8]> {
        match self.attr_value(name)? {
            AttrValue {
                value: Some(Value::S(v)),
            } => Ok(v.as_slice()),
            other => Err(type_mismatch(name, "string", other)),
        }
    }

    /// Get a data type attribute
    pub fn attr_type(&self, name: &str) -> GraphResult<DataType> {
        match self.attr_value(name)? {
            AttrValue {
                value: Some(Value::Type(v)),
            } => DataType::try_from(*v).map_err(|_| TransformError::InvalidDataType(*v)),
            other => Err(type_mismatch(name, "type", other)),
        }
    }

    /// Get an integer list attribute
    pub fn attr_list_i(&self, name: &str) -> GraphResult<&[i64]> {
        match self.attr_value(name)? {
            AttrValue {
                value: Some(Value::List(list)),
            } => Ok(list.i.as_slice()),
            other => Err(type_mismatch(name, "list", other)),
        }
    }

    /// Get a tensor attribute
    pub fn attr_tensor(&self, name: &str) -> GraphResult<&TensorProto> {
        match self.attr_value(name)? {
            AttrValue {
                value: Some(Value::Tensor(t)),
            } => Ok(t),
            other => Err(type_mismatch(name, "tensor", other)),
        }
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, name: &str, value: AttrValue) {
        self.attr.insert(name.to_string(), value);
    }

    /// Copy attribute `from` of `source` into this node as `to`
    ///
    /// Returns false when the source attribute does not exist.
    pub fn copy_attr(&mut self, source: &NodeDef, from: &str, to: &str) -> bool {
        match source.attr.get(from) {
            Some(value) => {
                self.attr.insert(to.to_string(), value.clone());
                true
            }
            None => false,
        }
    }

    /// Data (non-control) input references in order
    pub fn data_inputs(&self) -> impl Iterator<Item = &String> {
        self.input.iter().filter(|i| !i.starts_with('^'))
    }

    /// Control input references in order
    pub fn control_inputs(&self) -> impl Iterator<Item = &String> {
        self.input.iter().filter(|i| i.starts_with('^'))
    }
}

fn type_mismatch(attr: &str, expected: &'static str, found: &AttrValue) -> TransformError {
    TransformError::TypeMismatch {
        attr: attr.to_string(),
        expected,
        found: found.kind_name(),
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Create a new NodeDef
pub fn make_node(op: &str, inputs: &[&str], name: &str) -> NodeDef {
    NodeDef {
        op: op.to_string(),
        input: inputs.iter().map(|s| s.to_string()).collect(),
        name: name.to_string(),
        ..Default::default()
    }
}

/// Create a `Const` node holding `tensor`
pub fn make_const_node(name: &str, tensor: TensorProto) -> NodeDef {
    let mut node = make_node("Const", &[], name);
    let dtype = DataType::try_from(tensor.dtype).unwrap_or(DataType::DtInvalid);
    node.set_attr("dtype", AttrValue::data_type(dtype));
    node.set_attr("value", AttrValue::tensor(tensor));
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_typed_attr_access() {
        let mut node = make_node("Split", &["dim", "x"], "split");
        node.set_attr("num_split", AttrValue::int(1));

        assert_eq!(node.attr_i("num_split").unwrap(), 1);
        assert!(matches!(
            node.attr_i("missing"),
            Err(TransformError::AttrNotFound { .. })
        ));
    }

    #[test]
    fn test_type_mismatch_reports_both_tags() {
        let mut node = make_node("Split", &[], "split");
        node.set_attr("num_split", AttrValue::string("one"));

        match node.attr_i("num_split") {
            Err(TransformError::TypeMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, "int");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_copy_attr() {
        let mut source = make_node("Dilation2D", &[], "d");
        source.set_attr("padding", AttrValue::string("SAME"));
        let mut target = make_node("MaxPool", &[], "d");

        assert!(target.copy_attr(&source, "padding", "padding"));
        assert!(!target.copy_attr(&source, "rates", "rates"));
        assert_eq!(target.attr_s("padding").unwrap(), b"SAME");
    }

    #[test]
    fn test_data_and_control_inputs() {
        let node = make_node("Relu", &["x:1", "^init", "y"], "relu");
        let data: Vec<_> = node.data_inputs().collect();
        let control: Vec<_> = node.control_inputs().collect();
        assert_eq!(data, vec!["x:1", "y"]);
        assert_eq!(control, vec!["^init"]);
    }

    #[test]
    fn test_make_const_node() {
        let tensor = TensorProto {
            dtype: DataType::DtInt32 as i32,
            int_val: vec![0, 3, 1, 2],
            ..Default::default()
        };
        let node = make_const_node("perm", tensor);
        assert_eq!(node.op, "Const");
        assert_eq!(node.attr_type("dtype").unwrap(), DataType::DtInt32);
        assert_eq!(node.attr_tensor("value").unwrap().int_val, vec![0, 3, 1, 2]);
    }
}
