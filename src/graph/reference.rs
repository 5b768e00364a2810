//! Structured node input references
//!
//! Edges are encoded as strings on the wire: `"node"`, `"node:k"` for data
//! edges and `"^node"` for control edges. They are parsed once into
//! [`TensorRef`] so matching and renaming never do string surgery.

use std::fmt;
use std::str::FromStr;

use crate::error::{GraphResult, TransformError};

/// Which side of a node a reference addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefKind {
    /// Data edge from output `k`
    Output(usize),
    /// Control dependency, carries no output index
    Control,
}

/// A parsed input reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorRef {
    /// Base node name
    pub node: String,
    /// Data output or control edge
    pub kind: RefKind,
}

impl TensorRef {
    /// Data reference to output `index` of `node`
    pub fn output(node: impl Into<String>, index: usize) -> Self {
        Self {
            node: node.into(),
            kind: RefKind::Output(index),
        }
    }

    /// Control reference to `node`
    pub fn control(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            kind: RefKind::Control,
        }
    }

    /// Parse a reference string
    pub fn parse(input: &str) -> GraphResult<Self> {
        let malformed = || TransformError::MalformedReference(input.to_string());

        if let Some(name) = input.strip_prefix('^') {
            if name.is_empty() || name.contains(':') {
                return Err(malformed());
            }
            return Ok(Self::control(name));
        }

        match input.rsplit_once(':') {
            Some((name, index)) => {
                if name.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(malformed());
                }
                let index = index.parse::<usize>().map_err(|_| malformed())?;
                Ok(Self::output(name, index))
            }
            None if input.is_empty() => Err(malformed()),
            None => Ok(Self::output(input, 0)),
        }
    }

    /// True for `^name` references
    pub fn is_control(&self) -> bool {
        self.kind == RefKind::Control
    }

    /// Output index for data references
    pub fn output_index(&self) -> Option<usize> {
        match self.kind {
            RefKind::Output(index) => Some(index),
            RefKind::Control => None,
        }
    }

    /// Control reference to the same node
    pub fn to_control(&self) -> Self {
        Self::control(self.node.clone())
    }
}

impl fmt::Display for TensorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RefKind::Control => write!(f, "^{}", self.node),
            RefKind::Output(0) => write!(f, "{}", self.node),
            RefKind::Output(index) => write!(f, "{}:{}", self.node, index),
        }
    }
}

impl FromStr for TensorRef {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Strip control prefix and output suffix from a reference
///
/// Lenient: anything after the last `:` is dropped without validation.
pub fn node_name_from_input(input: &str) -> &str {
    let name = input.strip_prefix('^').unwrap_or(input);
    match name.rsplit_once(':') {
        Some((base, _)) => base,
        None => name,
    }
}
