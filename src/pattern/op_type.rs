//! Op-type pattern trees
//!
//! A pattern is a nested template of op types, e.g.
//! `Transpose(Pad(Transpose(*, Const), Const), Const)`. The first child
//! matches the node's first data input, the second child its second, and so
//! on. `*` matches any node and does not look at its inputs.

use std::fmt;
use std::str::FromStr;

use crate::error::TransformError;

/// Op type that matches every node
pub const WILDCARD: &str = "*";

/// A node in a pattern tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpTypePattern {
    /// Literal op type, `*`, or alternatives such as `Add|AddV2`
    pub op: String,
    /// Child patterns, one per data input
    pub inputs: Vec<OpTypePattern>,
    /// Allow data inputs beyond the declared children
    pub open_ended: bool,
}

impl OpTypePattern {
    /// Leaf pattern for `op`
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            inputs: Vec::new(),
            open_ended: false,
        }
    }

    /// Pattern that matches any node
    pub fn any() -> Self {
        Self::new(WILDCARD)
    }

    /// Pattern for `op` with the given children
    pub fn with_inputs(op: impl Into<String>, inputs: Vec<OpTypePattern>) -> Self {
        Self {
            op: op.into(),
            inputs,
            open_ended: false,
        }
    }

    /// Append a child pattern
    pub fn input(mut self, child: OpTypePattern) -> Self {
        self.inputs.push(child);
        self
    }

    /// Accept extra trailing data inputs
    pub fn open(mut self) -> Self {
        self.open_ended = true;
        self
    }

    /// True for `*`
    pub fn is_wildcard(&self) -> bool {
        self.op == WILDCARD
    }

    /// True when the pattern does not inspect the node's inputs
    pub fn is_leaf(&self) -> bool {
        self.inputs.is_empty() && !self.open_ended
    }

    /// Check whether a node op satisfies this pattern's op constraint
    pub fn matches_op(&self, op: &str) -> bool {
        self.is_wildcard() || self.op.split('|').any(|alt| alt == op)
    }

    /// Number of pattern nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + self.inputs.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Depth of the tree (a single node has depth 1)
    pub fn depth(&self) -> usize {
        1 + self.inputs.iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

impl fmt::Display for OpTypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.op)?;
        if self.is_leaf() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, child) in self.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", child)?;
        }
        if self.open_ended {
            if !self.inputs.is_empty() {
                f.write_str(", ")?;
            }
            f.write_str("...")?;
        }
        f.write_str(")")
    }
}

impl FromStr for OpTypePattern {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            text: s,
            bytes: s.as_bytes(),
            pos: 0,
        };
        let pattern = parser.pattern()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(pattern)
    }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, msg: &str) -> TransformError {
        TransformError::InvalidPattern(format!("{} at offset {} in '{}'", msg, self.pos, self.text))
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn op(&mut self) -> Result<&'a str, TransformError> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'|' | b'*' | b'.' | b'/' | b'-') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected op type"));
        }
        let op = &self.text[start..self.pos];
        if op.split('|').any(|alt| alt.is_empty()) {
            return Err(self.error("empty alternative"));
        }
        Ok(op)
    }

    fn ellipsis(&mut self) -> bool {
        self.skip_ws();
        if self.text[self.pos..].starts_with("...") {
            self.pos += 3;
            true
        } else {
            false
        }
    }

    fn pattern(&mut self) -> Result<OpTypePattern, TransformError> {
        let mut pattern = OpTypePattern::new(self.op()?);
        if !self.eat(b'(') {
            return Ok(pattern);
        }
        if pattern.is_wildcard() {
            return Err(self.error("wildcard can not have inputs"));
        }

        if self.eat(b')') {
            return Ok(pattern);
        }
        loop {
            if self.ellipsis() {
                pattern.open_ended = true;
                if !self.eat(b')') {
                    return Err(self.error("'...' must be the last input"));
                }
                return Ok(pattern);
            }
            pattern.inputs.push(self.pattern()?);
            if self.eat(b')') {
                return Ok(pattern);
            }
            if !self.eat(b',') {
                return Err(self.error("expected ',' or ')'"));
            }
        }
    }
}
