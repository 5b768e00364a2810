//! Graph validation
//!
//! Checks that a graph is well formed before any transform runs and that a
//! rewritten graph still resolves every reference.

use rustc_hash::FxHashSet;

use crate::error::{GraphResult, TransformError};
use crate::proto::GraphDef;

use super::reference::{node_name_from_input, TensorRef};

/// Validation result with detailed issues
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the graph is valid
    pub is_valid: bool,
    /// List of errors (critical issues)
    pub errors: Vec<String>,
    /// List of warnings (non-critical issues)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.is_valid = false;
    }

    /// Add a warning
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Merge with another result
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validate a graph
///
/// Reports empty and duplicate node names, empty op types, malformed
/// references, and references to nodes that do not exist.
pub fn validate_graph(graph: &GraphDef) -> ValidationResult {
    let mut result = ValidationResult::valid();

    let mut names: FxHashSet<&str> = FxHashSet::default();
    for (idx, node) in graph.node.iter().enumerate() {
        if node.name.is_empty() {
            result.add_error(format!("Node {} ({}) has empty name", idx, node.op));
        } else if !names.insert(node.name.as_str()) {
            result.add_error(format!("Duplicate node name '{}'", node.name));
        }
        if node.op.is_empty() {
            result.add_error(format!("Node '{}' has empty op", node.name));
        }
    }

    for node in &graph.node {
        for input in &node.input {
            match TensorRef::parse(input) {
                Ok(reference) if !names.contains(reference.node.as_str()) => {
                    result.add_error(format!(
                        "Node '{}' ({}): input '{}' not found",
                        node.name, node.op, input
                    ));
                }
                Ok(_) => {}
                Err(_) => {
                    result.add_error(format!(
                        "Node '{}' ({}): malformed input '{}'",
                        node.name, node.op, input
                    ));
                }
            }
        }
    }

    if graph.node.is_empty() {
        result.add_warning("Graph is empty (no nodes)");
    }

    result
}

/// Warn about declared input/output names that no node carries
pub fn validate_declared_names<S: AsRef<str>>(graph: &GraphDef, declared: &[S]) -> ValidationResult {
    let mut result = ValidationResult::valid();
    let names: FxHashSet<&str> = graph.node.iter().map(|n| n.name.as_str()).collect();

    for name in declared {
        let base = node_name_from_input(name.as_ref());
        if !names.contains(base) {
            result.add_warning(format!("Declared name '{}' not found in graph", name.as_ref()));
        }
    }

    result
}

/// Quick validation that returns an error if invalid
pub fn check_graph(graph: &GraphDef) -> GraphResult<()> {
    let result = validate_graph(graph);
    if result.is_valid {
        Ok(())
    } else {
        Err(TransformError::InputMalformed(result.errors.join("; ")))
    }
}

/// Every `(node, input)` whose base node is missing from the graph
///
/// Lenient about syntax: malformed references are resolved by base name.
pub fn find_dangling_references(graph: &GraphDef) -> Vec<(String, String)> {
    let names: FxHashSet<&str> = graph.node.iter().map(|n| n.name.as_str()).collect();

    graph
        .node
        .iter()
        .flat_map(|node| {
            node.input
                .iter()
                .filter(|input| !names.contains(node_name_from_input(input)))
                .map(move |input| (node.name.clone(), input.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::extensions::make_node;

    #[test]
    fn test_valid_graph() {
        let graph = GraphDef {
            node: vec![
                make_node("Placeholder", &[], "x"),
                make_node("Relu", &["x:0", "^x"], "relu"),
            ],
            ..Default::default()
        };
        let result = validate_graph(&graph);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(check_graph(&graph).is_ok());
    }

    #[test]
    fn test_collects_every_issue() {
        let graph = GraphDef {
            node: vec![
                make_node("Placeholder", &[], "x"),
                make_node("Placeholder", &[], "x"),
                make_node("Relu", &["y", "x:bad"], "relu"),
                make_node("", &["x"], "empty_op"),
            ],
            ..Default::default()
        };
        let result = validate_graph(&graph);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 4);
        assert!(matches!(
            check_graph(&graph),
            Err(TransformError::InputMalformed(_))
        ));
    }

    #[test]
    fn test_declared_names_warn_only() {
        let graph = GraphDef {
            node: vec![make_node("Placeholder", &[], "x")],
            ..Default::default()
        };
        let result = validate_declared_names(&graph, &["x:0", "missing"]);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_find_dangling_references() {
        let graph = GraphDef {
            node: vec![
                make_node("Placeholder", &[], "x"),
                make_node("Add", &["x", "gone:1", "^also_gone"], "add"),
            ],
            ..Default::default()
        };
        let dangling = find_dangling_references(&graph);
        assert_eq!(dangling.len(), 2);
        assert_eq!(dangling[0], ("add".to_string(), "gone:1".to_string()));
    }
}
