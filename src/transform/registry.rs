//! Transform registry
//!
//! Maps transform names to functions. The process-wide registry is built
//! on first use and holds the built-in transforms.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{GraphResult, TransformError};
use crate::proto::GraphDef;

use super::context::TransformFuncContext;

/// Signature every registered transform implements
pub type TransformFunc = fn(&GraphDef, &TransformFuncContext) -> GraphResult<GraphDef>;

/// Insertion-ordered name → transform map
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    transforms: IndexMap<String, TransformFunc>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under `name`
    pub fn register(&mut self, name: &str, func: TransformFunc) -> GraphResult<()> {
        if self.transforms.contains_key(name) {
            return Err(TransformError::Internal(format!(
                "transform '{}' registered twice",
                name
            )));
        }
        self.transforms.insert(name.to_string(), func);
        Ok(())
    }

    /// Look up a transform
    pub fn get(&self, name: &str) -> Option<TransformFunc> {
        self.transforms.get(name).copied()
    }

    /// Check whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(|s| s.as_str())
    }

    /// Number of registered transforms
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Run `name` on `graph`
    ///
    /// Failures are wrapped with the transform name.
    pub fn apply(
        &self,
        name: &str,
        graph: &GraphDef,
        context: &TransformFuncContext,
    ) -> GraphResult<GraphDef> {
        let func = self
            .get(name)
            .ok_or_else(|| TransformError::UnknownTransform(name.to_string()))?;
        debug!(transform = name, nodes = graph.node.len(), "applying transform");
        func(graph, context).map_err(|err| err.in_transform(name))
    }
}

static GLOBAL_REGISTRY: Lazy<TransformRegistry> = Lazy::new(|| {
    let mut registry = TransformRegistry::new();
    crate::transformers::register_builtin_transforms(&mut registry);
    registry
});

/// The process-wide registry with every built-in transform
pub fn global_registry() -> &'static TransformRegistry {
    &GLOBAL_REGISTRY
}

/// Run a registered transform by name
pub fn apply_transform(
    name: &str,
    graph: &GraphDef,
    context: &TransformFuncContext,
) -> GraphResult<GraphDef> {
    global_registry().apply(name, graph, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::extensions::make_node;

    fn identity(graph: &GraphDef, _ctx: &TransformFuncContext) -> GraphResult<GraphDef> {
        Ok(graph.clone())
    }

    fn failing(_graph: &GraphDef, _ctx: &TransformFuncContext) -> GraphResult<GraphDef> {
        Err(TransformError::InvariantViolation("boom".to_string()))
    }

    #[test]
    fn test_register_and_apply() {
        let mut registry = TransformRegistry::new();
        registry.register("identity", identity).unwrap();
        assert!(registry.register("identity", identity).is_err());

        let graph = GraphDef {
            node: vec![make_node("Placeholder", &[], "x")],
            ..Default::default()
        };
        let out = registry
            .apply("identity", &graph, &TransformFuncContext::default())
            .unwrap();
        assert_eq!(out, graph);
    }

    #[test]
    fn test_unknown_transform() {
        let registry = TransformRegistry::new();
        let err = registry
            .apply("nope", &GraphDef::default(), &TransformFuncContext::default())
            .unwrap_err();
        assert!(matches!(err, TransformError::UnknownTransform(_)));
    }

    #[test]
    fn test_failure_names_transform() {
        let mut registry = TransformRegistry::new();
        registry.register("failing", failing).unwrap();
        let err = registry
            .apply("failing", &GraphDef::default(), &TransformFuncContext::default())
            .unwrap_err();
        match &err {
            TransformError::TransformFailed { transform, .. } => assert_eq!(transform, "failing"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_global_registry_has_builtins() {
        let registry = global_registry();
        for name in [
            "remove_noop_split",
            "remove_noop_padv2",
            "dilation2d_to_maxpool2d",
            "fold_transposed_pads",
            "swap_trans_relu",
            "swap_trans_mul_add",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }
}
