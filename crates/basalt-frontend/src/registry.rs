//! Translator registry with opset-versioned dispatch.
//!
//! Operators change input/attribute conventions between opset versions,
//! so an operator name can map to several translators, each serving a
//! version range. The registry is built once at startup and is read-only
//! afterwards; translators are plain function pointers, so lookups need
//! no synchronization.

use crate::ctx::LowerCtx;
use crate::error::{LowerError, Result};
use crate::ops;
use basalt_ir::ValueId;
use std::collections::HashMap;

/// A translator lowers one source node into the values it produces.
///
/// Pure function of the context: no hidden state, no I/O, deterministic
/// given its inputs.
pub type Translator = fn(&mut LowerCtx<'_>) -> Result<Vec<ValueId>>;

struct Registration {
    since: i64,
    until: Option<i64>,
    translator: Translator,
}

/// Registry mapping (operator name, opset version) to a translator.
pub struct TranslatorRegistry {
    ops: HashMap<String, Vec<Registration>>,
}

impl TranslatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }

    /// Register a translator serving `since` and every later opset.
    ///
    /// Returns `self` for method chaining.
    pub fn register(&mut self, name: &str, since: i64, translator: Translator) -> &mut Self {
        self.insert(name, since, None, translator);
        self
    }

    /// Register a translator serving the closed opset range
    /// `since..=until`.
    pub fn register_range(
        &mut self,
        name: &str,
        since: i64,
        until: i64,
        translator: Translator,
    ) -> &mut Self {
        self.insert(name, since, Some(until), translator);
        self
    }

    fn insert(&mut self, name: &str, since: i64, until: Option<i64>, translator: Translator) {
        self.ops.entry(name.to_string()).or_default().push(Registration {
            since,
            until,
            translator,
        });
    }

    /// Look up the translator for an operator at a given opset version.
    ///
    /// When several registrations match, the one with the highest lower
    /// bound wins; families that diverge at a version boundary register
    /// adjacent ranges so only one entry matches.
    pub fn lookup(&self, name: &str, version: i64) -> Result<Translator> {
        self.ops
            .get(name)
            .and_then(|entries| {
                entries
                    .iter()
                    .filter(|r| r.since <= version && r.until.map_or(true, |u| version <= u))
                    .max_by_key(|r| r.since)
            })
            .map(|r| r.translator)
            .ok_or_else(|| LowerError::NoTranslatorFound {
                op: name.to_string(),
                version,
            })
    }

    /// Check if any translator is registered under this name.
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Get the number of registered operator names.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over all registered operator names.
    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(|s| s.as_str())
    }
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a registry pre-populated with the reduction operator family.
///
/// ReduceSum moved its axes from the `axes` attribute to an optional
/// second input at opset 13 (which also legalized bfloat16 and added
/// `noop_with_empty_axes`), so it registers two adjacent ranges. Opset 18
/// changed nothing for ReduceSum and is served by the 13+ entry as-is.
/// Opset 11 is not a boundary: its revisions to the reduce operators are
/// editorial for this lowering.
pub fn default_registry() -> TranslatorRegistry {
    let mut registry = TranslatorRegistry::new();

    registry.register("ReduceL1", 1, ops::reduce::reduce_l1);
    registry.register("ReduceL2", 1, ops::reduce::reduce_l2);
    registry.register("ReduceLogSum", 1, ops::reduce::reduce_log_sum);
    registry.register("ReduceLogSumExp", 1, ops::reduce::reduce_log_sum_exp);
    registry.register("ReduceMax", 1, ops::reduce::reduce_max);
    registry.register("ReduceMean", 1, ops::reduce::reduce_mean);
    registry.register("ReduceMin", 1, ops::reduce::reduce_min);
    registry.register("ReduceProd", 1, ops::reduce::reduce_prod);
    registry.register_range("ReduceSum", 1, 12, ops::reduce::reduce_sum);
    registry.register("ReduceSum", 13, ops::reduce::reduce_sum_axes_input);
    registry.register("ReduceSumSquare", 1, ops::reduce::reduce_sum_square);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TranslatorRegistry::new();
        registry.register("ReduceMean", 1, ops::reduce::reduce_mean);

        assert!(registry.contains("ReduceMean"));
        assert!(registry.lookup("ReduceMean", 1).is_ok());
        assert!(registry.lookup("ReduceMean", 18).is_ok());
        assert!(matches!(
            registry.lookup("ReduceMean", 0),
            Err(LowerError::NoTranslatorFound { .. })
        ));
        assert!(matches!(
            registry.lookup("Softmax", 1),
            Err(LowerError::NoTranslatorFound { .. })
        ));
    }

    #[test]
    fn test_version_boundary_selects_era() {
        use basalt_ir::{DataType, IrGraph, TensorShape, Value};
        use basalt_onnx::Node;

        let registry = default_registry();

        // bfloat16 is only legal from opset 13 on, so dispatching the same
        // node at versions 12, 13, and 18 tells the eras apart.
        let lower_bf16 = |version: i64| {
            let translator = registry.lookup("ReduceSum", version).unwrap();
            let node = Node::new("ReduceSum");
            let mut graph = IrGraph::new();
            let data = graph.add_value(Value::new(
                "data".to_string(),
                DataType::BF16,
                TensorShape::Static(vec![2, 3]),
            ));
            let mut ctx = LowerCtx::new(&node, version, vec![data], &mut graph);
            translator(&mut ctx).map(|_| ())
        };

        assert!(matches!(
            lower_bf16(12),
            Err(LowerError::UnsupportedType { .. })
        ));
        assert!(lower_bf16(13).is_ok());

        // The placeholder later opset inherits the 13+ behavior.
        assert!(lower_bf16(18).is_ok());
    }

    #[test]
    fn test_range_upper_bound_is_inclusive() {
        let mut registry = TranslatorRegistry::new();
        registry.register_range("ReduceSum", 1, 12, ops::reduce::reduce_sum);

        assert!(registry.lookup("ReduceSum", 12).is_ok());
        assert!(matches!(
            registry.lookup("ReduceSum", 13),
            Err(LowerError::NoTranslatorFound { .. })
        ));
    }

    #[test]
    fn test_default_registry_covers_family() {
        let registry = default_registry();
        let mut names: Vec<_> = registry.operator_names().collect();
        names.sort_unstable();

        assert_eq!(
            names,
            vec![
                "ReduceL1",
                "ReduceL2",
                "ReduceLogSum",
                "ReduceLogSumExp",
                "ReduceMax",
                "ReduceMean",
                "ReduceMin",
                "ReduceProd",
                "ReduceSum",
                "ReduceSumSquare",
            ]
        );
    }
}
