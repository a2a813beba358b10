//! Reduction axis resolution.
//!
//! Depending on the opset era, reduction axes arrive either as an `axes`
//! attribute (known at graph-construction time) or as an optional second
//! input tensor (values possibly only known at runtime). Either way the
//! axis *count* must be fixed while the graph is built; when no axes are
//! given at all, a subgraph computing `[0, rank)` at runtime is
//! synthesized instead of failing the import.

use crate::ctx::LowerCtx;
use crate::error::{LowerError, Result};
use crate::validate;
use basalt_ir::{DataType, ValueId};
use tracing::trace;

/// How the reduction axes are supplied. Exactly one variant is active per
/// translation.
#[derive(Debug, Clone, PartialEq)]
pub enum AxesSpec {
    /// Axes known at graph-construction time (attribute, or a synthesized
    /// monotonic range).
    Values(Vec<i64>),

    /// Axes supplied by the node's second input; referenced directly, no
    /// copy.
    Input(ValueId),

    /// Reduce over all axes; the axis list is computed at runtime.
    AllDynamic,

    /// Explicit no-op: the translator must pass the input through
    /// unchanged.
    NoAxes,
}

/// Resolve the axes for a reduction node.
///
/// `axes_from_attribute` selects the opset era: `true` reads the `axes`
/// attribute, `false` reads the optional second input together with
/// `noop_with_empty_axes`.
pub fn resolve(ctx: &LowerCtx, axes_from_attribute: bool) -> Result<AxesSpec> {
    if axes_from_attribute {
        from_attribute(ctx)
    } else {
        from_input(ctx)
    }
}

fn from_attribute(ctx: &LowerCtx) -> Result<AxesSpec> {
    let axes: Vec<i64> = ctx.attr_or("axes", Vec::new())?;

    let data = ctx.input(0)?;
    let rank = ctx.value_shape(data)?.ndim();

    if axes.is_empty() {
        return Ok(match rank {
            // Default is to reduce over every axis.
            Some(rank) => AxesSpec::Values(monotonic_range(rank)),
            None => {
                trace!(node = %ctx.description(), "rank unknown, reducing over all axes at runtime");
                AxesSpec::AllDynamic
            }
        });
    }

    // The axis count can only be checked once the rank is known.
    if let Some(rank) = rank {
        validate::axes_within_rank(ctx, axes.len(), rank)?;
    }

    Ok(AxesSpec::Values(axes))
}

fn from_input(ctx: &LowerCtx) -> Result<AxesSpec> {
    let noop_with_empty_axes = ctx.attr_or::<i64>("noop_with_empty_axes", 0)? != 0;

    if let Some(axes) = ctx.get_input(1) {
        let shape = ctx.value_shape(axes)?;

        // The axis count determines the output shape, so it must be fixed
        // at graph-construction time even when the axis values are not.
        let dims = shape.as_static().ok_or_else(|| LowerError::NonStaticAxesShape {
            node: ctx.description(),
        })?;

        // A rank-0 or zero-length tensor counts as "no axes provided".
        let empty = dims.is_empty() || dims == [0usize];
        if !empty {
            return Ok(AxesSpec::Input(axes));
        }
    }

    if noop_with_empty_axes {
        Ok(AxesSpec::NoAxes)
    } else {
        Ok(AxesSpec::AllDynamic)
    }
}

/// `[0, 1, ..., rank-1]`
fn monotonic_range(rank: usize) -> Vec<i64> {
    (0..rank as i64).collect()
}

/// Synthesize the runtime axis list `[0, rank)` for the node's first
/// input: shape-of → shape-of → squeeze-to-scalar → range with step 1.
pub fn dynamic_all_axes(ctx: &mut LowerCtx) -> Result<ValueId> {
    let data = ctx.input(0)?;
    let b = ctx.builder();

    let shape = b.shape_of(data)?;
    let rank_vec = b.shape_of(shape)?;
    let zero_axis = b.const_i64s(vec![0]);
    let rank_scalar = b.squeeze(rank_vec, zero_axis)?;

    let start = b.scalar_i64(0);
    let step = b.scalar_i64(1);
    Ok(b.range(start, rank_scalar, step, DataType::I64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_ir::{Dim, IrGraph, Op, TensorShape, Value};
    use basalt_onnx::{AttributeValue, Node};

    fn data_value(graph: &mut IrGraph, shape: TensorShape) -> ValueId {
        graph.add_value(Value::new("data".to_string(), DataType::F32, shape))
    }

    fn axes_value(graph: &mut IrGraph, shape: TensorShape) -> ValueId {
        graph.add_value(Value::new("axes".to_string(), DataType::I64, shape))
    }

    #[test]
    fn test_attribute_axes_passed_through() {
        let mut node = Node::new("ReduceSum");
        node.attributes
            .insert("axes".to_string(), AttributeValue::Ints(vec![0, 2]));

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Static(vec![2, 3, 4]));
        let ctx = LowerCtx::new(&node, 1, vec![data], &mut graph);

        assert_eq!(resolve(&ctx, true).unwrap(), AxesSpec::Values(vec![0, 2]));
    }

    #[test]
    fn test_attribute_empty_axes_defaults_to_all() {
        let node = Node::new("ReduceSum");

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Static(vec![2, 3, 4]));
        let ctx = LowerCtx::new(&node, 1, vec![data], &mut graph);

        assert_eq!(
            resolve(&ctx, true).unwrap(),
            AxesSpec::Values(vec![0, 1, 2])
        );
    }

    #[test]
    fn test_attribute_empty_axes_unknown_rank_goes_dynamic() {
        let node = Node::new("ReduceSum");

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Unknown);
        let ctx = LowerCtx::new(&node, 1, vec![data], &mut graph);

        assert_eq!(resolve(&ctx, true).unwrap(), AxesSpec::AllDynamic);
    }

    #[test]
    fn test_attribute_axes_exceeding_rank() {
        let mut node = Node::new("ReduceSum");
        node.attributes
            .insert("axes".to_string(), AttributeValue::Ints(vec![0, 1, 2]));

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Static(vec![2, 3]));
        let ctx = LowerCtx::new(&node, 1, vec![data], &mut graph);

        assert!(matches!(
            resolve(&ctx, true),
            Err(LowerError::AxesRankTooLarge {
                count: 3,
                rank: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_attribute_axes_with_unknown_rank_skip_validation() {
        let mut node = Node::new("ReduceSum");
        node.attributes
            .insert("axes".to_string(), AttributeValue::Ints(vec![0, 1, 2]));

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Unknown);
        let ctx = LowerCtx::new(&node, 1, vec![data], &mut graph);

        assert_eq!(
            resolve(&ctx, true).unwrap(),
            AxesSpec::Values(vec![0, 1, 2])
        );
    }

    #[test]
    fn test_input_axes_referenced_directly() {
        let node = Node::new("ReduceSum");

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Static(vec![2, 3]));
        let axes = axes_value(&mut graph, TensorShape::Static(vec![1]));
        let ctx = LowerCtx::new(&node, 13, vec![data, axes], &mut graph);

        assert_eq!(resolve(&ctx, false).unwrap(), AxesSpec::Input(axes));
    }

    #[test]
    fn test_input_axes_non_static_shape() {
        let node = Node::new("ReduceSum");

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Static(vec![2, 3]));
        let axes = axes_value(&mut graph, TensorShape::Dynamic(vec![Dim::Unknown]));
        let ctx = LowerCtx::new(&node, 13, vec![data, axes], &mut graph);

        assert!(matches!(
            resolve(&ctx, false),
            Err(LowerError::NonStaticAxesShape { .. })
        ));
    }

    #[test]
    fn test_input_axes_zero_length_counts_as_absent() {
        let mut node = Node::new("ReduceSum");
        node.attributes
            .insert("noop_with_empty_axes".to_string(), AttributeValue::Int(1));

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Static(vec![2, 3]));
        let axes = axes_value(&mut graph, TensorShape::Static(vec![0]));
        let ctx = LowerCtx::new(&node, 13, vec![data, axes], &mut graph);

        assert_eq!(resolve(&ctx, false).unwrap(), AxesSpec::NoAxes);
    }

    #[test]
    fn test_input_axes_absent_without_noop_goes_dynamic() {
        let node = Node::new("ReduceSum");

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Static(vec![2, 3]));
        let ctx = LowerCtx::new(&node, 13, vec![data], &mut graph);

        assert_eq!(resolve(&ctx, false).unwrap(), AxesSpec::AllDynamic);
    }

    #[test]
    fn test_dynamic_all_axes_subgraph() {
        let node = Node::new("ReduceSum");

        let mut graph = IrGraph::new();
        let data = data_value(&mut graph, TensorShape::Unknown);
        let mut ctx = LowerCtx::new(&node, 1, vec![data], &mut graph);

        let range = dynamic_all_axes(&mut ctx).unwrap();
        assert_eq!(ctx.value_dtype(range).unwrap(), DataType::I64);

        // shape-of, shape-of, squeeze axis const, squeeze, start, step, range
        let producer = graph.value_producer(range).unwrap();
        let range_node = graph.node(producer).unwrap();
        assert!(matches!(
            range_node.op,
            Op::Range {
                dtype: DataType::I64
            }
        ));

        let ops: Vec<&'static str> = graph
            .topological_order()
            .into_iter()
            .map(|id| graph.node(id).unwrap().op.name())
            .collect();
        assert!(ops.contains(&"shape_of"));
        assert!(ops.contains(&"squeeze"));
        assert!(ops.contains(&"range"));
    }
}
