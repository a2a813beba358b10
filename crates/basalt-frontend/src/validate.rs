//! Input validation shared by operator translators.

use crate::ctx::LowerCtx;
use crate::error::{LowerError, Result};
use basalt_ir::{DataType, ValueId};

/// Check that a value's element type is a member of `supported`.
pub fn element_type(ctx: &LowerCtx, value: ValueId, supported: &[DataType]) -> Result<()> {
    let dtype = ctx.value_dtype(value)?;
    if supported.contains(&dtype) {
        Ok(())
    } else {
        Err(LowerError::UnsupportedType {
            node: ctx.description(),
            dtype,
        })
    }
}

/// Check that the number of reduction axes does not exceed the input
/// rank.
pub fn axes_within_rank(ctx: &LowerCtx, count: usize, rank: usize) -> Result<()> {
    if count > rank {
        Err(LowerError::AxesRankTooLarge {
            node: ctx.description(),
            count,
            rank,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_ir::{IrGraph, TensorShape, Value};
    use basalt_onnx::Node;

    #[test]
    fn test_element_type_membership() {
        let node = Node::new("ReduceSum");
        let mut graph = IrGraph::new();
        let data = graph.add_value(Value::new(
            "data".to_string(),
            DataType::Bool,
            TensorShape::Static(vec![2]),
        ));
        let ctx = LowerCtx::new(&node, 1, vec![data], &mut graph);

        assert!(element_type(&ctx, data, &[DataType::Bool]).is_ok());

        let err = element_type(&ctx, data, &[DataType::F32, DataType::I64]).unwrap_err();
        assert!(matches!(
            err,
            LowerError::UnsupportedType {
                dtype: DataType::Bool,
                ..
            }
        ));
    }

    #[test]
    fn test_axes_within_rank() {
        let node = Node::new("ReduceSum");
        let mut graph = IrGraph::new();
        let ctx = LowerCtx::new(&node, 1, vec![], &mut graph);

        assert!(axes_within_rank(&ctx, 2, 2).is_ok());
        assert!(matches!(
            axes_within_rank(&ctx, 3, 2),
            Err(LowerError::AxesRankTooLarge {
                count: 3,
                rank: 2,
                ..
            })
        ));
    }
}
