//! Translators for the reduction operator family.
//!
//! Covers ReduceSum, ReduceMean, ReduceMin, ReduceMax, ReduceProd,
//! ReduceL1, ReduceL2, ReduceLogSum, ReduceLogSumExp, ReduceSumSquare.
//!
//! All of them share one builder: read `keepdims`, validate the input
//! element type, resolve the axes, then emit a single reduction node (or
//! pass the input through unchanged for an explicit no-op). The log and
//! square variants wrap the builder with one elementwise node on either
//! side.

use crate::axes::{self, AxesSpec};
use crate::ctx::LowerCtx;
use crate::error::Result;
use crate::validate;
use basalt_ir::{DataType, ReduceKind, ValueId};

/// Element types accepted by the attribute-era reduction operators.
pub(crate) const SUPPORTED_TYPES_V1: &[DataType] = &[
    DataType::U32,
    DataType::U64,
    DataType::I32,
    DataType::I64,
    DataType::F16,
    DataType::F32,
    DataType::F64,
];

/// Element types accepted from opset 13 on (adds bfloat16).
pub(crate) const SUPPORTED_TYPES_V2: &[DataType] = &[
    DataType::U32,
    DataType::U64,
    DataType::I32,
    DataType::I64,
    DataType::F16,
    DataType::F32,
    DataType::F64,
    DataType::BF16,
];

/// Shared lowering for all reduction operators.
///
/// `input` is the value being reduced, which is not necessarily the
/// node's first input (the log-sum-exp and sum-square translators reduce
/// a derived value). Returns the input unchanged when axis resolution
/// yields an explicit no-op.
fn build_reduction(
    ctx: &mut LowerCtx,
    input: ValueId,
    kind: ReduceKind,
    supported: &[DataType],
    axes_from_attribute: bool,
) -> Result<ValueId> {
    let keep_dims = ctx.attr_or::<i64>("keepdims", 1)? != 0;

    validate::element_type(ctx, input, supported)?;

    let axes = match axes::resolve(ctx, axes_from_attribute)? {
        AxesSpec::NoAxes => return Ok(input),
        AxesSpec::Values(values) => ctx.builder().const_i64s(values),
        AxesSpec::Input(axes) => axes,
        AxesSpec::AllDynamic => axes::dynamic_all_axes(ctx)?,
    };

    Ok(ctx.builder().reduce(kind, input, axes, keep_dims)?)
}

pub fn reduce_sum(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    Ok(vec![build_reduction(
        ctx,
        data,
        ReduceKind::Sum,
        SUPPORTED_TYPES_V1,
        true,
    )?])
}

/// ReduceSum from opset 13 on: axes move from an attribute to an optional
/// second input and bfloat16 becomes legal.
pub fn reduce_sum_axes_input(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    Ok(vec![build_reduction(
        ctx,
        data,
        ReduceKind::Sum,
        SUPPORTED_TYPES_V2,
        false,
    )?])
}

pub fn reduce_mean(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    Ok(vec![build_reduction(
        ctx,
        data,
        ReduceKind::Mean,
        SUPPORTED_TYPES_V1,
        true,
    )?])
}

pub fn reduce_min(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    Ok(vec![build_reduction(
        ctx,
        data,
        ReduceKind::Min,
        SUPPORTED_TYPES_V1,
        true,
    )?])
}

pub fn reduce_max(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    Ok(vec![build_reduction(
        ctx,
        data,
        ReduceKind::Max,
        SUPPORTED_TYPES_V1,
        true,
    )?])
}

pub fn reduce_prod(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    Ok(vec![build_reduction(
        ctx,
        data,
        ReduceKind::Prod,
        SUPPORTED_TYPES_V1,
        true,
    )?])
}

pub fn reduce_l1(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    Ok(vec![build_reduction(
        ctx,
        data,
        ReduceKind::L1,
        SUPPORTED_TYPES_V1,
        true,
    )?])
}

pub fn reduce_l2(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    Ok(vec![build_reduction(
        ctx,
        data,
        ReduceKind::L2,
        SUPPORTED_TYPES_V1,
        true,
    )?])
}

pub fn reduce_log_sum(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    let sum = build_reduction(ctx, data, ReduceKind::Sum, SUPPORTED_TYPES_V1, true)?;
    Ok(vec![ctx.builder().log(sum)?])
}

/// log(sum(exp(x))). No stability shift is applied before `exp`; the
/// lowering is the plain decomposition.
pub fn reduce_log_sum_exp(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    // Validate before synthesizing the exp node so a bad input type
    // leaves the graph untouched.
    validate::element_type(ctx, data, SUPPORTED_TYPES_V1)?;

    let exp = ctx.builder().exp(data)?;
    let sum = build_reduction(ctx, exp, ReduceKind::Sum, SUPPORTED_TYPES_V1, true)?;
    Ok(vec![ctx.builder().log(sum)?])
}

/// sum(x * x), squaring elementwise before the reduction.
pub fn reduce_sum_square(ctx: &mut LowerCtx) -> Result<Vec<ValueId>> {
    let data = ctx.input(0)?;
    validate::element_type(ctx, data, SUPPORTED_TYPES_V1)?;

    let square = ctx.builder().multiply(data, data)?;
    Ok(vec![build_reduction(
        ctx,
        square,
        ReduceKind::Sum,
        SUPPORTED_TYPES_V1,
        true,
    )?])
}
