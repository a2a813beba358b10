//! Construction primitives for synthesizing IR nodes.
//!
//! `GraphBuilder` is the interface operator translators use to append
//! nodes to the IR under construction. Each primitive emits exactly one
//! node and types its result value locally: result element types follow
//! the operation, result shapes are computed when inputs are static and
//! degrade to partially static or unknown otherwise.

use crate::graph::{IrGraph, IrNode, Op, ReduceKind, Value, ValueId};
use crate::types::{Dim, TensorData, TensorShape, TensorValue};
use crate::{Error, Result};
use basalt_onnx::DataType;

/// Builder appending nodes to an [`IrGraph`].
///
/// Value names are derived from a prefix (usually the source node name)
/// plus a running counter, keeping names unique within the graph.
pub struct GraphBuilder<'g> {
    graph: &'g mut IrGraph,
    prefix: String,
    next: usize,
}

impl<'g> GraphBuilder<'g> {
    /// Create a builder over `graph` naming values under `prefix`.
    pub fn new(graph: &'g mut IrGraph, prefix: impl Into<String>) -> Self {
        Self {
            graph,
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Read access to the graph under construction.
    pub fn graph(&self) -> &IrGraph {
        self.graph
    }

    /// Element type of a value.
    pub fn value_dtype(&self, id: ValueId) -> Result<DataType> {
        Ok(self.graph.value(id)?.dtype)
    }

    /// Shape of a value.
    pub fn value_shape(&self, id: ValueId) -> Result<TensorShape> {
        Ok(self.graph.value(id)?.shape.clone())
    }

    fn fresh_name(&mut self, op: &str) -> String {
        let n = self.next;
        self.next += 1;
        if self.prefix.is_empty() {
            format!("{}_{}", op, n)
        } else {
            format!("{}/{}_{}", self.prefix, op, n)
        }
    }

    /// Append one node producing one value.
    fn emit(
        &mut self,
        op: Op,
        inputs: Vec<ValueId>,
        dtype: DataType,
        shape: TensorShape,
    ) -> ValueId {
        let name = self.fresh_name(op.name());
        let out = self.graph.add_value(Value::new(name.clone(), dtype, shape));

        let mut node = IrNode::new(name, op);
        for input in inputs {
            node.add_input(input);
        }
        node.add_output(out);
        self.graph.add_node(node);

        out
    }

    // ── Primitives ──

    /// Create a compile-time constant.
    pub fn constant(&mut self, value: TensorValue) -> ValueId {
        let dtype = value.dtype;
        let shape = TensorShape::Static(value.shape.clone());
        self.emit(Op::Constant(value), vec![], dtype, shape)
    }

    /// Create a 1-D i64 constant (the usual encoding of an axes list).
    pub fn const_i64s(&mut self, values: Vec<i64>) -> ValueId {
        let len = values.len();
        self.constant(TensorValue::new(
            TensorData::I64(values),
            vec![len],
            DataType::I64,
        ))
    }

    /// Create a scalar i64 constant.
    pub fn scalar_i64(&mut self, value: i64) -> ValueId {
        self.constant(TensorValue::scalar(TensorData::I64(vec![value]), DataType::I64))
    }

    /// Query the shape of a value as a 1-D i64 tensor.
    pub fn shape_of(&mut self, input: ValueId) -> Result<ValueId> {
        let shape = match self.value_shape(input)?.ndim() {
            Some(rank) => TensorShape::Static(vec![rank]),
            None => TensorShape::Dynamic(vec![Dim::Unknown]),
        };
        Ok(self.emit(Op::ShapeOf, vec![input], DataType::I64, shape))
    }

    /// Remove the size-1 dimensions listed by `axes` from `data`.
    pub fn squeeze(&mut self, data: ValueId, axes: ValueId) -> Result<ValueId> {
        let dtype = self.value_dtype(data)?;
        let data_shape = self.value_shape(data)?;
        let axes_list = self.constant_axes(axes)?;

        let shape = match (&data_shape, axes_list) {
            (TensorShape::Static(dims), Some(list)) => {
                let remove = normalize_axes(&list, dims.len())?;
                for &axis in &remove {
                    if dims[axis] != 1 {
                        return Err(Error::Shape(format!(
                            "cannot squeeze dimension {} of size {}",
                            axis, dims[axis]
                        )));
                    }
                }
                let kept: Vec<usize> = dims
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !remove.contains(i))
                    .map(|(_, &d)| d)
                    .collect();
                TensorShape::Static(kept)
            }
            (TensorShape::Dynamic(dims), Some(list)) => {
                let remove = normalize_axes(&list, dims.len())?;
                let kept: Vec<Dim> = dims
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !remove.contains(i))
                    .map(|(_, &d)| d)
                    .collect();
                if kept.iter().all(|d| d.as_fixed().is_some()) {
                    TensorShape::Static(kept.iter().map(|d| d.as_fixed().unwrap()).collect())
                } else {
                    TensorShape::Dynamic(kept)
                }
            }
            _ => TensorShape::Unknown,
        };

        Ok(self.emit(Op::Squeeze, vec![data, axes], dtype, shape))
    }

    /// Generate `[start, stop)` with the given step as a 1-D tensor.
    ///
    /// The length is generally only known at runtime.
    pub fn range(
        &mut self,
        start: ValueId,
        stop: ValueId,
        step: ValueId,
        dtype: DataType,
    ) -> ValueId {
        self.emit(
            Op::Range { dtype },
            vec![start, stop, step],
            dtype,
            TensorShape::Dynamic(vec![Dim::Unknown]),
        )
    }

    /// Elementwise exponential.
    pub fn exp(&mut self, input: ValueId) -> Result<ValueId> {
        let dtype = self.value_dtype(input)?;
        let shape = self.value_shape(input)?;
        Ok(self.emit(Op::Exp, vec![input], dtype, shape))
    }

    /// Elementwise natural logarithm.
    pub fn log(&mut self, input: ValueId) -> Result<ValueId> {
        let dtype = self.value_dtype(input)?;
        let shape = self.value_shape(input)?;
        Ok(self.emit(Op::Log, vec![input], dtype, shape))
    }

    /// Elementwise product with broadcasting.
    pub fn multiply(&mut self, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        let lhs_dtype = self.value_dtype(lhs)?;
        let rhs_dtype = self.value_dtype(rhs)?;
        if lhs_dtype != rhs_dtype {
            return Err(Error::Value(format!(
                "multiply operands differ in element type: {:?} vs {:?}",
                lhs_dtype, rhs_dtype
            )));
        }

        let lhs_shape = self.value_shape(lhs)?;
        let rhs_shape = self.value_shape(rhs)?;
        let shape = match (&lhs_shape, &rhs_shape) {
            (TensorShape::Static(a), TensorShape::Static(b)) => {
                TensorShape::Static(broadcast_shapes(&[a, b])?)
            }
            (a, b) if a == b => lhs_shape.clone(),
            _ => TensorShape::Unknown,
        };

        Ok(self.emit(Op::Multiply, vec![lhs, rhs], lhs_dtype, shape))
    }

    /// Reduce `data` over the axes given by the `axes` value.
    ///
    /// When `keep_dims` is set, reduced axes are retained as size-1
    /// dimensions; otherwise they are removed from the output shape.
    pub fn reduce(
        &mut self,
        kind: ReduceKind,
        data: ValueId,
        axes: ValueId,
        keep_dims: bool,
    ) -> Result<ValueId> {
        let dtype = self.value_dtype(data)?;
        let data_shape = self.value_shape(data)?;

        let axes_dtype = self.value_dtype(axes)?;
        if !matches!(axes_dtype, DataType::I64 | DataType::I32) {
            return Err(Error::Value(format!(
                "reduction axes must be integer, got {:?}",
                axes_dtype
            )));
        }

        let axes_list = self.constant_axes(axes)?;
        let shape = match (axes_list, &data_shape) {
            (Some(list), shape) if shape.ndim().is_some() => {
                let rank = shape.ndim().unwrap();
                let reduced = normalize_axes(&list, rank)?;
                match shape {
                    TensorShape::Static(dims) => {
                        let out = reduce_dims(dims, &reduced, keep_dims, |_| 1usize);
                        TensorShape::Static(out)
                    }
                    TensorShape::Dynamic(dims) => {
                        let out = reduce_dims(dims, &reduced, keep_dims, |_| Dim::Fixed(1));
                        if out.iter().all(|d| d.as_fixed().is_some()) {
                            TensorShape::Static(
                                out.iter().map(|d| d.as_fixed().unwrap()).collect(),
                            )
                        } else {
                            TensorShape::Dynamic(out)
                        }
                    }
                    TensorShape::Unknown => unreachable!(),
                }
            }
            // Axes known but rank unknown.
            (Some(_), _) => TensorShape::Unknown,
            // Runtime axes: only the rank (under keep_dims) is predictable.
            (None, shape) => {
                if keep_dims {
                    match shape.ndim() {
                        Some(rank) => TensorShape::Dynamic(vec![Dim::Unknown; rank]),
                        None => TensorShape::Unknown,
                    }
                } else {
                    TensorShape::Unknown
                }
            }
        };

        Ok(self.emit(Op::Reduce { kind, keep_dims }, vec![data, axes], dtype, shape))
    }

    /// Read an axes value back as a constant list, if its producer is a
    /// constant node.
    fn constant_axes(&self, axes: ValueId) -> Result<Option<Vec<i64>>> {
        match self.graph.constant_value(axes) {
            None => Ok(None),
            Some(tv) => match &tv.data {
                TensorData::I64(v) => Ok(Some(v.clone())),
                TensorData::I32(v) => Ok(Some(v.iter().map(|&x| x as i64).collect())),
                other => Err(Error::Value(format!(
                    "axes constant must be integer, got {:?}",
                    other.dtype()
                ))),
            },
        }
    }
}

/// Normalize possibly-negative axes into `0..rank` indices.
fn normalize_axes(axes: &[i64], rank: usize) -> Result<Vec<usize>> {
    let mut normalized = Vec::with_capacity(axes.len());
    for &axis in axes {
        let resolved = if axis < 0 { axis + rank as i64 } else { axis };
        if resolved < 0 || resolved >= rank as i64 {
            return Err(Error::Shape(format!(
                "axis {} out of bounds for rank {}",
                axis, rank
            )));
        }
        normalized.push(resolved as usize);
    }
    Ok(normalized)
}

/// Apply reduction to a dimension list: reduced positions become
/// `one(d)` under keep_dims, or are dropped entirely otherwise.
fn reduce_dims<T: Copy>(
    dims: &[T],
    reduced: &[usize],
    keep_dims: bool,
    one: impl Fn(T) -> T,
) -> Vec<T> {
    let mut out = Vec::with_capacity(dims.len());
    for (i, &dim) in dims.iter().enumerate() {
        if reduced.contains(&i) {
            if keep_dims {
                out.push(one(dim));
            }
        } else {
            out.push(dim);
        }
    }
    out
}

/// Broadcast multiple shapes to a common output shape.
///
/// Implements NumPy-style broadcasting rules:
/// - Shapes are aligned from the rightmost dimension
/// - Dimensions match if they are equal or one of them is 1
/// - Missing dimensions in shorter shapes are treated as 1
fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    if shapes.is_empty() {
        return Ok(vec![]);
    }

    let max_rank = shapes.iter().map(|s| s.len()).max().unwrap();
    let mut result = vec![1; max_rank];

    for shape in shapes {
        let rank = shape.len();

        // Iterate from the rightmost dimension
        for i in 0..max_rank {
            let shape_dim = if i < rank { shape[rank - 1 - i] } else { 1 };

            let result_idx = max_rank - 1 - i;
            let dim = result[result_idx];

            if dim == 1 {
                result[result_idx] = shape_dim;
            } else if shape_dim != 1 && shape_dim != dim {
                return Err(Error::Shape(format!(
                    "Cannot broadcast shapes: dimension mismatch at position {} (expected {} or 1, got {})",
                    result_idx, dim, shape_dim
                )));
            }
        }
    }

    Ok(result)
}
