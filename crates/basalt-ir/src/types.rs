//! Core types for tensor shapes and compile-time values.

use crate::{Error, Result};
use basalt_onnx::DataType;

/// Tensor shape with support for static, partially static, and unknown
/// shapes.
///
/// A partially static shape has a known rank but some dimensions are only
/// known at runtime. A fully unknown shape has no known rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TensorShape {
    /// All dimensions are known at graph-construction time.
    Static(Vec<usize>),

    /// Known rank, some dimensions unknown.
    Dynamic(Vec<Dim>),

    /// Rank not known until runtime.
    Unknown,
}

impl TensorShape {
    /// Check if the shape is fully static.
    pub fn is_static(&self) -> bool {
        matches!(self, TensorShape::Static(_))
    }

    /// Get static dimensions if available.
    pub fn as_static(&self) -> Option<&[usize]> {
        match self {
            TensorShape::Static(dims) => Some(dims),
            _ => None,
        }
    }

    /// Number of dimensions, if the rank is known.
    pub fn ndim(&self) -> Option<usize> {
        match self {
            TensorShape::Static(dims) => Some(dims.len()),
            TensorShape::Dynamic(dims) => Some(dims.len()),
            TensorShape::Unknown => None,
        }
    }

    /// Total element count, if fully static.
    pub fn numel(&self) -> Option<usize> {
        self.as_static().map(|dims| dims.iter().product())
    }

    /// Convert a source-graph shape into an IR shape.
    ///
    /// Named symbolic dimensions become unknown dimensions; there is no
    /// symbol resolution at this layer. Absent shapes have no IR value and
    /// are rejected.
    pub fn from_onnx(onnx_shape: &basalt_onnx::TensorShape) -> Result<Self> {
        match onnx_shape {
            basalt_onnx::TensorShape::Static(dims) => Ok(TensorShape::Static(dims.clone())),
            basalt_onnx::TensorShape::Dynamic(dims) => {
                let dims = dims
                    .iter()
                    .map(|dim| match dim {
                        basalt_onnx::Dimension::Static(n) => Dim::Fixed(*n),
                        basalt_onnx::Dimension::Named(_) => Dim::Unknown,
                    })
                    .collect();
                Ok(TensorShape::Dynamic(dims))
            }
            basalt_onnx::TensorShape::Unknown => Ok(TensorShape::Unknown),
            basalt_onnx::TensorShape::Absent => Err(Error::Shape(
                "absent tensors have no IR value".to_string(),
            )),
        }
    }
}

/// A single dimension in a partially static tensor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    /// Compile-time constant dimension.
    Fixed(usize),

    /// Dimension only known at runtime.
    Unknown,
}

impl Dim {
    /// Get the fixed value if available.
    pub fn as_fixed(&self) -> Option<usize> {
        match self {
            Dim::Fixed(n) => Some(*n),
            Dim::Unknown => None,
        }
    }
}

/// Raw tensor data for compile-time constants.
///
/// Separated from metadata (shape, dtype) to enable flexible tensor
/// operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    I64(Vec<i64>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    Bool(Vec<bool>),
    U8(Vec<u8>),
}

impl TensorData {
    /// Get the number of elements in this tensor data.
    pub fn len(&self) -> usize {
        match self {
            TensorData::I64(v) => v.len(),
            TensorData::I32(v) => v.len(),
            TensorData::F32(v) => v.len(),
            TensorData::Bool(v) => v.len(),
            TensorData::U8(v) => v.len(),
        }
    }

    /// Check if this tensor data is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Try to get as i64 slice.
    pub fn as_i64(&self) -> Option<&[i64]> {
        match self {
            TensorData::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as i32 slice.
    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            TensorData::I32(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as f32 slice.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            TensorData::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Get the inferred data type from this tensor data.
    pub fn dtype(&self) -> DataType {
        match self {
            TensorData::I64(_) => DataType::I64,
            TensorData::I32(_) => DataType::I32,
            TensorData::F32(_) => DataType::F32,
            TensorData::Bool(_) => DataType::Bool,
            TensorData::U8(_) => DataType::U8,
        }
    }
}

/// A tensor value known at graph-construction time.
///
/// Bundles data, shape, and dtype together. Only small tensors are stored
/// (axes lists, shape metadata, scalars); large weights stay with the
/// source graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorValue {
    /// The raw tensor data.
    pub data: TensorData,

    /// The shape of the tensor (dimensions).
    pub shape: Vec<usize>,

    /// The data type of the tensor.
    pub dtype: DataType,
}

impl TensorValue {
    /// Create a new TensorValue with data, shape, and dtype.
    ///
    /// # Panics
    ///
    /// Panics if the data length doesn't match the shape product.
    pub fn new(data: TensorData, shape: Vec<usize>, dtype: DataType) -> Self {
        let expected_len: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected_len,
            "Data length {} doesn't match shape {:?} (product = {})",
            data.len(),
            shape,
            expected_len
        );
        assert_eq!(
            data.dtype(),
            dtype,
            "Data type {:?} doesn't match declared dtype {:?}",
            data.dtype(),
            dtype
        );
        Self { data, shape, dtype }
    }

    /// Create a scalar TensorValue (shape = []).
    pub fn scalar(data: TensorData, dtype: DataType) -> Self {
        Self::new(data, vec![], dtype)
    }

    /// Get the number of elements in this tensor value.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if this tensor value is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Try to get as i64 slice.
    pub fn as_i64(&self) -> Option<&[i64]> {
        self.data.as_i64()
    }

    /// Try to get as i32 slice.
    pub fn as_i32(&self) -> Option<&[i32]> {
        self.data.as_i32()
    }

    /// Try to get as f32 slice.
    pub fn as_f32(&self) -> Option<&[f32]> {
        self.data.as_f32()
    }

    /// Parse a TensorValue from initializer bytes.
    ///
    /// # Arguments
    /// * `bytes` - Raw tensor data in little-endian format
    /// * `dtype` - Data type of the tensor
    /// * `shape` - Shape of the tensor (must be static)
    pub fn from_bytes(bytes: &[u8], dtype: DataType, shape: &[usize]) -> Result<Self> {
        let numel: usize = shape.iter().product();

        let data = match dtype {
            DataType::I64 => {
                if bytes.len() != numel * 8 {
                    return Err(Error::Value(format!(
                        "Invalid byte length for I64 tensor: expected {}, got {}",
                        numel * 8,
                        bytes.len()
                    )));
                }
                let values = bytes
                    .chunks_exact(8)
                    .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap()))
                    .collect();
                TensorData::I64(values)
            }
            DataType::I32 => {
                if bytes.len() != numel * 4 {
                    return Err(Error::Value(format!(
                        "Invalid byte length for I32 tensor: expected {}, got {}",
                        numel * 4,
                        bytes.len()
                    )));
                }
                let values = bytes
                    .chunks_exact(4)
                    .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap()))
                    .collect();
                TensorData::I32(values)
            }
            DataType::F32 => {
                if bytes.len() != numel * 4 {
                    return Err(Error::Value(format!(
                        "Invalid byte length for F32 tensor: expected {}, got {}",
                        numel * 4,
                        bytes.len()
                    )));
                }
                let values = bytes
                    .chunks_exact(4)
                    .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
                    .collect();
                TensorData::F32(values)
            }
            DataType::U8 => TensorData::U8(bytes.to_vec()),
            DataType::Bool => TensorData::Bool(bytes.iter().map(|&b| b != 0).collect()),
            _ => {
                return Err(Error::Value(format!(
                    "from_bytes not implemented for {:?}",
                    dtype
                )));
            }
        };

        Ok(TensorValue::new(data, shape.to_vec(), dtype))
    }
}
