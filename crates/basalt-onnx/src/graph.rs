//! Graph representation for ONNX models.
//!
//! This module defines the structured graph representation of ONNX models,
//! providing a stable API independent of the underlying serialization
//! schema.

use crate::{OnnxError, Result};
use std::collections::HashMap;

/// Unique identifier for a node in the graph.
pub type NodeId = usize;

/// Unique identifier for a tensor in the graph.
pub type TensorId = usize;

/// Internal graph representation of an ONNX model.
#[derive(Debug, Clone)]
pub struct Graph {
    /// All nodes (operations) in the graph.
    pub nodes: Vec<Node>,

    /// All tensors in the graph, indexed by name.
    pub tensors: HashMap<String, TensorId>,

    /// Tensor metadata.
    pub tensor_info: Vec<TensorInfo>,

    /// Names of input tensors.
    pub inputs: Vec<String>,

    /// Names of output tensors.
    pub outputs: Vec<String>,

    /// Graph metadata.
    pub metadata: GraphMetadata,
}

/// Metadata about the graph.
#[derive(Debug, Clone, Default)]
pub struct GraphMetadata {
    /// Graph name (from ONNX).
    pub name: String,

    /// IR version.
    pub ir_version: i64,

    /// Opset version of the default operator domain.
    ///
    /// Operators may change input/attribute conventions between opsets;
    /// translator dispatch keys on this value.
    pub opset_version: i64,

    /// Producer name.
    pub producer_name: String,

    /// Model version.
    pub model_version: i64,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            tensors: HashMap::new(),
            tensor_info: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            metadata: GraphMetadata::default(),
        }
    }

    /// Get tensor ID by name.
    pub fn tensor_id(&self, name: &str) -> Result<TensorId> {
        self.tensors
            .get(name)
            .copied()
            .ok_or_else(|| OnnxError::MissingTensor(name.to_string()))
    }

    /// Get tensor info by ID.
    pub fn tensor(&self, id: TensorId) -> Result<&TensorInfo> {
        self.tensor_info
            .get(id)
            .ok_or_else(|| OnnxError::InvalidGraph(format!("Invalid tensor ID: {}", id)))
    }

    /// Get tensor info by name.
    pub fn tensor_by_name(&self, name: &str) -> Result<&TensorInfo> {
        let id = self.tensor_id(name)?;
        self.tensor(id)
    }

    /// Add a tensor to the graph.
    pub fn add_tensor(&mut self, info: TensorInfo) -> TensorId {
        let id = self.tensor_info.len();
        let name = info.name.clone();
        self.tensor_info.push(info);
        self.tensors.insert(name, id);
        id
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Validate graph structure.
    pub fn validate(&self) -> Result<()> {
        // Check that all inputs exist
        for input in &self.inputs {
            self.tensor_id(input)?;
        }

        // Check that all outputs exist
        for output in &self.outputs {
            self.tensor_id(output)?;
        }

        // Check that all node inputs reference valid tensors
        for node in &self.nodes {
            for input in &node.inputs {
                // Skip empty inputs (ONNX uses "" for optional inputs)
                if !input.is_empty() {
                    self.tensor_id(input)?;
                }
            }
        }

        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// A node (operation) in the graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name (from ONNX, may be empty).
    pub name: String,

    /// Operation type (e.g., "ReduceSum", "Add", "Conv").
    pub op_type: String,

    /// Input tensor names.
    pub inputs: Vec<String>,

    /// Output tensor names.
    pub outputs: Vec<String>,

    /// Node attributes.
    pub attributes: HashMap<String, AttributeValue>,

    /// Domain (for custom operators).
    pub domain: String,
}

impl Node {
    /// Create a new node.
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            op_type: op_type.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: HashMap::new(),
            domain: String::new(),
        }
    }

    /// Get an attribute value.
    ///
    /// Fails with `MissingAttribute` if the attribute is absent and with
    /// `TypeMismatch` if the stored value has a different type than `T`.
    pub fn attr<T>(&self, name: &str) -> Result<T>
    where
        T: TryFrom<AttributeValue>,
        T::Error: std::fmt::Display,
    {
        let value = self
            .attributes
            .get(name)
            .ok_or_else(|| OnnxError::MissingAttribute(name.to_string()))?;

        T::try_from(value.clone()).map_err(|e| OnnxError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: format!("{}", e),
        })
    }

    /// Get an attribute value, falling back to a default when absent.
    ///
    /// A present attribute of the wrong type is still an error; only a
    /// missing attribute yields the default.
    pub fn attr_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: TryFrom<AttributeValue>,
        T::Error: std::fmt::Display,
    {
        match self.attributes.get(name) {
            None => Ok(default),
            Some(value) => {
                T::try_from(value.clone()).map_err(|e| OnnxError::TypeMismatch {
                    expected: std::any::type_name::<T>().to_string(),
                    actual: format!("{}", e),
                })
            }
        }
    }

    /// Check if an attribute exists.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Human-readable identification of this node for diagnostics.
    pub fn description(&self) -> String {
        if self.name.is_empty() {
            format!("<{}>", self.op_type)
        } else {
            format!("{} <{}>", self.name, self.op_type)
        }
    }
}

/// Attribute value types.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
    String(String),
    Tensor(Vec<u8>),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
}

impl TryFrom<AttributeValue> for f32 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Float(v) => Ok(v),
            _ => Err("Not a float".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for i64 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Int(v) => Ok(v),
            _ => Err("Not an int".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for String {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::String(v) => Ok(v),
            _ => Err("Not a string".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for Vec<i64> {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Ints(v) => Ok(v),
            _ => Err("Not an int array".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for Vec<f32> {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Floats(v) => Ok(v),
            _ => Err("Not a float array".to_string()),
        }
    }
}

/// Information about a tensor.
#[derive(Debug, Clone)]
pub struct TensorInfo {
    /// Tensor name.
    pub name: String,

    /// Data type.
    pub dtype: DataType,

    /// Tensor shape.
    pub shape: TensorShape,

    /// Tensor kind (input, output, weight, intermediate).
    pub kind: TensorKind,

    /// Initializer data in little-endian layout (for weights).
    pub initializer: Option<Vec<u8>>,
}

/// Data types supported by ONNX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    F16,
    BF16,
    F32,
    F64,
    I32,
    I64,
    U8,
    U32,
    U64,
    Bool,
}

impl DataType {
    /// Size of this data type in bytes.
    pub fn size(&self) -> usize {
        match self {
            DataType::U8 | DataType::Bool => 1,
            DataType::F16 | DataType::BF16 => 2,
            DataType::F32 | DataType::I32 | DataType::U32 => 4,
            DataType::F64 | DataType::I64 | DataType::U64 => 8,
        }
    }

    /// Whether this is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            DataType::F16 | DataType::BF16 | DataType::F32 | DataType::F64
        )
    }
}

/// Tensor shape representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TensorShape {
    /// Static shape (all dimensions known).
    Static(Vec<usize>),

    /// Known rank with some symbolic dimensions.
    Dynamic(Vec<Dimension>),

    /// Unknown/unspecified shape (rank not known).
    Unknown,

    /// Optional input that is absent (ONNX empty string).
    Absent,
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
            TensorShape::Unknown | TensorShape::Absent => None,
        }
    }
}

/// A single dimension in a tensor shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Static dimension with known size.
    Static(usize),

    /// Named symbolic dimension (e.g., "batch", "sequence", "N").
    /// The actual value is only known at runtime.
    Named(String),
}

/// Kind of tensor (determines storage and lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorKind {
    /// Model input (provided by user).
    Input,

    /// Model output (returned to user).
    Output,

    /// Static weight from ONNX (embedded in the model).
    Weight,

    /// Intermediate value computed during execution.
    Intermediate,
}
