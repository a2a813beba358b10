//! Source-side data model for the basalt ONNX frontend.
//!
//! This crate provides a structured view of an ONNX model graph (nodes,
//! tensors, attributes, and types) independent of any serialization
//! format. The importer that decodes model files produces these values;
//! `basalt-frontend` consumes them when lowering operators into the
//! target IR.

use thiserror::Error;

pub mod graph;

pub use graph::{
    AttributeValue, DataType, Dimension, Graph, GraphMetadata, Node, NodeId, TensorId, TensorInfo,
    TensorKind, TensorShape,
};

/// Errors that can occur when inspecting source graphs.
#[derive(Debug, Error)]
pub enum OnnxError {
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Missing tensor: {0}")]
    MissingTensor(String),

    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),
}

/// Result type for source graph operations.
pub type Result<T> = std::result::Result<T, OnnxError>;
