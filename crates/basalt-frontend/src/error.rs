//! Error types for operator lowering.
//!
//! All lowering failures are import-time and non-recoverable for the
//! affected node: they propagate to the caller, which is expected to
//! abort the whole import. Variants produced during translation carry the
//! source node's description for diagnostics.

use basalt_ir::DataType;
use basalt_onnx::OnnxError;
use thiserror::Error;

/// Result type for lowering operations.
pub type Result<T> = std::result::Result<T, LowerError>;

/// Failures that can occur while lowering a source operator.
#[derive(Debug, Error)]
pub enum LowerError {
    #[error("Unsupported input type {dtype:?} for node {node}")]
    UnsupportedType { node: String, dtype: DataType },

    #[error(
        "Number of reduction axes ({count}) is larger than the input tensor's rank ({rank}) for node {node}"
    )]
    AxesRankTooLarge {
        node: String,
        count: usize,
        rank: usize,
    },

    #[error("The axes tensor's shape needs to be known (static) for node {node}")]
    NonStaticAxesShape { node: String },

    #[error("No translator registered for {op} at opset version {version}")]
    NoTranslatorFound { op: String, version: i64 },

    #[error("Node {node} is missing input {index}")]
    MissingInput { node: String, index: usize },

    #[error("{context} references unknown tensor '{tensor}'")]
    UnknownTensor { context: String, tensor: String },

    #[error("{source} for node {node}")]
    Attribute { node: String, source: OnnxError },

    #[error(transparent)]
    Onnx(#[from] OnnxError),

    #[error(transparent)]
    Ir(#[from] basalt_ir::Error),
}
