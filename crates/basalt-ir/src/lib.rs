//! Target intermediate representation for the basalt frontend.
//!
//! This crate provides the graph the lowering subsystem constructs:
//! - Graph-based IR (`IrGraph`, `IrNode`, `Value`)
//! - Typed operation kinds (`Op`, `ReduceKind`)
//! - Construction primitives for synthesizing nodes (`GraphBuilder`)

pub mod builder;
pub mod graph;
pub mod types;

pub use builder::GraphBuilder;
pub use graph::{IrGraph, IrNode, IrNodeId, Op, ReduceKind, Value, ValueId};
pub use types::{Dim, TensorData, TensorShape, TensorValue};

// Element types are shared with the source-side crate.
pub use basalt_onnx::DataType;

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for IR construction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Value error: {0}")]
    Value(String),
}
