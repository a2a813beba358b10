//! Per-node lowering context.

use crate::error::{LowerError, Result};
use basalt_ir::{DataType, GraphBuilder, IrGraph, TensorShape, ValueId};
use basalt_onnx::{AttributeValue, Node};

/// The view of a source operator handed to translators.
///
/// Bundles the source node, the opset version it was authored against, the
/// node's already-resolved input values, and a builder over the IR under
/// construction. Contexts are created per source node and discarded after
/// translation.
pub struct LowerCtx<'a> {
    node: &'a Node,
    opset: i64,
    inputs: Vec<ValueId>,
    builder: GraphBuilder<'a>,
}

impl<'a> LowerCtx<'a> {
    /// Create a context for one source node.
    pub fn new(node: &'a Node, opset: i64, inputs: Vec<ValueId>, graph: &'a mut IrGraph) -> Self {
        let prefix = if node.name.is_empty() {
            node.op_type.clone()
        } else {
            node.name.clone()
        };
        Self {
            node,
            opset,
            inputs,
            builder: GraphBuilder::new(graph, prefix),
        }
    }

    /// The source node being lowered.
    pub fn node(&self) -> &Node {
        self.node
    }

    /// The opset version the node was authored against.
    pub fn opset_version(&self) -> i64 {
        self.opset
    }

    /// Human-readable identification of the node for diagnostics.
    pub fn description(&self) -> String {
        self.node.description()
    }

    /// Number of inputs supplied to this node.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// The value of a required input.
    pub fn input(&self, index: usize) -> Result<ValueId> {
        self.get_input(index).ok_or_else(|| LowerError::MissingInput {
            node: self.description(),
            index,
        })
    }

    /// The value of an optional input.
    pub fn get_input(&self, index: usize) -> Option<ValueId> {
        self.inputs.get(index).copied()
    }

    /// The builder over the IR under construction.
    pub fn builder(&mut self) -> &mut GraphBuilder<'a> {
        &mut self.builder
    }

    /// Element type of a value.
    pub fn value_dtype(&self, id: ValueId) -> Result<DataType> {
        Ok(self.builder.value_dtype(id)?)
    }

    /// Shape of a value.
    pub fn value_shape(&self, id: ValueId) -> Result<TensorShape> {
        Ok(self.builder.value_shape(id)?)
    }

    /// Read an attribute with a default, attributing failures to this
    /// node.
    pub fn attr_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: TryFrom<AttributeValue>,
        T::Error: std::fmt::Display,
    {
        self.node
            .attr_or(name, default)
            .map_err(|source| LowerError::Attribute {
                node: self.description(),
                source,
            })
    }
}
