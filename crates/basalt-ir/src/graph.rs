//! Intermediate representation for the target graph.
//!
//! The IR is a directed graph where:
//! - **Nodes** (`IrNode`) are typed operations (e.g., Reduce, Exp, Range)
//! - **Values** (`Value`) are tensor flows between operations
//!
//! Values are immutable once created and live for the lifetime of the
//! graph; nodes append to the graph only, there is no rewriting at this
//! layer.

use crate::types::{TensorShape, TensorValue};
use crate::{Error, Result};
use basalt_onnx::DataType;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::Topo;

use std::collections::HashMap;

/// Type alias for IR node identifiers (backed by petgraph NodeIndex).
pub type IrNodeId = NodeIndex;

/// Unique identifier for a value (tensor flow) in the IR graph.
///
/// This is an index into `IrGraph::values`. Unlike node IDs (which use
/// petgraph's stable NodeIndex), value IDs are simple usize indices that
/// remain valid for the lifetime of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub usize);

impl ValueId {
    /// Create a new value ID.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The kinds of reduction the IR supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceKind {
    Sum,
    Mean,
    Min,
    Max,
    Prod,
    L1,
    L2,
}

impl ReduceKind {
    /// Lower-case name used for value naming and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ReduceKind::Sum => "reduce_sum",
            ReduceKind::Mean => "reduce_mean",
            ReduceKind::Min => "reduce_min",
            ReduceKind::Max => "reduce_max",
            ReduceKind::Prod => "reduce_prod",
            ReduceKind::L1 => "reduce_l1",
            ReduceKind::L2 => "reduce_l2",
        }
    }
}

/// Typed operation kinds the frontend synthesizes.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Compile-time constant; the node has no inputs.
    Constant(TensorValue),

    /// 1-D i64 tensor holding the input's shape.
    ShapeOf,

    /// Remove size-1 dimensions listed by the second input.
    Squeeze,

    /// `[start, stop)` with step, as a 1-D tensor of the given type.
    /// Inputs: start, stop, step scalars.
    Range { dtype: DataType },

    /// Elementwise exponential.
    Exp,

    /// Elementwise natural logarithm.
    Log,

    /// Elementwise product with broadcasting.
    Multiply,

    /// Reduce the first input over the axes given by the second input.
    Reduce { kind: ReduceKind, keep_dims: bool },
}

impl Op {
    /// Short name used for value naming and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Constant(_) => "const",
            Op::ShapeOf => "shape_of",
            Op::Squeeze => "squeeze",
            Op::Range { .. } => "range",
            Op::Exp => "exp",
            Op::Log => "log",
            Op::Multiply => "mul",
            Op::Reduce { kind, .. } => kind.name(),
        }
    }

    /// Get the constant payload, if this is a constant op.
    pub fn as_constant(&self) -> Option<&TensorValue> {
        match self {
            Op::Constant(value) => Some(value),
            _ => None,
        }
    }
}

/// A node in the IR graph: a typed operation over values.
#[derive(Debug, Clone)]
pub struct IrNode {
    /// Node name (derived from the source node, may be empty).
    pub name: String,

    /// The operation this node performs.
    pub op: Op,

    /// Input value IDs.
    pub inputs: Vec<ValueId>,

    /// Output value IDs.
    pub outputs: Vec<ValueId>,

    /// The graph node index (for efficient graph traversal).
    pub node_index: IrNodeId,
}

impl IrNode {
    /// Create a new operation node.
    pub fn new(name: String, op: Op) -> Self {
        Self {
            name,
            op,
            inputs: Vec::new(),
            outputs: Vec::new(),
            node_index: NodeIndex::default(),
        }
    }

    /// Add an input value.
    pub fn add_input(&mut self, value_id: ValueId) {
        self.inputs.push(value_id);
    }

    /// Add an output value.
    pub fn add_output(&mut self, value_id: ValueId) {
        self.outputs.push(value_id);
    }
}

/// A value (tensor flow) in the IR graph.
///
/// A value carries its element type and its shape, which is either fully
/// static, partially static, or fully dynamic. Values are immutable once
/// created.
#[derive(Debug, Clone)]
pub struct Value {
    /// Value name (must be unique within the graph).
    pub name: String,

    /// Element type.
    pub dtype: DataType,

    /// Shape (static, partially static, or unknown).
    pub shape: TensorShape,
}

impl Value {
    /// Create a new value.
    pub fn new(name: String, dtype: DataType, shape: TensorShape) -> Self {
        Self { name, dtype, shape }
    }
}

/// Intermediate representation graph.
///
/// Nodes are operations; values are tensor flows stored in a side-table.
/// petgraph edges exist solely for topological ordering.
#[derive(Debug)]
pub struct IrGraph {
    /// The graph structure (nodes only, no edge data).
    graph: StableGraph<IrNode, ()>,

    /// Value metadata side-table.
    values: Vec<Value>,

    /// Lookup table: value name -> value ID.
    value_by_name: HashMap<String, ValueId>,

    /// Lookup table: value ID -> producing node ID.
    value_producer: HashMap<ValueId, IrNodeId>,

    /// Lookup table: value ID -> consuming node IDs.
    value_consumers: HashMap<ValueId, Vec<IrNodeId>>,

    /// Graph input value IDs.
    pub inputs: Vec<ValueId>,

    /// Graph output value IDs.
    pub outputs: Vec<ValueId>,
}

impl IrGraph {
    /// Create a new empty IR graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            values: Vec::new(),
            value_by_name: HashMap::new(),
            value_producer: HashMap::new(),
            value_consumers: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    // ── Node access ──

    /// Get an immutable reference to a node.
    pub fn node(&self, id: IrNodeId) -> Result<&IrNode> {
        self.graph
            .node_weight(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))
    }

    /// Iterate over all nodes in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = (IrNodeId, &IrNode)> {
        self.graph
            .node_indices()
            .filter_map(|id| self.graph.node_weight(id).map(|node| (id, node)))
    }

    /// Get the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ── Value access ──

    /// Get the number of values in the graph.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Get an immutable reference to a value.
    pub fn value(&self, id: ValueId) -> Result<&Value> {
        self.values
            .get(id.index())
            .ok_or_else(|| Error::InvalidGraph(format!("Value {:?} not found", id)))
    }

    /// Look up a value by name.
    pub fn value_by_name(&self, name: &str) -> Option<ValueId> {
        self.value_by_name.get(name).copied()
    }

    /// Get the node that produces a value, if any.
    pub fn value_producer(&self, id: ValueId) -> Option<IrNodeId> {
        self.value_producer.get(&id).copied()
    }

    /// Get the nodes that consume a value.
    pub fn value_consumers(&self, id: ValueId) -> Vec<IrNodeId> {
        self.value_consumers.get(&id).cloned().unwrap_or_default()
    }

    /// Get the constant payload behind a value, if its producer is a
    /// constant node.
    pub fn constant_value(&self, id: ValueId) -> Option<&TensorValue> {
        let producer = self.value_producer(id)?;
        self.graph.node_weight(producer)?.op.as_constant()
    }

    // ── Graph mutation ──

    /// Add a new node to the graph and return its ID.
    ///
    /// This also updates the producer/consumer lookup tables and adds
    /// petgraph edges for topological ordering.
    pub fn add_node(&mut self, mut node: IrNode) -> IrNodeId {
        let placeholder = IrNode::new(String::new(), Op::ShapeOf);
        let node_id = self.graph.add_node(placeholder);
        node.node_index = node_id;

        // Register producer/consumer relationships
        for &output_id in &node.outputs {
            self.value_producer.insert(output_id, node_id);
        }

        for &input_id in &node.inputs {
            self.value_consumers
                .entry(input_id)
                .or_default()
                .push(node_id);

            // Add petgraph edge for topological ordering
            if let Some(&producer_id) = self.value_producer.get(&input_id) {
                self.graph.add_edge(producer_id, node_id, ());
            }
        }

        // Replace the placeholder with the real node
        *self.graph.node_weight_mut(node_id).unwrap() = node;

        node_id
    }

    /// Add a value to the graph and return its ID.
    pub fn add_value(&mut self, value: Value) -> ValueId {
        let id = ValueId::new(self.values.len());
        self.value_by_name.insert(value.name.clone(), id);
        self.values.push(value);
        id
    }

    // ── Graph queries ──

    /// Get the topological order of nodes in the graph.
    ///
    /// Returns nodes in an order such that all inputs to a node are
    /// produced before the node itself.
    pub fn topological_order(&self) -> Vec<IrNodeId> {
        let mut topo = Topo::new(&self.graph);
        let mut order = Vec::new();

        while let Some(id) = topo.next(&self.graph) {
            if self.graph.node_weight(id).is_some() {
                order.push(id);
            }
        }

        order
    }
}

impl Default for IrGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TensorData;

    #[test]
    fn test_create_empty_graph() {
        let graph = IrGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.value_count(), 0);
    }

    #[test]
    fn test_add_value() {
        let mut graph = IrGraph::new();
        let value = Value::new(
            "x".to_string(),
            DataType::F32,
            TensorShape::Static(vec![1, 2, 3]),
        );
        let value_id = graph.add_value(value);

        assert_eq!(graph.value_count(), 1);
        assert_eq!(graph.value(value_id).unwrap().name, "x");
        assert_eq!(graph.value_by_name("x"), Some(value_id));
    }

    #[test]
    fn test_add_node() {
        let mut graph = IrGraph::new();

        let input_id = graph.add_value(Value::new(
            "input".to_string(),
            DataType::F32,
            TensorShape::Static(vec![1, 2]),
        ));
        let output_id = graph.add_value(Value::new(
            "output".to_string(),
            DataType::F32,
            TensorShape::Static(vec![1, 2]),
        ));

        let mut node = IrNode::new("exp0".to_string(), Op::Exp);
        node.add_input(input_id);
        node.add_output(output_id);
        let node_id = graph.add_node(node);

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(node_id).unwrap().op, Op::Exp);
        assert_eq!(graph.value_producer(output_id), Some(node_id));
        assert_eq!(graph.value_consumers(input_id), vec![node_id]);
    }

    #[test]
    fn test_constant_value_lookup() {
        let mut graph = IrGraph::new();

        let axes = TensorValue::new(TensorData::I64(vec![0, 1]), vec![2], DataType::I64);
        let out_id = graph.add_value(Value::new(
            "axes".to_string(),
            DataType::I64,
            TensorShape::Static(vec![2]),
        ));

        let mut node = IrNode::new("axes0".to_string(), Op::Constant(axes.clone()));
        node.add_output(out_id);
        graph.add_node(node);

        assert_eq!(graph.constant_value(out_id), Some(&axes));

        // A value with no producer has no constant payload
        let free_id = graph.add_value(Value::new(
            "free".to_string(),
            DataType::F32,
            TensorShape::Unknown,
        ));
        assert_eq!(graph.constant_value(free_id), None);
    }

    #[test]
    fn test_topological_order() {
        let mut graph = IrGraph::new();

        let t0 = graph.add_value(Value::new(
            "t0".to_string(),
            DataType::F32,
            TensorShape::Static(vec![2]),
        ));
        let t1 = graph.add_value(Value::new(
            "t1".to_string(),
            DataType::F32,
            TensorShape::Static(vec![2]),
        ));
        let t2 = graph.add_value(Value::new(
            "t2".to_string(),
            DataType::F32,
            TensorShape::Static(vec![2]),
        ));

        let mut node_a = IrNode::new("a".to_string(), Op::Exp);
        node_a.add_input(t0);
        node_a.add_output(t1);
        let id_a = graph.add_node(node_a);

        let mut node_b = IrNode::new("b".to_string(), Op::Log);
        node_b.add_input(t1);
        node_b.add_output(t2);
        let id_b = graph.add_node(node_b);

        let order = graph.topological_order();
        assert_eq!(order, vec![id_a, id_b]);
    }
}
