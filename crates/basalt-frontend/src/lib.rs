//! Operator lowering from ONNX source graphs to the basalt IR.
//!
//! The frontend walks a source graph node by node, looks up a translator
//! for each (operator name, opset version) pair in the
//! [`TranslatorRegistry`], invokes it with a per-node [`LowerCtx`], and
//! splices the returned values into the IR under construction. Lowering
//! is a single-pass, synchronous transform; a failure aborts the whole
//! import and no partial graph is produced.
//!
//! # Example
//!
//! ```
//! use basalt_frontend::{default_registry, lower_graph};
//! use basalt_onnx::{AttributeValue, DataType, Graph, Node, TensorInfo, TensorKind, TensorShape};
//!
//! # fn main() -> Result<(), basalt_frontend::LowerError> {
//! let mut graph = Graph::new();
//! graph.metadata.opset_version = 1;
//! graph.add_tensor(TensorInfo {
//!     name: "data".to_string(),
//!     dtype: DataType::F32,
//!     shape: TensorShape::Static(vec![2, 3]),
//!     kind: TensorKind::Input,
//!     initializer: None,
//! });
//! graph.add_tensor(TensorInfo {
//!     name: "reduced".to_string(),
//!     dtype: DataType::F32,
//!     shape: TensorShape::Unknown,
//!     kind: TensorKind::Output,
//!     initializer: None,
//! });
//!
//! let mut node = Node::new("ReduceMean");
//! node.inputs = vec!["data".to_string()];
//! node.outputs = vec!["reduced".to_string()];
//! node.attributes.insert("axes".to_string(), AttributeValue::Ints(vec![1]));
//! graph.add_node(node);
//!
//! graph.inputs = vec!["data".to_string()];
//! graph.outputs = vec!["reduced".to_string()];
//!
//! let ir = lower_graph(&graph, &default_registry())?;
//! assert_eq!(ir.outputs.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod axes;
pub mod ctx;
pub mod error;
pub mod ops;
pub mod registry;
pub mod validate;

pub use ctx::LowerCtx;
pub use error::{LowerError, Result};
pub use registry::{default_registry, Translator, TranslatorRegistry};

// Re-export the graph types callers hold on both sides of the lowering.
pub use basalt_ir::IrGraph;
pub use basalt_onnx::Graph;

use basalt_ir::{GraphBuilder, TensorShape, TensorValue, Value, ValueId};
use basalt_onnx::{OnnxError, TensorInfo, TensorKind};
use std::collections::HashMap;
use tracing::debug_span;

/// Lower a source graph into the target IR.
///
/// Graph inputs become IR input values, initializers become constant
/// nodes, and each source node is dispatched through `registry` at the
/// graph's opset version. Translator outputs are bound to the node's
/// declared output names; an identity translation may bind an output
/// name to an existing value (the output aliases the input).
#[tracing::instrument(skip_all, fields(num_nodes = graph.nodes.len(), opset = graph.metadata.opset_version))]
pub fn lower_graph(graph: &Graph, registry: &TranslatorRegistry) -> Result<IrGraph> {
    graph.validate()?;

    let mut ir = IrGraph::new();
    let mut value_map: HashMap<String, ValueId> = HashMap::new();

    // Graph inputs become runtime values; initializers become constants.
    for info in &graph.tensor_info {
        match info.kind {
            TensorKind::Input => {
                let shape = TensorShape::from_onnx(&info.shape)?;
                let id = ir.add_value(Value::new(info.name.clone(), info.dtype, shape));
                ir.inputs.push(id);
                value_map.insert(info.name.clone(), id);
            }
            TensorKind::Weight => {
                let id = lower_initializer(&mut ir, info)?;
                value_map.insert(info.name.clone(), id);
            }
            TensorKind::Output | TensorKind::Intermediate => {
                // Declarations only; the producing node creates the value.
            }
        }
    }

    let opset = graph.metadata.opset_version;

    for node in &graph.nodes {
        let _span = debug_span!("lower", node = %node.description()).entered();

        let translator = registry
            .lookup(&node.op_type, opset)
            .map_err(|err| match err {
                // Name the failing node, not just the operator.
                LowerError::NoTranslatorFound { version, .. } => LowerError::NoTranslatorFound {
                    op: node.description(),
                    version,
                },
                other => other,
            })?;

        let inputs = node
            .inputs
            .iter()
            .filter(|name| !name.is_empty())
            .map(|name| {
                value_map
                    .get(name)
                    .copied()
                    .ok_or_else(|| LowerError::UnknownTensor {
                        context: node.description(),
                        tensor: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut ctx = LowerCtx::new(node, opset, inputs, &mut ir);
        let outputs = translator(&mut ctx)?;

        if outputs.len() != node.outputs.len() {
            return Err(LowerError::Onnx(OnnxError::InvalidGraph(format!(
                "node {} produced {} values for {} declared outputs",
                node.description(),
                outputs.len(),
                node.outputs.len()
            ))));
        }

        for (name, value) in node.outputs.iter().zip(outputs) {
            if !name.is_empty() {
                value_map.insert(name.clone(), value);
            }
        }
    }

    for output in &graph.outputs {
        let id = value_map
            .get(output)
            .copied()
            .ok_or_else(|| LowerError::UnknownTensor {
                context: "graph outputs".to_string(),
                tensor: output.clone(),
            })?;
        ir.outputs.push(id);
    }

    Ok(ir)
}

/// Materialize an initializer tensor as a constant node.
fn lower_initializer(ir: &mut IrGraph, info: &TensorInfo) -> Result<ValueId> {
    let dims = info.shape.as_static().ok_or_else(|| {
        OnnxError::InvalidGraph(format!(
            "initializer '{}' must have a static shape",
            info.name
        ))
    })?;
    let bytes = info.initializer.as_ref().ok_or_else(|| {
        OnnxError::InvalidGraph(format!(
            "weight tensor '{}' has no initializer data",
            info.name
        ))
    })?;

    let value = TensorValue::from_bytes(bytes, info.dtype, dims)?;
    let mut builder = GraphBuilder::new(ir, info.name.clone());
    Ok(builder.constant(value))
}
