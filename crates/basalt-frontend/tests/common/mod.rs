//! Shared helpers for lowering tests.

use basalt_onnx::{AttributeValue, DataType, Graph, Node, TensorInfo, TensorKind, TensorShape};

/// Initialize test logging. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn input_tensor(name: &str, dtype: DataType, shape: TensorShape) -> TensorInfo {
    TensorInfo {
        name: name.to_string(),
        dtype,
        shape,
        kind: TensorKind::Input,
        initializer: None,
    }
}

pub fn output_tensor(name: &str, dtype: DataType) -> TensorInfo {
    TensorInfo {
        name: name.to_string(),
        dtype,
        shape: TensorShape::Unknown,
        kind: TensorKind::Output,
        initializer: None,
    }
}

/// Build a single-node graph for an attribute-era reduction operator.
pub fn attr_reduce_graph(
    op_type: &str,
    dtype: DataType,
    input_shape: TensorShape,
    axes: Option<Vec<i64>>,
    keepdims: Option<i64>,
) -> Graph {
    let mut graph = Graph::new();
    graph.metadata.name = format!("test_{}", op_type.to_lowercase());
    graph.metadata.opset_version = 1;

    graph.add_tensor(input_tensor("data", dtype, input_shape));
    graph.add_tensor(output_tensor("reduced", dtype));

    let mut node = Node::new(op_type);
    node.name = "reduce0".to_string();
    node.inputs = vec!["data".to_string()];
    node.outputs = vec!["reduced".to_string()];
    if let Some(axes) = axes {
        node.attributes
            .insert("axes".to_string(), AttributeValue::Ints(axes));
    }
    if let Some(keepdims) = keepdims {
        node.attributes
            .insert("keepdims".to_string(), AttributeValue::Int(keepdims));
    }
    graph.add_node(node);

    graph.inputs = vec!["data".to_string()];
    graph.outputs = vec!["reduced".to_string()];
    graph
}

/// How the optional axes input is supplied in an opset-13 graph.
pub enum AxesInput {
    /// No second input.
    None,

    /// Axes as a constant initializer with a static shape.
    Initializer(Vec<i64>),

    /// Axes as a runtime graph input with the given shape.
    Runtime(TensorShape),
}

/// Build a single-node ReduceSum graph in the axes-from-input era.
pub fn input_axes_reduce_graph(
    dtype: DataType,
    input_shape: TensorShape,
    axes: AxesInput,
    keepdims: Option<i64>,
    noop_with_empty_axes: Option<i64>,
) -> Graph {
    let mut graph = Graph::new();
    graph.metadata.name = "test_reducesum".to_string();
    graph.metadata.opset_version = 13;

    graph.add_tensor(input_tensor("data", dtype, input_shape));
    graph.inputs = vec!["data".to_string()];

    let mut node = Node::new("ReduceSum");
    node.name = "reduce0".to_string();
    node.inputs = vec!["data".to_string()];
    node.outputs = vec!["reduced".to_string()];

    match axes {
        AxesInput::None => {}
        AxesInput::Initializer(values) => {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            graph.add_tensor(TensorInfo {
                name: "axes".to_string(),
                dtype: DataType::I64,
                shape: TensorShape::Static(vec![values.len()]),
                kind: TensorKind::Weight,
                initializer: Some(bytes),
            });
            node.inputs.push("axes".to_string());
        }
        AxesInput::Runtime(shape) => {
            graph.add_tensor(input_tensor("axes", DataType::I64, shape));
            graph.inputs.push("axes".to_string());
            node.inputs.push("axes".to_string());
        }
    }

    if let Some(keepdims) = keepdims {
        node.attributes
            .insert("keepdims".to_string(), AttributeValue::Int(keepdims));
    }
    if let Some(noop) = noop_with_empty_axes {
        node.attributes
            .insert("noop_with_empty_axes".to_string(), AttributeValue::Int(noop));
    }

    graph.add_tensor(output_tensor("reduced", dtype));
    graph.add_node(node);
    graph.outputs = vec!["reduced".to_string()];

    graph
}
