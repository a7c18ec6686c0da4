//! Graph document model: nodes, sockets, connections, and the serde
//! persistence format hosts round-trip through storage.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// The closed set of socket value types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    Color,
    Scalar,
}

impl std::fmt::Display for SocketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketType::Color => write!(f, "color"),
            SocketType::Scalar => write!(f, "scalar"),
        }
    }
}

/// Every node kind the component library knows how to evaluate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Samples the live video texture at a configurable offset.
    Webcam,
    /// The sink: commits its input color to `gl_FragColor`.
    Canvas,
    /// Constant color literal.
    Color,
    /// Constant scalar literal.
    Scalar,
    /// Averages two colors.
    Blend,
    /// Extracts the r/g/b/a channels of a color.
    Split,
    /// Builds a color from four scalar channels.
    Join,
}

impl NodeKind {
    /// Sink kinds finalize the generated program instead of feeding
    /// downstream nodes.
    pub fn is_sink(&self) -> bool {
        matches!(self, NodeKind::Canvas)
    }
}

/// Kind-specific configuration. Evaluation falls back to per-kind
/// defaults for any field left unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NodeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    /// Webcam sample offset in pixels, applied as `offset / resolution`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f32>,
}

/// One incoming edge: the upstream node and which of its output sockets
/// feeds this input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConnection {
    pub node_id: NodeId,
    #[serde(default = "default_output_key")]
    pub output_key: String,
}

fn default_output_key() -> String {
    "color".to_string()
}

impl InputConnection {
    pub fn new(node_id: impl Into<NodeId>, output_key: impl Into<String>) -> Self {
        InputConnection {
            node_id: node_id.into(),
            output_key: output_key.into(),
        }
    }
}

/// A node instance. `position` is presentational metadata: it is
/// round-tripped for the editing surface but never read by evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSpec {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub params: NodeParams,
    /// Input socket name -> incoming edges. Sockets may carry several
    /// edges; workers see them as an ordered list.
    #[serde(default)]
    pub inputs: HashMap<String, Vec<InputConnection>>,
    #[serde(default)]
    pub position: [f32; 2],
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        NodeSpec {
            id: id.into(),
            kind,
            params: NodeParams::default(),
            inputs: HashMap::new(),
            position: [0.0, 0.0],
        }
    }
}

/// The persistable graph document.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,
}

impl GraphSpec {
    /// Deserialize a stored document.
    pub fn parse(json: &str) -> Result<GraphSpec, crate::error::GraphError> {
        serde_json::from_str(json)
            .map_err(|e| crate::error::GraphError::MalformedDocument(e.to_string()))
    }

    /// Deserialize a stored document, falling back to the starter graph
    /// when it cannot be read. A broken document is recoverable user
    /// state, not a crash.
    pub fn load_or_default(json: &str) -> GraphSpec {
        match GraphSpec::parse(json) {
            Ok(spec) => spec,
            Err(err) => {
                log::warn!("discarding stored graph document: {err}");
                GraphSpec::starter()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, crate::error::GraphError> {
        serde_json::to_string(self)
            .map_err(|e| crate::error::GraphError::MalformedDocument(e.to_string()))
    }

    /// The initial layout shown on first launch: a webcam wired
    /// straight into a canvas.
    pub fn starter() -> GraphSpec {
        let webcam = NodeSpec::new("webcam", NodeKind::Webcam);
        let mut canvas = NodeSpec::new("canvas", NodeKind::Canvas);
        canvas.position = [400.0, 0.0];
        canvas
            .inputs
            .insert("color".to_string(), vec![InputConnection::new("webcam", "color")]);
        GraphSpec {
            nodes: vec![webcam, canvas],
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut NodeSpec> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }
}
