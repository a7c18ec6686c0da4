//! wasm-bindgen surface for browser hosts.
//!
//! The host owns the presentation concerns (node editor UI, webcam
//! acquisition, the per-frame WebGL render loop) and drives the engine
//! through this wrapper: mutate the graph, call [`WasmShaderGraph::process`],
//! hand the returned GLSL to the render loop.

use fxgraph_core::{
    GraphEngine, GraphSpec, NodeKind, NodeSpec, PassOutcome, SinkSelector,
};
use wasm_bindgen::prelude::*;

fn to_js(err: fxgraph_core::GraphError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_kind(kind: &str) -> Result<NodeKind, String> {
    serde_json::from_value(serde_json::Value::String(kind.to_string()))
        .map_err(|_| format!("unknown node kind '{kind}'"))
}

/// Holds a persistent engine so graph edits and repeated evaluation
/// don't copy the document through the wasm boundary each time.
#[wasm_bindgen]
pub struct WasmShaderGraph {
    engine: GraphEngine,
}

impl Default for WasmShaderGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmShaderGraph {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmShaderGraph {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();
        WasmShaderGraph {
            engine: GraphEngine::new(GraphSpec::starter()),
        }
    }

    /// Replace the graph with a stored document. Fails on malformed
    /// JSON; see [`WasmShaderGraph::load_graph_or_default`] for the
    /// forgiving variant.
    pub fn load_graph(&mut self, json: &str) -> Result<(), JsValue> {
        let spec = GraphSpec::parse(json).map_err(to_js)?;
        self.engine = GraphEngine::new(spec);
        Ok(())
    }

    /// Replace the graph with a stored document, falling back to the
    /// starter graph when the document cannot be read.
    pub fn load_graph_or_default(&mut self, json: &str) {
        self.engine = GraphEngine::from_document(json);
    }

    /// Serialize the current graph for host storage.
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.engine.to_json().map_err(to_js)
    }

    pub fn add_node(&mut self, id: &str, kind: &str, x: f32, y: f32) -> Result<(), JsValue> {
        let kind = parse_kind(kind).map_err(|e| JsValue::from_str(&e))?;
        let mut node = NodeSpec::new(id, kind);
        node.position = [x, y];
        self.engine.add_node(node).map_err(to_js)
    }

    pub fn remove_node(&mut self, id: &str) -> Result<(), JsValue> {
        self.engine.remove_node(id).map_err(to_js)
    }

    pub fn connect(
        &mut self,
        from: &str,
        output: &str,
        to: &str,
        input: &str,
    ) -> Result<(), JsValue> {
        self.engine.connect(from, output, to, input).map_err(to_js)
    }

    pub fn disconnect(
        &mut self,
        from: &str,
        output: &str,
        to: &str,
        input: &str,
    ) -> Result<(), JsValue> {
        self.engine
            .disconnect(from, output, to, input)
            .map_err(to_js)
    }

    /// Set a node parameter from a JSON value, e.g. `set_param("c1",
    /// "color", "[1, 0, 0, 1]")` or `set_param("cam", "offset_x", "4")`.
    pub fn set_param(&mut self, node_id: &str, key: &str, json_value: &str) -> Result<(), JsValue> {
        fn expect_f32(key: &str, raw: &str) -> Result<f32, JsValue> {
            serde_json::from_str::<f32>(raw)
                .map_err(|_| JsValue::from_str(&format!("param '{key}' expects a number")))
        }

        // Validate before borrowing the node so failures leave it untouched.
        enum Parsed {
            Color([f32; 4]),
            Value(f32),
            OffsetX(f32),
            OffsetY(f32),
        }
        let parsed = match key {
            "color" => Parsed::Color(serde_json::from_str(json_value).map_err(|_| {
                JsValue::from_str("param 'color' expects four numeric components")
            })?),
            "value" => Parsed::Value(expect_f32(key, json_value)?),
            "offset_x" => Parsed::OffsetX(expect_f32(key, json_value)?),
            "offset_y" => Parsed::OffsetY(expect_f32(key, json_value)?),
            _ => return Err(JsValue::from_str(&format!("unknown param key '{key}'"))),
        };

        let params = self.engine.node_params_mut(node_id).map_err(to_js)?;
        match parsed {
            Parsed::Color(rgba) => params.color = Some(rgba),
            Parsed::Value(v) => params.value = Some(v),
            Parsed::OffsetX(v) => params.offset_x = Some(v),
            Parsed::OffsetY(v) => params.offset_y = Some(v),
        }
        Ok(())
    }

    /// Evaluate one pass and return generated GLSL. An empty string
    /// means there was nothing to render (no sink node).
    pub fn process(&mut self) -> Result<String, JsValue> {
        match self.engine.process(&SinkSelector::First).map_err(to_js)? {
            PassOutcome::Committed(source) => Ok(source),
            PassOutcome::NoSink | PassOutcome::Cancelled => Ok(String::new()),
        }
    }

    /// The most recent committed shader source, if any.
    pub fn last_shader(&self) -> Option<String> {
        self.engine.last_committed().map(str::to_string)
    }
}

/// Expose the node schema registry as JSON so the host UI can build its
/// palette and socket layout.
#[wasm_bindgen]
pub fn get_node_schemas_json() -> String {
    serde_json::to_string(&fxgraph_core::registry()).unwrap_or_default()
}
