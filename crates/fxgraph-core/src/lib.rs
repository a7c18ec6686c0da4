//! fxgraph-core: a node-graph engine that compiles webcam effect graphs
//! into GLSL fragment shaders.
//!
//! Hosts edit a [`GraphSpec`] through a [`GraphEngine`]; each trigger
//! runs a single-flight evaluation pass that walks the graph in
//! dependency order, builds shader IR, and lowers it to source text for
//! an external render loop.

pub mod codegen;
pub mod engine;
pub mod error;
pub mod eval;
pub mod glsl;
pub mod schema;
pub mod topo;
pub mod types;

pub use codegen::generate_shader;
pub use engine::GraphEngine;
pub use error::GraphError;
pub use eval::{evaluate, CancelToken, Pass, PassOutcome, PassState, SinkSelector};
pub use schema::registry;
pub use topo::topo_order;
pub use types::{GraphSpec, InputConnection, NodeId, NodeKind, NodeParams, NodeSpec, SocketType};
