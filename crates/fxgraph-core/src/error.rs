//! Error taxonomy for graph evaluation and code generation.
//!
//! Every failure aborts only the pass that produced it; engine state is
//! never left partially updated.

use crate::types::{NodeId, SocketType};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    /// The node/connection set is not a DAG.
    #[error("cycle detected in graph")]
    CycleDetected,

    /// A worker emitted an expression referencing a variable that was
    /// never defined. Indicates a component library bug.
    #[error("variable '{0}' was referenced without being defined")]
    UndefinedVariable(String),

    /// An explicitly selected sink does not exist or is not a sink kind.
    #[error("sink node '{0}' not found")]
    SinkNotFound(NodeId),

    #[error("unknown node '{0}'")]
    UnknownNode(NodeId),

    #[error("a node with id '{0}' already exists")]
    DuplicateNode(NodeId),

    #[error("node '{node}' has no socket '{socket}'")]
    UnknownSocket { node: NodeId, socket: String },

    #[error("socket type mismatch: cannot connect {from} output to {to} input")]
    SocketTypeMismatch { from: SocketType, to: SocketType },

    /// A stored graph document could not be deserialized.
    #[error("malformed graph document: {0}")]
    MalformedDocument(String),
}
