//! The graph engine: owns the editable graph, enforces connection
//! typing, and runs single-flight evaluation passes with preemption.

use crate::error::GraphError;
use crate::eval::{evaluate, CancelToken, Pass, PassOutcome, SinkSelector};
use crate::schema;
use crate::types::{GraphSpec, InputConnection, NodeId, NodeSpec, SocketType};

/// Owns the node/connection graph and the "currently running pass"
/// flag. At most one pass is in flight; any mutation or new trigger
/// cancels it first, so a stale pass can never deliver output after a
/// newer one ("single-flight with preemption").
#[derive(Debug, Default)]
pub struct GraphEngine {
    spec: GraphSpec,
    inflight: Option<CancelToken>,
    last_committed: Option<String>,
}

impl GraphEngine {
    pub fn new(spec: GraphSpec) -> GraphEngine {
        GraphEngine {
            spec,
            inflight: None,
            last_committed: None,
        }
    }

    /// Restore an engine from a stored document, falling back to the
    /// starter graph when the document is unreadable.
    pub fn from_document(json: &str) -> GraphEngine {
        GraphEngine::new(GraphSpec::load_or_default(json))
    }

    pub fn spec(&self) -> &GraphSpec {
        &self.spec
    }

    /// The most recent committed shader source, retained across failed
    /// or cancelled passes.
    pub fn last_committed(&self) -> Option<&str> {
        self.last_committed.as_deref()
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        self.spec.to_json()
    }

    // --- Graph mutation -------------------------------------------------

    pub fn add_node(&mut self, node: NodeSpec) -> Result<(), GraphError> {
        if self.spec.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.preempt_inflight();
        self.spec.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every connection referencing it.
    pub fn remove_node(&mut self, id: &str) -> Result<(), GraphError> {
        if self.spec.node(id).is_none() {
            return Err(GraphError::UnknownNode(id.to_string()));
        }
        self.preempt_inflight();
        self.spec.nodes.retain(|n| n.id != id);
        for node in &mut self.spec.nodes {
            for conns in node.inputs.values_mut() {
                conns.retain(|conn| conn.node_id != id);
            }
            node.inputs.retain(|_, conns| !conns.is_empty());
        }
        Ok(())
    }

    /// Connect an output socket to an input socket, enforcing the
    /// schema's socket types.
    pub fn connect(
        &mut self,
        from: &str,
        output: &str,
        to: &str,
        input: &str,
    ) -> Result<(), GraphError> {
        let from_ty = self.output_socket_type(from, output)?;
        let to_ty = self.input_socket_type(to, input)?;
        if from_ty != to_ty {
            return Err(GraphError::SocketTypeMismatch {
                from: from_ty,
                to: to_ty,
            });
        }

        self.preempt_inflight();
        let conn = InputConnection::new(from, output);
        // node existence was checked by the socket lookups
        if let Some(node) = self.spec.node_mut(to) {
            let conns = node.inputs.entry(input.to_string()).or_default();
            if !conns.contains(&conn) {
                conns.push(conn);
            }
        }
        Ok(())
    }

    pub fn disconnect(
        &mut self,
        from: &str,
        output: &str,
        to: &str,
        input: &str,
    ) -> Result<(), GraphError> {
        let node = self
            .spec
            .node_mut(to)
            .ok_or_else(|| GraphError::UnknownNode(to.to_string()))?;
        let Some(conns) = node.inputs.get_mut(input) else {
            return Err(GraphError::UnknownSocket {
                node: to.to_string(),
                socket: input.to_string(),
            });
        };
        conns.retain(|conn| !(conn.node_id == from && conn.output_key == output));
        if conns.is_empty() {
            node.inputs.remove(input);
        }
        self.preempt_inflight();
        Ok(())
    }

    /// Mutable access to one node's params. Param edits change what a
    /// pass would generate, so the in-flight pass is preempted like any
    /// other mutation.
    pub fn node_params_mut(
        &mut self,
        id: &str,
    ) -> Result<&mut crate::types::NodeParams, GraphError> {
        if self.spec.node(id).is_none() {
            return Err(GraphError::UnknownNode(id.to_string()));
        }
        self.preempt_inflight();
        match self.spec.node_mut(id) {
            Some(node) => Ok(&mut node.params),
            None => unreachable!("node existence checked above"),
        }
    }

    // --- Evaluation -----------------------------------------------------

    /// Run one full pass to completion, retaining committed source.
    ///
    /// Failures abort only this pass: the graph and the last committed
    /// source are left untouched, and the next trigger starts clean.
    pub fn process(&mut self, selector: &SinkSelector) -> Result<PassOutcome, GraphError> {
        let token = self.arm_pass();
        let outcome = evaluate(&self.spec, selector, &token);
        self.inflight = None;
        if let Ok(PassOutcome::Committed(source)) = &outcome {
            self.last_committed = Some(source.clone());
        }
        outcome
    }

    /// Start a pass over a snapshot of the current graph without
    /// driving it; the caller steps it. Any previously in-flight pass
    /// is cancelled first. Returns `None` when the graph has no sink.
    pub fn start_pass(&mut self, selector: &SinkSelector) -> Result<Option<Pass>, GraphError> {
        let token = self.arm_pass();
        Pass::new(self.spec.clone(), selector, token)
    }

    /// Cancel whatever pass is in flight and hand out the token for the
    /// next one.
    fn arm_pass(&mut self) -> CancelToken {
        self.preempt_inflight();
        let token = CancelToken::new();
        self.inflight = Some(token.clone());
        token
    }

    fn preempt_inflight(&mut self) {
        if let Some(token) = self.inflight.take() {
            log::debug!("preempting in-flight pass");
            token.cancel();
        }
    }

    fn output_socket_type(&self, node_id: &str, socket: &str) -> Result<SocketType, GraphError> {
        let node = self
            .spec
            .node(node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))?;
        schema::signature(node.kind)
            .outputs
            .iter()
            .find(|s| s.id == socket)
            .map(|s| s.ty)
            .ok_or_else(|| GraphError::UnknownSocket {
                node: node_id.to_string(),
                socket: socket.to_string(),
            })
    }

    fn input_socket_type(&self, node_id: &str, socket: &str) -> Result<SocketType, GraphError> {
        let node = self
            .spec
            .node(node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))?;
        schema::signature(node.kind)
            .inputs
            .iter()
            .find(|s| s.id == socket)
            .map(|s| s.ty)
            .ok_or_else(|| GraphError::UnknownSocket {
                node: node_id.to_string(),
                socket: socket.to_string(),
            })
    }
}
