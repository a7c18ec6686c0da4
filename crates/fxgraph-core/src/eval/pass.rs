//! The per-pass state machine and its bookkeeping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::codegen::generate_shader;
use crate::error::GraphError;
use crate::glsl::{PartialShader, VarDef};
use crate::topo::topo_order;
use crate::types::{GraphSpec, NodeId};

use super::workers;

/// Cooperative cancellation flag shared between the engine and an
/// in-flight pass. Polled between node evaluations; never forcible.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Which sink node a pass generates for.
///
/// `First` resolves to the first sink-kind node in declaration order; a
/// deliberate, documented tie-break for graphs that transiently hold
/// several sinks. `ById` demands a specific one and fails with
/// [`GraphError::SinkNotFound`] when it is missing or not a sink kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SinkSelector {
    #[default]
    First,
    ById(NodeId),
}

impl SinkSelector {
    pub fn resolve(&self, spec: &GraphSpec) -> Result<Option<NodeId>, GraphError> {
        match self {
            SinkSelector::First => Ok(spec
                .nodes
                .iter()
                .find(|n| n.kind.is_sink())
                .map(|n| n.id.clone())),
            SinkSelector::ById(id) => match spec.node(id) {
                Some(node) if node.kind.is_sink() => Ok(Some(node.id.clone())),
                _ => Err(GraphError::SinkNotFound(id.clone())),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Running,
    Committed,
    Aborted,
}

/// What a finished pass delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Generated shader source, ready for the render loop.
    Committed(String),
    /// No sink-kind node in the graph: nothing to render, not an error.
    NoSink,
    /// The pass was preempted or abandoned and delivered nothing.
    Cancelled,
}

/// Pass-scoped bookkeeping shared by every worker invocation.
#[derive(Debug, Default)]
pub struct PassContext {
    var_counter: u32,
    /// Texture samples memoized by offset key: a second request for the
    /// same offset reuses the first definition instead of minting a new
    /// variable. Dropped with the pass.
    sample_cache: HashMap<(u32, u32), VarDef>,
    /// Set by the sink worker: the finished shader to hand to codegen.
    pub(super) committed: Option<PartialShader>,
}

impl PassContext {
    /// A variable name unique within this pass, derived from the
    /// requesting node's id and a usage counter.
    pub fn fresh_var(&mut self, prefix: &str, node_id: &str) -> String {
        let n = self.var_counter;
        self.var_counter += 1;
        format!("{prefix}_{}_{n}", sanitize_ident(node_id))
    }

    /// Look up a memoized texture sample for `key`.
    pub fn cached_sample(&self, key: (u32, u32)) -> Option<&VarDef> {
        self.sample_cache.get(&key)
    }

    pub fn memoize_sample(&mut self, key: (u32, u32), def: VarDef) {
        self.sample_cache.insert(key, def);
    }
}

/// Node ids come from the host and may contain anything; variable names
/// must be valid GLSL identifiers.
fn sanitize_ident(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// One evaluation pass over a snapshot of the graph.
///
/// State machine: `Idle -> Running -> Committed | Aborted`. The pass
/// owns its snapshot, so the engine's graph may be mutated (and a new
/// pass started) while this one is still cancellable.
#[derive(Debug)]
pub struct Pass {
    spec: GraphSpec,
    sink: NodeId,
    /// Topological order, restricted to nodes with a path to the sink.
    order: Vec<NodeId>,
    next: usize,
    state: PassState,
    token: CancelToken,
    ctx: PassContext,
    outputs: HashMap<NodeId, HashMap<String, PartialShader>>,
}

impl Pass {
    /// Prepare a pass: resolve the sink, order the graph, and drop dead
    /// nodes. Returns `Ok(None)` when no sink exists.
    pub fn new(
        spec: GraphSpec,
        selector: &SinkSelector,
        token: CancelToken,
    ) -> Result<Option<Pass>, GraphError> {
        let Some(sink) = selector.resolve(&spec)? else {
            log::debug!("pass skipped: no sink node present");
            return Ok(None);
        };

        let order = topo_order(&spec.nodes)?;
        let live = reachable_from(&spec, &sink);
        let order: Vec<NodeId> = order.into_iter().filter(|id| live.contains(id)).collect();
        log::debug!(
            "pass prepared: sink '{sink}', {} of {} nodes live",
            order.len(),
            spec.nodes.len()
        );

        Ok(Some(Pass {
            spec,
            sink,
            order,
            next: 0,
            state: PassState::Idle,
            token,
            ctx: PassContext::default(),
            outputs: HashMap::new(),
        }))
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn sink(&self) -> &NodeId {
        &self.sink
    }

    /// Evaluate the next node. Returns `false` once the pass has
    /// committed or aborted; the token is polled before each node.
    pub fn step(&mut self) -> bool {
        if matches!(self.state, PassState::Committed | PassState::Aborted) {
            return false;
        }
        if self.token.is_cancelled() {
            log::debug!("pass for sink '{}' cancelled", self.sink);
            self.state = PassState::Aborted;
            return false;
        }
        self.state = PassState::Running;

        let Some(id) = self.order.get(self.next) else {
            self.state = PassState::Committed;
            return false;
        };
        // Ids in `order` come from the snapshot itself, so the lookup
        // always succeeds; a miss would mean the snapshot was mutated.
        if let Some(node) = self.spec.node(id) {
            let inputs = read_inputs(&self.outputs, node);
            let out = workers::eval_node(&mut self.ctx, node, &inputs);
            self.outputs.insert(node.id.clone(), out);
        }
        self.next += 1;

        if self.next == self.order.len() {
            self.state = PassState::Committed;
            return false;
        }
        true
    }

    /// Drive the pass to completion and lower the committed shader.
    pub fn run(mut self) -> Result<PassOutcome, GraphError> {
        while self.step() {}
        self.finish()
    }

    /// Consume the pass, producing its outcome. A pass abandoned before
    /// its last step delivers nothing, like a cancelled one.
    pub fn finish(mut self) -> Result<PassOutcome, GraphError> {
        match self.state {
            PassState::Aborted => Ok(PassOutcome::Cancelled),
            PassState::Committed => match self.ctx.committed.take() {
                Some(shader) => {
                    let source = generate_shader(&shader)?;
                    log::debug!(
                        "pass committed: {} bytes of shader source",
                        source.len()
                    );
                    Ok(PassOutcome::Committed(source))
                }
                // The sink is always part of `order` and its worker
                // always commits.
                None => unreachable!("sink worker did not commit"),
            },
            PassState::Idle | PassState::Running => {
                log::debug!("pass for sink '{}' abandoned before completion", self.sink);
                Ok(PassOutcome::Cancelled)
            }
        }
    }
}

/// Collect each input socket's upstream shaders, in edge order.
/// Unconnected sockets (or edges to nodes that produced nothing) yield
/// empty lists; workers substitute their own defaults.
fn read_inputs(
    outputs: &HashMap<NodeId, HashMap<String, PartialShader>>,
    node: &crate::types::NodeSpec,
) -> workers::InputMap {
    let mut resolved = workers::InputMap::with_capacity(node.inputs.len());
    for (socket, conns) in node.inputs.iter() {
        let arrived: Vec<PartialShader> = conns
            .iter()
            .filter_map(|conn| {
                outputs
                    .get(&conn.node_id)
                    .and_then(|ports| ports.get(&conn.output_key))
                    .cloned()
            })
            .collect();
        resolved.insert(socket.clone(), arrived);
    }
    resolved
}

/// Nodes with a path to `sink`, following input edges upstream.
fn reachable_from(spec: &GraphSpec, sink: &NodeId) -> HashSet<NodeId> {
    let mut live = HashSet::new();
    let mut stack = vec![sink.clone()];
    while let Some(id) = stack.pop() {
        if !live.insert(id.clone()) {
            continue;
        }
        if let Some(node) = spec.node(&id) {
            for conns in node.inputs.values() {
                for conn in conns {
                    if !live.contains(&conn.node_id) {
                        stack.push(conn.node_id.clone());
                    }
                }
            }
        }
    }
    live
}
