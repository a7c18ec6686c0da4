//! Evaluation pipeline: turns a [`GraphSpec`](crate::types::GraphSpec)
//! into generated shader source by walking nodes in topological order.
//!
//! - [`pass`] owns the per-pass state machine, cancellation token, and
//!   the pass-scoped variable/sample bookkeeping.
//! - [`workers`] houses the component library: one pure worker per
//!   [`NodeKind`](crate::types::NodeKind).
//!
//! Hosts should interact through [`evaluate`] or the higher-level
//! [`GraphEngine`](crate::engine::GraphEngine).

mod pass;
pub mod workers;

pub use pass::{CancelToken, Pass, PassContext, PassOutcome, PassState, SinkSelector};

#[cfg(test)]
mod tests;

use crate::error::GraphError;
use crate::types::GraphSpec;

/// Evaluate one pass over a snapshot of `spec`, generating source for
/// the sink `selector` resolves to.
///
/// Cooperative cancellation: `token` is polled between node
/// evaluations, and a cancelled pass delivers [`PassOutcome::Cancelled`]
/// instead of output.
pub fn evaluate(
    spec: &GraphSpec,
    selector: &SinkSelector,
    token: &CancelToken,
) -> Result<PassOutcome, GraphError> {
    match Pass::new(spec.clone(), selector, token.clone())? {
        Some(pass) => pass.run(),
        None => Ok(PassOutcome::NoSink),
    }
}
