//! The shader intermediate representation.
//!
//! Node workers never concatenate GLSL text directly; they build these
//! immutable expression and statement values and thread them through
//! [`PartialShader`] snapshots. The code generator is the only place
//! the IR is lowered to source text.

mod expr;
mod stmt;

pub use expr::{Expr, Fragment, GlslType};
pub use stmt::{PartialShader, Statement, VarDef};
