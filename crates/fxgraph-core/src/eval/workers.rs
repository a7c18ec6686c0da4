//! The component library: one pure worker per node kind.
//!
//! A worker receives, per input socket, the list of shaders arriving on
//! that socket (empty when unconnected) and derives exactly one shader
//! per output socket. Absent inputs are never an error; each kind
//! substitutes its declared default. Workers only derive new
//! [`PartialShader`] snapshots, they never mutate upstream ones.

use hashbrown::HashMap;

use crate::glsl::{Expr, GlslType, PartialShader, Statement, VarDef};
use crate::types::{NodeKind, NodeSpec};

use super::pass::PassContext;

pub type InputMap = HashMap<String, Vec<PartialShader>>;
pub type OutputMap = HashMap<String, PartialShader>;

/// Opaque black, the default color wherever a color input is absent.
pub const DEFAULT_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Default for Color nodes: a teal that reads well against video.
const TEAL: [f32; 4] = [0.0, 0.7, 0.7, 1.0];

fn default_black() -> PartialShader {
    PartialShader::new(Expr::vec4_literal(DEFAULT_COLOR))
}

fn first_input<'a>(inputs: &'a InputMap, socket: &str) -> Option<&'a PartialShader> {
    inputs.get(socket).and_then(|arrived| arrived.first())
}

fn keyed(socket: &str, shader: PartialShader) -> OutputMap {
    let mut map = OutputMap::with_capacity(1);
    map.insert(socket.to_string(), shader);
    map
}

/// Evaluate one node, producing a shader per output socket. The sink
/// kind produces no outputs; it commits its finished shader to `ctx`.
pub fn eval_node(ctx: &mut PassContext, node: &NodeSpec, inputs: &InputMap) -> OutputMap {
    match node.kind {
        NodeKind::Webcam => eval_webcam(ctx, node),
        NodeKind::Canvas => eval_canvas(ctx, inputs),
        NodeKind::Color => eval_color(node),
        NodeKind::Scalar => eval_scalar(node),
        NodeKind::Blend => eval_blend(inputs),
        NodeKind::Split => eval_split(inputs),
        NodeKind::Join => eval_join(inputs),
    }
}

/// Sample the video texture at the node's pixel offset. Samples are
/// memoized per pass by offset, so two webcam nodes at the same offset
/// share one definition.
fn eval_webcam(ctx: &mut PassContext, node: &NodeSpec) -> OutputMap {
    let ox = node.params.offset_x.unwrap_or(0.0);
    let oy = node.params.offset_y.unwrap_or(0.0);
    let key = (ox.to_bits(), oy.to_bits());

    // A cache hit carries the definition with it: the node that first
    // emitted it may sit on a branch whose statements never reach the
    // sink, and the generator deduplicates repeated identical defs.
    if let Some(def) = ctx.cached_sample(key) {
        let reference = def.reference();
        return keyed(
            "color",
            PartialShader::with_statements(vec![Statement::VarDef(def.clone())], reference),
        );
    }

    let coord = Expr::vec2(
        Expr::raw([Expr::Float(ox).into(), " / resolution.x".into()]),
        Expr::raw([Expr::Float(oy).into(), " / resolution.y".into()]),
    );
    let sample = Expr::raw([
        "texture2D(videoTexture, vTexCoord + ".into(),
        coord.into(),
        ")".into(),
    ]);

    let def = VarDef::new(ctx.fresh_var("tex", &node.id), GlslType::Vec4, sample);
    ctx.memoize_sample(key, def.clone());

    let reference = def.reference();
    keyed(
        "color",
        PartialShader::with_statements(vec![Statement::VarDef(def)], reference),
    )
}

/// The sink: append the commit statement and hand the finished shader
/// to the pass.
fn eval_canvas(ctx: &mut PassContext, inputs: &InputMap) -> OutputMap {
    let shader = first_input(inputs, "color")
        .cloned()
        .unwrap_or_else(default_black);
    let finished = shader.then([Statement::SetFragColor(shader.working.clone())]);
    ctx.committed = Some(finished);
    OutputMap::new()
}

fn eval_color(node: &NodeSpec) -> OutputMap {
    let rgba = node.params.color.unwrap_or(TEAL);
    keyed("color", PartialShader::new(Expr::vec4_literal(rgba)))
}

fn eval_scalar(node: &NodeSpec) -> OutputMap {
    let value = node.params.value.unwrap_or(0.0);
    keyed("value", PartialShader::new(Expr::Float(value)))
}

/// Average two colors. One side absent passes the other through; both
/// absent yields opaque black.
fn eval_blend(inputs: &InputMap) -> OutputMap {
    let a = first_input(inputs, "color_a");
    let b = first_input(inputs, "color_b");

    let blended = match (a, b) {
        (None, None) => default_black(),
        (Some(only), None) | (None, Some(only)) => only.clone(),
        (Some(a), Some(b)) => a.combine(
            b,
            Expr::raw([
                "(".into(),
                a.working.clone().into(),
                " + ".into(),
                b.working.clone().into(),
                ") / 2.0".into(),
            ]),
        ),
    };
    keyed("color", blended)
}

/// Extract the r/g/b/a channels of the input color as scalars. All four
/// outputs share the input's statements; the generator deduplicates the
/// shared definitions downstream.
fn eval_split(inputs: &InputMap) -> OutputMap {
    let color = first_input(inputs, "color")
        .cloned()
        .unwrap_or_else(default_black);

    let mut out = OutputMap::with_capacity(4);
    for channel in ["r", "g", "b", "a"] {
        let component = Expr::raw([
            "(".into(),
            color.working.clone().into(),
            crate::glsl::Fragment::Lit(format!(").{channel}")),
        ]);
        out.insert(channel.to_string(), color.with_working(component));
    }
    out
}

/// Build a color from four scalar channels. Missing channels default to
/// 0 except alpha, which defaults to 1.
fn eval_join(inputs: &InputMap) -> OutputMap {
    let defaults = [("r", 0.0_f32), ("g", 0.0), ("b", 0.0), ("a", 1.0)];

    let mut statements = Vec::new();
    let mut components = Vec::with_capacity(4);
    for (socket, fallback) in defaults {
        match first_input(inputs, socket) {
            Some(shader) => {
                statements.extend(shader.statements.iter().cloned());
                components.push(shader.working.clone());
            }
            None => components.push(Expr::Float(fallback)),
        }
    }

    keyed(
        "color",
        PartialShader::with_statements(statements, Expr::Vec(GlslType::Vec4, components)),
    )
}
