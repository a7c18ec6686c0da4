//! Expression nodes of the shader IR.

/// GLSL value types the IR can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslType {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl GlslType {
    pub fn keyword(&self) -> &'static str {
        match self {
            GlslType::Float => "float",
            GlslType::Vec2 => "vec2",
            GlslType::Vec3 => "vec3",
            GlslType::Vec4 => "vec4",
        }
    }
}

/// An immutable expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal, always rendered with a decimal point so GLSL
    /// treats it as a float (`1` becomes `1.0`).
    Float(f32),
    /// Vector constructor over sub-expressions, e.g. `vec4(r, g, b, a)`.
    Vec(GlslType, Vec<Expr>),
    /// Reference to a previously defined variable.
    Var(String),
    /// Ordered mix of literal text and sub-expressions.
    Raw(Vec<Fragment>),
}

/// One piece of a [`Expr::Raw`] composite.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Lit(String),
    Sub(Expr),
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment::Lit(text.to_string())
    }
}

impl From<Expr> for Fragment {
    fn from(expr: Expr) -> Self {
        Fragment::Sub(expr)
    }
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn vec2(x: Expr, y: Expr) -> Expr {
        Expr::Vec(GlslType::Vec2, vec![x, y])
    }

    pub fn vec4(x: Expr, y: Expr, z: Expr, w: Expr) -> Expr {
        Expr::Vec(GlslType::Vec4, vec![x, y, z, w])
    }

    pub fn vec4_literal(rgba: [f32; 4]) -> Expr {
        Expr::Vec(
            GlslType::Vec4,
            rgba.iter().map(|c| Expr::Float(*c)).collect(),
        )
    }

    pub fn raw(parts: impl IntoIterator<Item = Fragment>) -> Expr {
        Expr::Raw(parts.into_iter().collect())
    }

    /// Render this expression as GLSL source text.
    pub fn to_glsl(&self) -> String {
        let mut out = String::new();
        self.write_glsl(&mut out);
        out
    }

    fn write_glsl(&self, out: &mut String) {
        match self {
            Expr::Float(v) => out.push_str(&format_float(*v)),
            Expr::Vec(ty, items) => {
                out.push_str(ty.keyword());
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_glsl(out);
                }
                out.push(')');
            }
            Expr::Var(name) => out.push_str(name),
            Expr::Raw(parts) => {
                for part in parts {
                    match part {
                        Fragment::Lit(text) => out.push_str(text),
                        Fragment::Sub(expr) => expr.write_glsl(out),
                    }
                }
            }
        }
    }

    /// Append every variable name this tree references to `out`.
    pub fn collect_refs(&self, out: &mut Vec<String>) {
        match self {
            Expr::Float(_) => {}
            Expr::Var(name) => out.push(name.clone()),
            Expr::Vec(_, items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            Expr::Raw(parts) => {
                for part in parts {
                    if let Fragment::Sub(expr) = part {
                        expr.collect_refs(out);
                    }
                }
            }
        }
    }
}

/// GLSL float literals need an explicit decimal point; `1` would be an
/// int literal and fail to type-check against float operands.
fn format_float(value: f32) -> String {
    let text = value.to_string();
    if text.contains('.') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{text}.0")
    }
}
