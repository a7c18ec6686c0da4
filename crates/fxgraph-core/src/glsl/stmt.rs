//! Statements and the partial-shader working unit.

use super::expr::{Expr, GlslType};

/// A named variable definition: `vec4 name = init;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub ty: GlslType,
    pub init: Expr,
}

impl VarDef {
    pub fn new(name: impl Into<String>, ty: GlslType, init: Expr) -> VarDef {
        VarDef {
            name: name.into(),
            ty,
            init,
        }
    }

    /// An expression referencing this definition.
    pub fn reference(&self) -> Expr {
        Expr::Var(self.name.clone())
    }

    pub fn to_glsl(&self) -> String {
        format!("{} {} = {};", self.ty.keyword(), self.name, self.init.to_glsl())
    }
}

/// A shader statement: either a variable definition or the single
/// commit statement that sets the fragment color.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VarDef(VarDef),
    SetFragColor(Expr),
}

impl Statement {
    pub fn to_glsl(&self) -> String {
        match self {
            Statement::VarDef(def) => def.to_glsl(),
            Statement::SetFragColor(expr) => format!("gl_FragColor = {};", expr.to_glsl()),
        }
    }

    pub fn collect_refs(&self, out: &mut Vec<String>) {
        match self {
            Statement::VarDef(def) => def.init.collect_refs(out),
            Statement::SetFragColor(expr) => expr.collect_refs(out),
        }
    }
}

/// The working unit threaded through node evaluation: statements emitted
/// so far plus the expression a downstream node builds upon.
///
/// Snapshots are immutable; every operation derives a new value, and
/// combination preserves each side's statement order so definitions
/// always precede their uses.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialShader {
    pub statements: Vec<Statement>,
    pub working: Expr,
}

impl PartialShader {
    /// A shader with no statements, just a working expression.
    pub fn new(working: Expr) -> PartialShader {
        PartialShader {
            statements: Vec::new(),
            working,
        }
    }

    pub fn with_statements(statements: Vec<Statement>, working: Expr) -> PartialShader {
        PartialShader {
            statements,
            working,
        }
    }

    /// Same statements, new working expression.
    pub fn with_working(&self, working: Expr) -> PartialShader {
        PartialShader {
            statements: self.statements.clone(),
            working,
        }
    }

    /// Append statements, keeping the working expression.
    pub fn then(&self, extra: impl IntoIterator<Item = Statement>) -> PartialShader {
        let mut statements = self.statements.clone();
        statements.extend(extra);
        PartialShader {
            statements,
            working: self.working.clone(),
        }
    }

    /// Concatenate another shader's statements after this one's and
    /// continue with a combined working expression.
    pub fn combine(&self, other: &PartialShader, working: Expr) -> PartialShader {
        let mut statements = self.statements.clone();
        statements.extend(other.statements.iter().cloned());
        PartialShader {
            statements,
            working,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_preserve_statement_order_when_combining() {
        let a = PartialShader::with_statements(
            vec![Statement::VarDef(VarDef::new(
                "a0",
                GlslType::Float,
                Expr::Float(1.0),
            ))],
            Expr::var("a0"),
        );
        let b = PartialShader::with_statements(
            vec![Statement::VarDef(VarDef::new(
                "b0",
                GlslType::Float,
                Expr::Float(2.0),
            ))],
            Expr::var("b0"),
        );

        let combined = a.combine(
            &b,
            Expr::raw([Expr::var("a0").into(), " + ".into(), Expr::var("b0").into()]),
        );
        let names: Vec<_> = combined
            .statements
            .iter()
            .map(|s| match s {
                Statement::VarDef(def) => def.name.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["a0", "b0"]);
        assert_eq!(combined.working.to_glsl(), "a0 + b0");
    }

    #[test]
    fn it_should_not_mutate_upstream_snapshots() {
        let upstream = PartialShader::new(Expr::Float(1.0));
        let derived = upstream.then([Statement::SetFragColor(upstream.working.clone())]);
        assert!(upstream.statements.is_empty());
        assert_eq!(derived.statements.len(), 1);
    }
}
