//! Lowers a finished [`PartialShader`] into GLSL fragment-shader source.
//!
//! Emission is dependency-ordered and dead-code-free: starting from the
//! commit statement, variable definitions are pulled in only as they
//! are referenced, and each definition is emitted after the definitions
//! it references, so it always appears before its first use.
//! Definitions nothing references are never emitted.

use hashbrown::{HashMap, HashSet};

use crate::error::GraphError;
use crate::glsl::{PartialShader, Statement, VarDef};

/// Fixed inputs every generated shader declares: the interpolated
/// texture coordinate, the canvas resolution, and the live video frame.
const PREAMBLE: &str = "precision mediump float;\n\
                        \n\
                        varying vec2 vTexCoord;\n\
                        \n\
                        uniform vec2 resolution;\n\
                        uniform sampler2D videoTexture;\n";

const INDENT: &str = "    ";

/// Generate complete fragment-shader source from a finished shader.
///
/// Fails with [`GraphError::UndefinedVariable`] when the commit
/// statement (or a live definition) references a name no definition
/// provides.
pub fn generate_shader(shader: &PartialShader) -> Result<String, GraphError> {
    let mut pending: HashMap<&str, &VarDef> = HashMap::new();
    let mut commit: Option<&Statement> = None;

    for statement in &shader.statements {
        match statement {
            Statement::VarDef(def) => {
                // Re-registered names come from a snapshot shared by two
                // branches; the definitions are identical, keep the first.
                pending.entry(def.name.as_str()).or_insert(def);
            }
            Statement::SetFragColor(_) => {
                if commit.is_none() {
                    commit = Some(statement);
                }
            }
        }
    }

    let mut body: Vec<String> = Vec::new();
    let mut declared: HashSet<String> = HashSet::new();

    if let Some(statement) = commit {
        let mut refs = Vec::new();
        statement.collect_refs(&mut refs);
        for name in &refs {
            emit_def(name, &mut pending, &mut declared, &mut body)?;
        }
        body.push(statement.to_glsl());
    }

    let mut out = String::from(PREAMBLE);
    out.push_str("\nvoid main() {\n");
    for line in &body {
        out.push_str(INDENT);
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("}\n");
    Ok(out)
}

/// Emit `name`'s definition, recursing into the definitions its
/// initializer references first so a definition shared by several users
/// lands above all of them.
fn emit_def<'a>(
    name: &str,
    pending: &mut HashMap<&'a str, &'a VarDef>,
    declared: &mut HashSet<String>,
    body: &mut Vec<String>,
) -> Result<(), GraphError> {
    if declared.contains(name) {
        return Ok(());
    }
    let def = pending
        .remove(name)
        .ok_or_else(|| GraphError::UndefinedVariable(name.to_string()))?;
    declared.insert(name.to_string());

    let mut refs = Vec::new();
    def.init.collect_refs(&mut refs);
    for dep in &refs {
        emit_def(dep, pending, declared, body)?;
    }
    body.push(def.to_glsl());
    Ok(())
}
