//! Scripting backend: prints resolved trees as source for the dynamic
//! scripting runtime.

use pscript_ast::typed::*;
use pscript_checker::TypeRegistry;
use pscript_core::error::InternalError;
use pscript_core::text::Location;

const BACKEND: &str = "script";

/// Append-only output text. Every write records where it came from so a
/// source map can be built later.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuffer {
    text: String,
    marks: Vec<(usize, Location)>,
}

impl ScriptBuffer {
    pub fn new() -> Self {
        Self { text: String::with_capacity(1024), marks: Vec::new() }
    }

    pub fn write(&mut self, text: &str, location: Location) {
        if self.marks.last().map(|(_, l)| *l) != Some(location) {
            self.marks.push((self.text.len(), location));
        }
        self.text.push_str(text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offsets in the output where a new source location starts.
    pub fn marks(&self) -> &[(usize, Location)] {
        &self.marks
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

pub struct ScriptWriter<'r> {
    registry: &'r TypeRegistry,
    buffer: ScriptBuffer,
    indent_level: u32,
}

impl<'r> ScriptWriter<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry, buffer: ScriptBuffer::new(), indent_level: 0 }
    }

    pub fn write(&mut self, text: &str, location: Location) {
        self.buffer.write(text, location);
    }

    pub fn buffer(&self) -> &ScriptBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> ScriptBuffer {
        self.buffer
    }

    fn write_indent(&mut self, location: Location) {
        for _ in 0..=self.indent_level {
            self.buffer.write("\t", location);
        }
    }

    fn write_list(&mut self, items: &[TypedExpr], location: Location) -> Result<(), InternalError> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ", location);
            }
            item.emit_script(self)?;
        }
        Ok(())
    }

    fn write_string(&mut self, value: &str, location: Location) -> Result<(), InternalError> {
        let quoted = serde_json::to_string(value).map_err(|e| InternalError::UnsupportedShape {
            construct: "string literal",
            detail: e.to_string(),
        })?;
        self.write(&quoted, location);
        Ok(())
    }

    fn write_constant(&mut self, constant: &Constant, location: Location) -> Result<(), InternalError> {
        match constant {
            Constant::String(s) => return self.write_string(s, location),
            Constant::Int(v) => self.write(&v.to_string(), location),
            Constant::Number(v) => self.write(&format_number(*v), location),
            Constant::Bool(v) => self.write(if *v { "true" } else { "false" }, location),
            Constant::Null => self.write("null", location),
            Constant::Regex(lit) => self.write(&lit.value(), location),
            Constant::Xml(lit) => self.write(lit.text(), location),
        }
        Ok(())
    }

    fn unsupported(expr: &TypedExpr) -> InternalError {
        InternalError::UnsupportedOnBackend { construct: expr.kind_name(), backend: BACKEND, location: expr.loc }
    }
}

fn format_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        v.to_string()
    }
}

/// Printing into the scripting backend's text buffer.
pub trait EmitScript {
    fn emit_script(&self, out: &mut ScriptWriter<'_>) -> Result<(), InternalError>;
}

impl EmitScript for TypedExpr {
    fn emit_script(&self, out: &mut ScriptWriter<'_>) -> Result<(), InternalError> {
        let loc = self.loc;
        match &self.kind {
            TypedExprKind::Constant(c) => out.write_constant(c, loc)?,
            TypedExprKind::Local(name) => out.write(name, loc),
            TypedExprKind::TypeRef => {
                let name = out.registry.type_name(self.ty);
                out.write(&name, loc);
            }
            TypedExprKind::StaticField { owner, name } => {
                let owner = out.registry.type_name(*owner);
                out.write(&owner, loc);
                out.write(".", loc);
                out.write(name, loc);
            }
            TypedExprKind::InstanceField { target, name, .. } | TypedExprKind::DynamicMember { target, name } => {
                target.emit_script(out)?;
                out.write(".", loc);
                out.write(name, loc);
            }
            TypedExprKind::ElementAccess { target, args } => {
                target.emit_script(out)?;
                out.write("[", loc);
                out.write_list(args, loc)?;
                out.write("]", loc);
            }
            TypedExprKind::Call(call) => {
                match &call.target {
                    CallTarget::Static { owner } => {
                        let owner = out.registry.type_name(*owner);
                        out.write(&owner, loc);
                    }
                    CallTarget::Instance { receiver, .. } | CallTarget::Dynamic { receiver } => {
                        receiver.emit_script(out)?
                    }
                }
                out.write(".", loc);
                out.write(&call.method, loc);
                out.write("(", loc);
                out.write_list(&call.args, loc)?;
                out.write(")", loc);
            }
            TypedExprKind::DynamicInvoke { callee, args } => {
                callee.emit_script(out)?;
                out.write("(", loc);
                out.write_list(args, loc)?;
                out.write(")", loc);
            }
            TypedExprKind::New { args } => {
                let name = out.registry.type_name(self.ty);
                out.write("new ", loc);
                out.write(&name, loc);
                out.write("(", loc);
                out.write_list(args, loc)?;
                out.write(")", loc);
            }
            TypedExprKind::DynamicNew { callee, args } => {
                out.write("new ", loc);
                callee.emit_script(out)?;
                out.write("(", loc);
                out.write_list(args, loc)?;
                out.write(")", loc);
            }
            TypedExprKind::Assign { target, value } => {
                target.emit_script(out)?;
                out.write(" = ", loc);
                value.emit_script(out)?;
            }
            TypedExprKind::ScriptDelete(operand) => {
                out.write("delete ", loc);
                operand.emit_script(out)?;
            }
            TypedExprKind::ScriptNew(operand) => {
                out.write("new ", loc);
                operand.emit_script(out)?;
            }
            TypedExprKind::ScriptTypeof(operand) => {
                out.write("typeof ", loc);
                operand.emit_script(out)?;
            }
            TypedExprKind::ScriptIn { key, container } => {
                key.emit_script(out)?;
                out.write(" in ", loc);
                container.emit_script(out)?;
            }
            TypedExprKind::ScriptUndefined => out.write("undefined", loc),
            TypedExprKind::ObjectLiteral(pairs) => {
                out.write("{", loc);
                for (i, (name, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.write(", ", loc);
                    }
                    out.write_string(name, loc)?;
                    out.write(":", loc);
                    value.emit_script(out)?;
                }
                out.write("}", loc);
            }
            TypedExprKind::ArrayLiteral(elements) => {
                out.write("[", loc);
                out.write_list(elements, loc)?;
                out.write("]", loc);
            }
            // Native-only rewrites.
            TypedExprKind::Cast { .. }
            | TypedExprKind::NewInitialize { .. }
            | TypedExprKind::ArrayCreation { .. } => return Err(ScriptWriter::unsupported(self)),
        }
        Ok(())
    }
}

impl EmitScript for TypedStmt {
    fn emit_script(&self, out: &mut ScriptWriter<'_>) -> Result<(), InternalError> {
        let loc = self.loc;
        match &self.kind {
            TypedStmtKind::VarDecl { name, initializer, .. } => {
                out.write_indent(loc);
                out.write("var ", loc);
                out.write(name, loc);
                if let Some(init) = initializer {
                    out.write(" = ", loc);
                    init.emit_script(out)?;
                }
                out.write(";\n", loc);
            }
            TypedStmtKind::Expression(expr) => {
                out.write_indent(loc);
                expr.emit_script(out)?;
                out.write(";\n", loc);
            }
            TypedStmtKind::NonAssign(expr) => {
                if !expr.is_side_effect_free() {
                    out.write_indent(loc);
                    expr.emit_script(out)?;
                    out.write(";\n", loc);
                }
            }
            TypedStmtKind::Block(stmts) => {
                out.write_indent(loc);
                out.write("{\n", loc);
                out.indent_level += 1;
                let body = stmts.iter().try_for_each(|s| s.emit_script(out));
                out.indent_level -= 1;
                body?;
                out.write_indent(loc);
                out.write("}\n", loc);
            }
            TypedStmtKind::LocalFunction { .. } | TypedStmtKind::UseNamespace { .. } => {}
        }
        Ok(())
    }
}

/// Print a resolved unit as script text.
pub fn emit_script_unit(stmts: &[TypedStmt], registry: &TypeRegistry) -> Result<String, InternalError> {
    let mut out = ScriptWriter::new(registry);
    for stmt in stmts {
        stmt.emit_script(&mut out)?;
    }
    tracing::debug!(bytes = out.buffer().text().len(), "script unit emitted");
    Ok(out.into_buffer().into_text())
}
