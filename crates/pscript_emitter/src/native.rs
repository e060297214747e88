//! Native backend: lowers resolved trees to a managed-bytecode instruction
//! stream.
//!
//! Writing the stream to a file is someone else's job. This module only
//! decides which instructions a construct becomes.

use pscript_ast::typed::*;
use pscript_ast::types::TypeId;
use pscript_checker::registry::COLLECTION_ADD;
use pscript_checker::{TypeRegistry, INDEXER_NAME};
use pscript_core::error::InternalError;

const BACKEND: &str = "native";
const INDEXER_GET: &str = "get_Item";
const INDEXER_SET: &str = "set_Item";

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Nop,
    Dup,
    Pop,

    // Constants
    LdStr(String),
    LdcI4(i32),
    LdcI8(i64),
    LdcR8(f64),
    LdNull,

    // Locals and fields
    DeclareLocal { name: String, ty: TypeId },
    LdLoc(String),
    StLoc(String),
    LdSFld { owner: TypeId, name: String },
    StSFld { owner: TypeId, name: String },
    LdFld { owner: TypeId, name: String },
    StFld { owner: TypeId, name: String },

    // Calls and construction
    Call { owner: TypeId, method: String, args: usize },
    CallVirt { owner: TypeId, method: String, args: usize },
    NewObj { ty: TypeId, args: usize },
    CastClass(TypeId),

    // Native arrays
    NewArr { element: TypeId },
    NewMultiArr { array: TypeId, rank: u32 },
    LdElem { element: TypeId },
    StElem { element: TypeId },
    /// Element load on an array of rank > 1; indices are on the stack.
    LdElemMulti { array: TypeId, rank: u32 },
    StElemMulti { array: TypeId, rank: u32 },

    // Runtime binder operations on dynamic values
    DynamicGet { name: String },
    DynamicSet { name: String },
    DynamicGetIndex { args: usize },
    DynamicSetIndex { args: usize },
    DynamicCall { method: String, args: usize },
    DynamicInvoke { args: usize },
    DynamicNew { args: usize },
}

/// Collects the instructions for one unit.
pub struct NativeEmitter<'r> {
    registry: &'r TypeRegistry,
    instructions: Vec<Instruction>,
}

impl<'r> NativeEmitter<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry, instructions: Vec::with_capacity(64) }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    fn emit_all(&mut self, exprs: &[TypedExpr]) -> Result<(), InternalError> {
        exprs.iter().try_for_each(|e| e.emit_native(self))
    }

    fn unsupported(expr: &TypedExpr) -> InternalError {
        InternalError::UnsupportedOnBackend { construct: expr.kind_name(), backend: BACKEND, location: expr.loc }
    }

    fn emit_constant(&mut self, constant: &Constant, expr: &TypedExpr) -> Result<(), InternalError> {
        let instruction = match constant {
            Constant::String(s) => Instruction::LdStr(s.clone()),
            Constant::Int(v) => match i32::try_from(*v) {
                Ok(small) => Instruction::LdcI4(small),
                Err(_) => Instruction::LdcI8(*v),
            },
            Constant::Number(v) => Instruction::LdcR8(*v),
            Constant::Bool(v) => Instruction::LdcI4(i32::from(*v)),
            Constant::Null => Instruction::LdNull,
            // Rewritten to constructor calls during resolution.
            Constant::Regex(_) | Constant::Xml(_) => return Err(Self::unsupported(expr)),
        };
        self.push(instruction);
        Ok(())
    }

    fn emit_element_load(&mut self, target: &TypedExpr, args: &[TypedExpr]) -> Result<(), InternalError> {
        target.emit_native(self)?;
        self.emit_all(args)?;
        let instruction = if self.registry.is_dynamic(target.ty) {
            Instruction::DynamicGetIndex { args: args.len() }
        } else if let Some((element, rank)) = self.registry.array_element(target.ty) {
            if rank == 1 {
                Instruction::LdElem { element }
            } else {
                Instruction::LdElemMulti { array: target.ty, rank }
            }
        } else if let Some((owner, _)) = self.registry.find_member(target.ty, INDEXER_NAME) {
            Instruction::CallVirt { owner, method: INDEXER_GET.to_string(), args: args.len() }
        } else {
            Instruction::DynamicGetIndex { args: args.len() }
        };
        self.push(instruction);
        Ok(())
    }

    fn emit_call(&mut self, call: &Call) -> Result<(), InternalError> {
        let args = call.args.len();
        let method = call.method.clone();
        match &call.target {
            CallTarget::Static { owner } => {
                self.emit_all(&call.args)?;
                self.push(Instruction::Call { owner: *owner, method, args });
            }
            CallTarget::Instance { receiver, owner } => {
                receiver.emit_native(self)?;
                self.emit_all(&call.args)?;
                self.push(Instruction::CallVirt { owner: *owner, method, args });
            }
            CallTarget::Dynamic { receiver } => {
                receiver.emit_native(self)?;
                self.emit_all(&call.args)?;
                self.push(Instruction::DynamicCall { method, args });
            }
        }
        Ok(())
    }

    fn emit_new_initialize(
        &mut self,
        ty: TypeId,
        args: &[TypedExpr],
        initializers: &[Initializer],
    ) -> Result<(), InternalError> {
        self.emit_all(args)?;
        self.push(Instruction::NewObj { ty, args: args.len() });
        let keyed = self.registry.is_dynamic_capable(ty);
        for init in initializers {
            self.push(Instruction::Dup);
            match init {
                Initializer::Element(value) => {
                    value.emit_native(self)?;
                    self.push(Instruction::CallVirt { owner: ty, method: COLLECTION_ADD.to_string(), args: 1 });
                }
                Initializer::Named { name, value } if keyed => {
                    self.push(Instruction::LdStr(name.clone()));
                    value.emit_native(self)?;
                    self.push(Instruction::CallVirt { owner: ty, method: INDEXER_SET.to_string(), args: 2 });
                }
                Initializer::Named { name, value } => {
                    value.emit_native(self)?;
                    self.push(Instruction::StFld { owner: ty, name: name.clone() });
                }
            }
        }
        Ok(())
    }

    fn emit_array_creation(
        &mut self,
        expr: &TypedExpr,
        element: TypeId,
        dimensions: &[TypedExpr],
        initializer: Option<&[TypedExpr]>,
    ) -> Result<(), InternalError> {
        let rank = dimensions.len() as u32;
        if let Some(values) = initializer {
            let target_rank = self.registry.array_element(expr.ty).map(|(_, r)| r);
            if rank != 1 || target_rank != Some(1) {
                return Err(InternalError::UnsupportedShape {
                    construct: "array creation",
                    detail: format!(
                        "initializer with {} dimension expressions for a rank {} array",
                        rank,
                        target_rank.unwrap_or(0)
                    ),
                });
            }
            self.emit_all(dimensions)?;
            self.push(Instruction::NewArr { element });
            for (index, value) in values.iter().enumerate() {
                let index = i32::try_from(index).map_err(|_| InternalError::UnsupportedShape {
                    construct: "array creation",
                    detail: "initializer too long".to_string(),
                })?;
                self.push(Instruction::Dup);
                self.push(Instruction::LdcI4(index));
                value.emit_native(self)?;
                self.push(Instruction::StElem { element });
            }
            return Ok(());
        }

        self.emit_all(dimensions)?;
        if rank == 1 {
            self.push(Instruction::NewArr { element });
        } else {
            self.push(Instruction::NewMultiArr { array: expr.ty, rank });
        }
        Ok(())
    }

    /// Store `value` into `target`. With `keep_value`, the stored value is
    /// left on the stack as the result of the assignment expression.
    fn emit_assign(&mut self, target: &TypedExpr, value: &TypedExpr, keep_value: bool) -> Result<(), InternalError> {
        match &target.kind {
            TypedExprKind::Local(name) => {
                value.emit_native(self)?;
                if keep_value {
                    self.push(Instruction::Dup);
                }
                self.push(Instruction::StLoc(name.clone()));
                return Ok(());
            }
            TypedExprKind::StaticField { owner, name } => {
                value.emit_native(self)?;
                if keep_value {
                    self.push(Instruction::Dup);
                }
                self.push(Instruction::StSFld { owner: *owner, name: name.clone() });
                return Ok(());
            }
            _ if keep_value => {
                return Err(InternalError::UnsupportedShape {
                    construct: "assignment",
                    detail: format!("value of a {} store used as an expression", target.kind_name()),
                });
            }
            _ => {}
        }

        match &target.kind {
            TypedExprKind::InstanceField { target: object, owner, name } => {
                object.emit_native(self)?;
                value.emit_native(self)?;
                self.push(Instruction::StFld { owner: *owner, name: name.clone() });
            }
            TypedExprKind::DynamicMember { target: object, name } => {
                object.emit_native(self)?;
                value.emit_native(self)?;
                self.push(Instruction::DynamicSet { name: name.clone() });
            }
            TypedExprKind::ElementAccess { target: object, args } => {
                object.emit_native(self)?;
                self.emit_all(args)?;
                value.emit_native(self)?;
                let instruction = if self.registry.is_dynamic(object.ty) {
                    Instruction::DynamicSetIndex { args: args.len() }
                } else if let Some((element, rank)) = self.registry.array_element(object.ty) {
                    if rank == 1 {
                        Instruction::StElem { element }
                    } else {
                        Instruction::StElemMulti { array: object.ty, rank }
                    }
                } else if let Some((owner, _)) = self.registry.find_member(object.ty, INDEXER_NAME) {
                    Instruction::CallVirt { owner, method: INDEXER_SET.to_string(), args: args.len() + 1 }
                } else {
                    Instruction::DynamicSetIndex { args: args.len() }
                };
                self.push(instruction);
            }
            _ => {
                return Err(InternalError::UnsupportedShape {
                    construct: "assignment",
                    detail: format!("cannot store into a {}", target.kind_name()),
                })
            }
        }
        Ok(())
    }

    /// Evaluate `expr` for its effects only.
    fn emit_discarded(&mut self, expr: &TypedExpr) -> Result<(), InternalError> {
        if let TypedExprKind::Assign { target, value } = &expr.kind {
            return self.emit_assign(target, value, false);
        }
        expr.emit_native(self)?;
        if expr.class.has_value() {
            self.push(Instruction::Pop);
        }
        Ok(())
    }
}

/// Lowering into the native instruction stream.
pub trait EmitNative {
    fn emit_native(&self, out: &mut NativeEmitter<'_>) -> Result<(), InternalError>;
}

impl EmitNative for TypedExpr {
    fn emit_native(&self, out: &mut NativeEmitter<'_>) -> Result<(), InternalError> {
        match &self.kind {
            TypedExprKind::Constant(c) => out.emit_constant(c, self)?,
            TypedExprKind::Local(name) => out.push(Instruction::LdLoc(name.clone())),
            TypedExprKind::TypeRef => {
                return Err(InternalError::UnsupportedShape {
                    construct: "type reference",
                    detail: "a type is not a value".to_string(),
                })
            }
            TypedExprKind::StaticField { owner, name } => {
                out.push(Instruction::LdSFld { owner: *owner, name: name.clone() })
            }
            TypedExprKind::InstanceField { target, owner, name } => {
                target.emit_native(out)?;
                out.push(Instruction::LdFld { owner: *owner, name: name.clone() });
            }
            TypedExprKind::DynamicMember { target, name } => {
                target.emit_native(out)?;
                out.push(Instruction::DynamicGet { name: name.clone() });
            }
            TypedExprKind::ElementAccess { target, args } => out.emit_element_load(target, args)?,
            TypedExprKind::Call(call) => out.emit_call(call)?,
            TypedExprKind::DynamicInvoke { callee, args } => {
                callee.emit_native(out)?;
                out.emit_all(args)?;
                out.push(Instruction::DynamicInvoke { args: args.len() });
            }
            TypedExprKind::Cast { operand } => {
                operand.emit_native(out)?;
                out.push(Instruction::CastClass(self.ty));
            }
            TypedExprKind::New { args } => {
                out.emit_all(args)?;
                out.push(Instruction::NewObj { ty: self.ty, args: args.len() });
            }
            TypedExprKind::DynamicNew { callee, args } => {
                callee.emit_native(out)?;
                out.emit_all(args)?;
                out.push(Instruction::DynamicNew { args: args.len() });
            }
            TypedExprKind::NewInitialize { args, initializers } => {
                out.emit_new_initialize(self.ty, args, initializers)?
            }
            TypedExprKind::ArrayCreation { element, dimensions, initializer } => {
                out.emit_array_creation(self, *element, dimensions, initializer.as_deref())?
            }
            TypedExprKind::Assign { target, value } => out.emit_assign(target, value, true)?,
            TypedExprKind::ScriptDelete(_)
            | TypedExprKind::ScriptNew(_)
            | TypedExprKind::ScriptTypeof(_)
            | TypedExprKind::ScriptIn { .. }
            | TypedExprKind::ScriptUndefined
            | TypedExprKind::ObjectLiteral(_)
            | TypedExprKind::ArrayLiteral(_) => return Err(NativeEmitter::unsupported(self)),
        }
        Ok(())
    }
}

impl EmitNative for TypedStmt {
    fn emit_native(&self, out: &mut NativeEmitter<'_>) -> Result<(), InternalError> {
        match &self.kind {
            TypedStmtKind::VarDecl { name, ty, initializer } => {
                out.push(Instruction::DeclareLocal { name: name.clone(), ty: *ty });
                if let Some(init) = initializer {
                    init.emit_native(out)?;
                    out.push(Instruction::StLoc(name.clone()));
                }
            }
            TypedStmtKind::Expression(expr) => out.emit_discarded(expr)?,
            TypedStmtKind::NonAssign(expr) => {
                if !expr.is_side_effect_free() {
                    out.emit_discarded(expr)?;
                }
            }
            TypedStmtKind::Block(stmts) => stmts.iter().try_for_each(|s| s.emit_native(out))?,
            TypedStmtKind::LocalFunction { .. } | TypedStmtKind::UseNamespace { .. } => {}
        }
        Ok(())
    }
}

/// Lower a resolved unit to instructions.
pub fn emit_native_unit(stmts: &[TypedStmt], registry: &TypeRegistry) -> Result<Vec<Instruction>, InternalError> {
    let mut out = NativeEmitter::new(registry);
    for stmt in stmts {
        stmt.emit_native(&mut out)?;
    }
    tracing::debug!(instructions = out.instructions().len(), "native unit emitted");
    Ok(out.into_instructions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pscript_ast::types::ExprClass;
    use pscript_core::text::Location;

    fn loc() -> Location {
        Location::default()
    }

    #[test]
    fn test_int_constants_pick_width() {
        let reg = TypeRegistry::new();
        let int = reg.builtins().int;
        let mut out = NativeEmitter::new(&reg);
        TypedExpr::value(TypedExprKind::Constant(Constant::Int(7)), int, loc()).emit_native(&mut out).unwrap();
        TypedExpr::value(TypedExprKind::Constant(Constant::Int(1 << 40)), int, loc())
            .emit_native(&mut out)
            .unwrap();
        assert_eq!(out.instructions(), &[Instruction::LdcI4(7), Instruction::LdcI8(1 << 40)]);
    }

    #[test]
    fn test_script_only_forms_are_fatal() {
        let reg = TypeRegistry::new();
        let mut out = NativeEmitter::new(&reg);
        let undefined = TypedExpr::value(TypedExprKind::ScriptUndefined, reg.builtins().dynamic, loc());
        let err = undefined.emit_native(&mut out).unwrap_err();
        assert!(matches!(err, InternalError::UnsupportedOnBackend { backend: "native", .. }));
    }

    #[test]
    fn test_initializer_on_multi_dimensional_array_is_fatal() {
        let reg = TypeRegistry::new();
        let int = reg.builtins().int;
        let two = TypedExpr::value(TypedExprKind::Constant(Constant::Int(2)), int, loc());
        let expr = TypedExpr::value(
            TypedExprKind::ArrayCreation {
                element: int,
                dimensions: vec![two.clone(), two.clone()],
                initializer: Some(vec![two]),
            },
            reg.make_array(int, 2),
            loc(),
        );
        let err = expr.emit_native(&mut NativeEmitter::new(&reg)).unwrap_err();
        assert!(matches!(err, InternalError::UnsupportedShape { construct: "array creation", .. }));
    }

    #[test]
    fn test_void_call_statement_has_no_pop() {
        let reg = TypeRegistry::new();
        let p = *reg.predefined();
        let receiver = TypedExpr::new(TypedExprKind::Local("a".into()), p.array, ExprClass::Variable, loc());
        let call = Call {
            target: CallTarget::Instance { receiver: Box::new(receiver), owner: p.array },
            method: "Add".into(),
            args: vec![],
        };
        let expr = TypedExpr::new(TypedExprKind::Call(call), reg.builtins().void, ExprClass::Nothing, loc());
        let stmt = TypedStmt::new(TypedStmtKind::Expression(expr), loc());
        let code = emit_native_unit(&[stmt], &reg).unwrap();
        assert_eq!(code.last(), Some(&Instruction::CallVirt { owner: p.array, method: "Add".into(), args: 0 }));
    }
}
