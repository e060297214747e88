//! `delete` and `new`.

use super::expr::{display_expr, dotted_name};
use crate::context::ResolveContext;
use crate::infer::InferenceSite;
use crate::registry::DELETE_DYNAMIC_VALUE;
use pscript_ast::node::*;
use pscript_ast::typed::*;
use pscript_ast::types::{ExprClass, TypeId};
use pscript_core::text::Location;
use pscript_diagnostics::messages;

impl ResolveContext<'_> {
    pub(crate) fn resolve_delete(&mut self, n: &DeleteExpr, loc: Location) -> Option<TypedExpr> {
        if self.is_script() {
            let operand = self.resolve_expr(&n.operand)?;
            let kind = TypedExprKind::ScriptDelete(Box::new(operand));
            return Some(TypedExpr::value(kind, self.builtins().dynamic, loc));
        }

        let (target, key, indexed) = match &n.operand.kind {
            ExprKind::ElementAccess(ea) => {
                if ea.args.len() != 1 {
                    self.error(&messages::DELETE_MUST_HAVE_ONLY_ONE_INDEX_ARGUMENT, loc, &[]);
                    return None;
                }
                let target = self.resolve_expr(&ea.target);
                let key = self.resolve_expr(&ea.args[0]);
                (target?, key?, true)
            }
            ExprKind::MemberAccess(ma) => {
                let target = self.resolve_expr(&ma.target)?;
                let key = TypedExpr::string(ma.name.as_str(), self.builtins().string, n.operand.loc);
                (target, key, false)
            }
            _ => {
                self.error(&messages::DELETE_OPERAND_MUST_BE_PROPERTY_REFERENCE, n.operand.loc, &[]);
                return None;
            }
        };

        // `delete a[i]` on an array gets its own code; `delete a.x` falls to the capability check.
        let registry = self.registry();
        if indexed && registry.is_array(target.ty) {
            self.error(&messages::DELETE_NOT_ALLOWED_ON_ARRAYS, loc, &[]);
            return None;
        }
        if !registry.is_dynamic_capable(target.ty) {
            self.error(&messages::DELETE_ONLY_ALLOWED_ON_DYNAMIC_TYPES, loc, &[]);
            return None;
        }

        let capability = self.predefined().dynamic_class;
        tracing::debug!(receiver = %self.type_name(target.ty), "delete rewritten to {}", DELETE_DYNAMIC_VALUE);
        let receiver = cast(target, capability);
        self.instance_call(receiver, capability, DELETE_DYNAMIC_VALUE, vec![key], loc)
    }

    pub(crate) fn resolve_new(&mut self, n: &NewExpr, loc: Location, site: &InferenceSite) -> Option<TypedExpr> {
        if self.is_script() {
            let operand = match &n.operand.kind {
                ExprKind::Invocation(inv) => {
                    let callee = self.resolve_expr(&inv.callee);
                    let args = self.resolve_all(&inv.args);
                    let kind = TypedExprKind::DynamicInvoke { callee: Box::new(callee?), args: args? };
                    TypedExpr::value(kind, self.builtins().dynamic, n.operand.loc)
                }
                _ => self.resolve_expr(&n.operand)?,
            };
            let kind = TypedExprKind::ScriptNew(Box::new(operand));
            return Some(TypedExpr::value(kind, self.builtins().dynamic, loc));
        }

        match &n.operand.kind {
            ExprKind::ArrayInitializer(init) => self.resolve_array_initializer(init, n.operand.loc, site),
            ExprKind::Invocation(inv) => self.resolve_new_invocation(inv, loc),
            ExprKind::ElementAccess(ea) => self.resolve_new_array(ea, loc),
            _ => {
                let operand = self.resolve_expr(&n.operand)?;
                self.new_from_operand(operand, Vec::new(), &n.operand, loc)
            }
        }
    }

    /// `new Callee(args)`
    fn resolve_new_invocation(&mut self, inv: &Invocation, loc: Location) -> Option<TypedExpr> {
        if let Some(ty) = self.resolve_as_type(&inv.callee) {
            let args = self.resolve_all(&inv.args)?;
            return self.construct(ty, args, loc);
        }
        let callee = self.resolve_expr(&inv.callee);
        let args = self.resolve_all(&inv.args);
        self.new_from_operand(callee?, args?, &inv.callee, loc)
    }

    /// Construct from something that was not written as a type.
    fn new_from_operand(&mut self, operand: TypedExpr, args: Vec<TypedExpr>, source: &Expr, loc: Location) -> Option<TypedExpr> {
        if operand.class == ExprClass::Type {
            return self.construct(operand.ty, args, loc);
        }
        if self.registry().is_dynamic(operand.ty) {
            let kind = TypedExprKind::DynamicNew { callee: Box::new(operand), args };
            return Some(TypedExpr::value(kind, self.builtins().dynamic, loc));
        }
        self.error(&messages::EXPRESSION_DENOTES_A_VALUE_WHERE_A_TYPE_WAS_EXPECTED, source.loc, &[&display_expr(source)]);
        None
    }

    /// `new T[d0, d1, ...]`: one dimension per index argument.
    ///
    /// Only flat multi-dimensional creation is supported. A nested element
    /// access (`new T[a][b]`) is rejected instead of guessing jagged semantics.
    fn resolve_new_array(&mut self, ea: &ElementAccess, loc: Location) -> Option<TypedExpr> {
        if !self.is_extended() {
            self.error(&messages::NATIVE_ARRAYS_ONLY_IN_EXTENDED_DIALECT, loc, &[]);
            return None;
        }
        if matches!(ea.target.kind, ExprKind::ElementAccess(_)) {
            self.error(&messages::JAGGED_ARRAY_CREATION_NOT_SUPPORTED, loc, &[]);
            return None;
        }
        if ea.args.is_empty() {
            self.error(&messages::ARRAY_CREATION_MUST_HAVE_SIZE, loc, &[]);
            return None;
        }

        let element = self.array_element_type(&ea.target);
        let dimensions = self.resolve_all(&ea.args);
        let (element, dimensions) = (element?, dimensions?);

        let rank = dimensions.len() as u32;
        let ty = self.registry().make_array(element, rank);
        tracing::debug!(ty = %self.type_name(ty), "native array creation");
        let kind = TypedExprKind::ArrayCreation { element, dimensions, initializer: None };
        Some(TypedExpr::value(kind, ty, loc))
    }

    fn array_element_type(&mut self, target: &Expr) -> Option<TypeId> {
        if let ExprKind::TypeRef(name) = &target.kind {
            return self.resolve_type_name(name);
        }
        if let Some(ty) = self.resolve_as_type(target) {
            return Some(ty);
        }
        match dotted_name(target) {
            Some(name) if self.lookup_local(name.split('.').next().unwrap_or_default()).is_none() => {
                self.error(&messages::TYPE_0_COULD_NOT_BE_FOUND, target.loc, &[&name]);
            }
            _ => {
                self.error(&messages::EXPRESSION_DENOTES_A_VALUE_WHERE_A_TYPE_WAS_EXPECTED, target.loc, &[&display_expr(target)]);
            }
        }
        None
    }
}

/// View `operand` as `ty`.
pub(crate) fn cast(operand: TypedExpr, ty: TypeId) -> TypedExpr {
    let loc = operand.loc;
    TypedExpr::value(TypedExprKind::Cast { operand: Box::new(operand) }, ty, loc)
}
