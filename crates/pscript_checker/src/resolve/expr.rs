//! Host-language forms: names, member and element access, calls,
//! assignment, and written types.

use crate::context::ResolveContext;
use crate::infer::InferenceSite;
use crate::types::{MemberKind, INDEXER_NAME};
use pscript_ast::node::*;
use pscript_ast::typed::*;
use pscript_ast::types::{ExprClass, TypeFlags, TypeId};
use pscript_core::text::Location;
use pscript_diagnostics::messages;

/// Largest generic arity tried when reporting a wrong argument count.
const MAX_CHECKED_ARITY: u32 = 4;

/// `a.b.c` for a chain of names and member accesses.
pub(crate) fn dotted_name(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Name(name) => Some(name.clone()),
        ExprKind::MemberAccess(n) => Some(format!("{}.{}", dotted_name(&n.target)?, n.name)),
        _ => None,
    }
}

/// How an expression reads in a diagnostic.
pub(crate) fn display_expr(expr: &Expr) -> String {
    dotted_name(expr).unwrap_or_else(|| expr.kind_name().to_string())
}

fn root_name(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Name(name) => Some(name),
        ExprKind::MemberAccess(n) => root_name(&n.target),
        _ => None,
    }
}

impl ResolveContext<'_> {
    pub(crate) fn resolve_literal(&mut self, lit: &Literal, loc: Location) -> TypedExpr {
        let b = self.builtins();
        let (constant, ty) = match lit {
            Literal::String(s) => (Constant::String(s.clone()), b.string),
            Literal::Int(v) => (Constant::Int(*v), b.int),
            Literal::Number(v) => (Constant::Number(*v), b.number),
            Literal::Bool(v) => (Constant::Bool(*v), b.boolean),
            Literal::Null => (Constant::Null, b.null),
        };
        TypedExpr::value(TypedExprKind::Constant(constant), ty, loc)
    }

    pub(crate) fn resolve_name(&mut self, name: &str, loc: Location) -> Option<TypedExpr> {
        if let Some(ty) = self.lookup_local(name) {
            return Some(TypedExpr::new(TypedExprKind::Local(name.to_string()), ty, ExprClass::Variable, loc));
        }
        if let Some(ty) = self.registry().lookup(name, 0) {
            return Some(TypedExpr::new(TypedExprKind::TypeRef, ty, ExprClass::Type, loc));
        }
        self.error(&messages::NAME_0_DOES_NOT_EXIST, loc, &[name]);
        None
    }

    pub(crate) fn resolve_type_ref(&mut self, name: &TypeName) -> Option<TypedExpr> {
        let ty = self.resolve_type_name(name)?;
        Some(TypedExpr::new(TypedExprKind::TypeRef, ty, ExprClass::Type, name.loc))
    }

    pub(crate) fn resolve_member_access(&mut self, expr: &Expr) -> Option<TypedExpr> {
        let ExprKind::MemberAccess(n) = &expr.kind else {
            return self.resolve_expr(expr);
        };
        let loc = expr.loc;

        // `ns.Type` names a type unless its first segment is a local.
        if root_name(expr).is_some_and(|root| self.lookup_local(root).is_none()) {
            if let Some(ty) = dotted_name(expr).and_then(|path| self.registry().lookup(&path, 0)) {
                return Some(TypedExpr::new(TypedExprKind::TypeRef, ty, ExprClass::Type, loc));
            }
        }

        let target = self.resolve_expr(&n.target)?;
        self.member_of(target, &n.name, loc)
    }

    /// Field access on an already resolved target.
    fn member_of(&mut self, target: TypedExpr, name: &str, loc: Location) -> Option<TypedExpr> {
        let registry = self.registry();
        if target.class != ExprClass::Type && registry.is_dynamic(target.ty) {
            let dynamic = self.builtins().dynamic;
            let kind = TypedExprKind::DynamicMember { target: Box::new(target), name: name.to_string() };
            return Some(TypedExpr::new(kind, dynamic, ExprClass::Variable, loc));
        }

        let is_static = target.class == ExprClass::Type;
        match registry.find_member(target.ty, name) {
            Some((owner, member)) if member.is_static == is_static => match member.kind {
                MemberKind::Field { ty } if is_static => Some(TypedExpr::new(
                    TypedExprKind::StaticField { owner, name: name.to_string() },
                    ty,
                    ExprClass::Variable,
                    loc,
                )),
                MemberKind::Field { ty } => Some(TypedExpr::new(
                    TypedExprKind::InstanceField { target: Box::new(target), owner, name: name.to_string() },
                    ty,
                    ExprClass::Variable,
                    loc,
                )),
                MemberKind::Method { .. } | MemberKind::Indexer { .. } => {
                    self.error(&messages::METHOD_GROUP_USED_AS_VALUE, loc, &[name]);
                    None
                }
            },
            _ if !is_static && registry.is_dynamic_class(target.ty) => {
                let dynamic = self.builtins().dynamic;
                let kind = TypedExprKind::DynamicMember { target: Box::new(target), name: name.to_string() };
                Some(TypedExpr::new(kind, dynamic, ExprClass::Variable, loc))
            }
            _ => {
                let type_name = self.type_name(target.ty);
                self.error(&messages::TYPE_0_DOES_NOT_CONTAIN_A_DEFINITION_FOR_1, loc, &[type_name.as_str(), name]);
                None
            }
        }
    }

    pub(crate) fn resolve_element_access(&mut self, n: &ElementAccess, loc: Location) -> Option<TypedExpr> {
        let target = self.resolve_expr(&n.target);
        let args = self.resolve_all(&n.args);
        let (target, args) = (target?, args?);

        let registry = self.registry();
        let ty = if registry.is_dynamic(target.ty) {
            self.builtins().dynamic
        } else if let Some((element, _)) = registry.array_element(target.ty) {
            element
        } else if let Some((_, indexer)) = registry.find_member(target.ty, INDEXER_NAME) {
            indexer.value_type()
        } else if registry.is_dynamic_class(target.ty) {
            self.builtins().dynamic
        } else {
            let type_name = self.type_name(target.ty);
            self.error(&messages::CANNOT_APPLY_INDEXING_TO_0, loc, &[&type_name]);
            return None;
        };
        let kind = TypedExprKind::ElementAccess { target: Box::new(target), args };
        Some(TypedExpr::new(kind, ty, ExprClass::Variable, loc))
    }

    pub(crate) fn resolve_invocation(&mut self, n: &Invocation, loc: Location) -> Option<TypedExpr> {
        if let ExprKind::MemberAccess(m) = &n.callee.kind {
            // A dotted path naming a type is a (non-invocable) type, not a receiver.
            let names_type = root_name(&n.callee).is_some_and(|root| self.lookup_local(root).is_none())
                && dotted_name(&n.callee).is_some_and(|p| self.registry().lookup(&p, 0).is_some());
            if !names_type {
                let receiver = self.resolve_expr(&m.target);
                let args = self.resolve_all(&n.args);
                return self.method_call(receiver?, &m.name, args?, loc);
            }
        }

        let callee = self.resolve_expr(&n.callee);
        let args = self.resolve_all(&n.args);
        let (callee, args) = (callee?, args?);
        if callee.class != ExprClass::Type && self.registry().is_dynamic(callee.ty) {
            let dynamic = self.builtins().dynamic;
            let kind = TypedExprKind::DynamicInvoke { callee: Box::new(callee), args };
            return Some(TypedExpr::value(kind, dynamic, loc));
        }
        self.error(&messages::NON_INVOCABLE_MEMBER_0, loc, &[&display_expr(&n.callee)]);
        None
    }

    /// `receiver.name(args)`, with `receiver` a type for static calls.
    fn method_call(&mut self, receiver: TypedExpr, name: &str, args: Vec<TypedExpr>, loc: Location) -> Option<TypedExpr> {
        if receiver.class == ExprClass::Type {
            return self.static_call(receiver.ty, name, args, loc);
        }
        let registry = self.registry();
        if registry.is_dynamic(receiver.ty) {
            return Some(self.dynamic_call(receiver, name, args, loc));
        }
        match registry.find_member(receiver.ty, name) {
            Some((_, member)) if matches!(member.kind, MemberKind::Field { .. }) => {
                if registry.is_dynamic(member.value_type()) {
                    let field = self.member_of(receiver, name, loc)?;
                    let dynamic = self.builtins().dynamic;
                    let kind = TypedExprKind::DynamicInvoke { callee: Box::new(field), args };
                    return Some(TypedExpr::value(kind, dynamic, loc));
                }
                self.error(&messages::NON_INVOCABLE_MEMBER_0, loc, &[name]);
                None
            }
            None if registry.is_dynamic_class(receiver.ty) => Some(self.dynamic_call(receiver, name, args, loc)),
            _ => {
                let owner = receiver.ty;
                self.instance_call(receiver, owner, name, args, loc)
            }
        }
    }

    fn dynamic_call(&mut self, receiver: TypedExpr, name: &str, args: Vec<TypedExpr>, loc: Location) -> TypedExpr {
        let call = Call {
            target: CallTarget::Dynamic { receiver: Box::new(receiver) },
            method: name.to_string(),
            args,
        };
        TypedExpr::value(TypedExprKind::Call(call), self.builtins().dynamic, loc)
    }

    /// Call static method `name` on `owner`.
    pub(crate) fn static_call(&mut self, owner: TypeId, name: &str, args: Vec<TypedExpr>, loc: Location) -> Option<TypedExpr> {
        let (declaring, ret) = self.find_method(owner, name, true, loc)?;
        let call = Call { target: CallTarget::Static { owner: declaring }, method: name.to_string(), args };
        Some(self.call_result(call, ret, loc))
    }

    /// Call instance method `name`, looked up on `owner`, on `receiver`.
    pub(crate) fn instance_call(
        &mut self,
        receiver: TypedExpr,
        owner: TypeId,
        name: &str,
        args: Vec<TypedExpr>,
        loc: Location,
    ) -> Option<TypedExpr> {
        let (declaring, ret) = self.find_method(owner, name, false, loc)?;
        let call = Call {
            target: CallTarget::Instance { receiver: Box::new(receiver), owner: declaring },
            method: name.to_string(),
            args,
        };
        Some(self.call_result(call, ret, loc))
    }

    fn find_method(&mut self, owner: TypeId, name: &str, is_static: bool, loc: Location) -> Option<(TypeId, TypeId)> {
        match self.registry().find_member(owner, name) {
            Some((declaring, member)) if member.is_static == is_static => match member.kind {
                MemberKind::Method { ret, .. } => Some((declaring, ret)),
                _ => {
                    self.error(&messages::NON_INVOCABLE_MEMBER_0, loc, &[name]);
                    None
                }
            },
            _ => {
                let type_name = self.type_name(owner);
                self.error(&messages::TYPE_0_DOES_NOT_CONTAIN_A_DEFINITION_FOR_1, loc, &[type_name.as_str(), name]);
                None
            }
        }
    }

    fn call_result(&self, call: Call, ret: TypeId, loc: Location) -> TypedExpr {
        let class = if ret == self.builtins().void { ExprClass::Nothing } else { ExprClass::Value };
        TypedExpr::new(TypedExprKind::Call(call), ret, class, loc)
    }

    pub(crate) fn resolve_assign(&mut self, n: &Assign, loc: Location) -> Option<TypedExpr> {
        let target = self.resolve_expr(&n.target)?;
        if target.class != ExprClass::Variable {
            self.error(&messages::LEFT_HAND_SIDE_MUST_BE_ASSIGNABLE, n.target.loc, &[]);
            return None;
        }
        let value = self.resolve_expr_with(&n.value, &InferenceSite::assign_target(target.ty))?;
        let ty = target.ty;
        let kind = TypedExprKind::Assign { target: Box::new(target), value: Box::new(value) };
        Some(TypedExpr::value(kind, ty, loc))
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Resolve a written type, reporting unknown names.
    pub fn resolve_type_name(&mut self, name: &TypeName) -> Option<TypeId> {
        self.type_from_name(name, true)
    }

    /// Resolve a written type without reporting anything.
    pub(crate) fn lookup_type_name(&mut self, name: &TypeName) -> Option<TypeId> {
        self.type_from_name(name, false)
    }

    fn type_from_name(&mut self, name: &TypeName, report: bool) -> Option<TypeId> {
        let arity = name.type_args.len() as u32;
        let registry = self.registry();
        let Some(definition) = registry.lookup(&name.name, arity) else {
            if report {
                match (0..=MAX_CHECKED_ARITY).find(|&a| registry.lookup(&name.name, a).is_some()) {
                    Some(expected) => {
                        let expected = expected.to_string();
                        self.error(&messages::WRONG_NUMBER_OF_TYPE_ARGUMENTS, name.loc, &[&name.name, &expected]);
                    }
                    None => self.error(&messages::TYPE_0_COULD_NOT_BE_FOUND, name.loc, &[&name.name]),
                }
            }
            return None;
        };

        let base = if arity == 0 {
            definition
        } else {
            let args: Vec<Option<TypeId>> = name.type_args.iter().map(|a| self.type_from_name(a, report)).collect();
            let args: Vec<TypeId> = args.into_iter().collect::<Option<_>>()?;
            registry.make_generic(definition, &args)
        };
        Some(if name.rank > 0 { registry.make_array(base, name.rank) } else { base })
    }

    /// Read `expr` as a type, if it is written like one. Reports nothing.
    pub(crate) fn resolve_as_type(&mut self, expr: &Expr) -> Option<TypeId> {
        match &expr.kind {
            ExprKind::TypeRef(name) => self.lookup_type_name(name),
            ExprKind::Name(_) | ExprKind::MemberAccess(_) => {
                if root_name(expr).is_some_and(|root| self.lookup_local(root).is_some()) {
                    return None;
                }
                self.registry().lookup(&dotted_name(expr)?, 0)
            }
            _ => None,
        }
    }

    /// `new ty(args)`, rejecting types that cannot be instantiated.
    pub(crate) fn construct(&mut self, ty: TypeId, args: Vec<TypedExpr>, loc: Location) -> Option<TypedExpr> {
        if !self.check_constructible(ty, loc) {
            return None;
        }
        tracing::trace!(ty = %self.type_name(ty), args = args.len(), "construct");
        Some(TypedExpr::value(TypedExprKind::New { args }, ty, loc))
    }

    pub(crate) fn check_constructible(&mut self, ty: TypeId, loc: Location) -> bool {
        let flags = self.registry().flags(ty);
        if flags.intersects(TypeFlags::CONSTRUCTIBLE_MASK | TypeFlags::DYNAMIC) {
            let type_name = self.type_name(ty);
            self.error(&messages::CANNOT_CREATE_AN_INSTANCE_OF_0, loc, &[&type_name]);
            return false;
        }
        true
    }
}
