//! Resolution of unresolved nodes into typed nodes.
//!
//! Every `resolve_*` method returns `None` once it has filed a diagnostic
//! (XML queries excepted, see `literals`). Callers keep resolving siblings
//! after a failure so one pass reports as many problems as it can.

mod dynamic;
mod expr;
mod initializers;
mod literals;
mod operators;
mod statements;

use crate::context::ResolveContext;
use crate::infer::InferenceSite;
use pscript_ast::node::{Expr, ExprKind};
use pscript_ast::typed::TypedExpr;

impl ResolveContext<'_> {
    pub fn resolve_expr(&mut self, expr: &Expr) -> Option<TypedExpr> {
        self.resolve_expr_with(expr, &InferenceSite::none())
    }

    /// Resolve `expr`, letting literal initializers use `site` to pick their type.
    pub fn resolve_expr_with(&mut self, expr: &Expr, site: &InferenceSite) -> Option<TypedExpr> {
        let loc = expr.loc;
        tracing::trace!(kind = expr.kind_name(), ?loc, "resolve");
        match &expr.kind {
            ExprKind::Literal(lit) => Some(self.resolve_literal(lit, loc)),
            ExprKind::Name(name) => self.resolve_name(name, loc),
            ExprKind::MemberAccess(_) => self.resolve_member_access(expr),
            ExprKind::ElementAccess(n) => self.resolve_element_access(n, loc),
            ExprKind::Invocation(n) => self.resolve_invocation(n, loc),
            ExprKind::Assign(n) => self.resolve_assign(n, loc),
            ExprKind::TypeRef(name) => self.resolve_type_ref(name),
            ExprKind::ObjectInitializer(n) => self.resolve_object_initializer(n, loc, site),
            ExprKind::ArrayInitializer(n) => self.resolve_array_initializer(n, loc, site),
            ExprKind::Delete(n) => self.resolve_delete(n, loc),
            ExprKind::New(n) => self.resolve_new(n, loc, site),
            ExprKind::Typeof(n) => self.resolve_typeof(n, loc),
            ExprKind::In(n) => self.resolve_in(n, loc),
            ExprKind::Undefined => Some(self.resolve_undefined(loc)),
            ExprKind::Regex(lit) => self.resolve_regex(lit, loc),
            ExprKind::Xml(lit) => self.resolve_xml(lit, loc),
            ExprKind::XmlQuery(_) => self.resolve_xml_query(loc),
        }
    }

    /// Resolve every expression, reporting all failures before giving up.
    pub(crate) fn resolve_all(&mut self, exprs: &[Expr]) -> Option<Vec<TypedExpr>> {
        let resolved: Vec<Option<TypedExpr>> = exprs.iter().map(|e| self.resolve_expr(e)).collect();
        resolved.into_iter().collect()
    }
}
