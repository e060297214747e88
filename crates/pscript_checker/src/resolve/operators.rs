//! `typeof` and `in`.

use super::dynamic::cast;
use crate::context::ResolveContext;
use crate::registry::{TYPEOF_HELPER_CLASS, TYPEOF_HELPER_METHOD};
use pscript_ast::node::{InExpr, TypeofExpr};
use pscript_ast::typed::*;
use pscript_core::text::Location;
use pscript_diagnostics::messages;

impl ResolveContext<'_> {
    pub(crate) fn resolve_typeof(&mut self, n: &TypeofExpr, loc: Location) -> Option<TypedExpr> {
        if self.is_extended() {
            self.error(&messages::TYPEOF_NOT_SUPPORTED_IN_EXTENDED_DIALECT, loc, &[]);
            return None;
        }
        let operand = self.resolve_expr(&n.operand)?;
        if self.is_script() {
            let kind = TypedExprKind::ScriptTypeof(Box::new(operand));
            return Some(TypedExpr::value(kind, self.builtins().dynamic, loc));
        }

        let helper_name = format!("{}.{}", self.options().root_namespace, TYPEOF_HELPER_CLASS);
        let Some(helper) = self.registry().lookup(&helper_name, 0) else {
            self.error(&messages::TYPE_0_COULD_NOT_BE_FOUND, loc, &[&helper_name]);
            return None;
        };
        self.static_call(helper, TYPEOF_HELPER_METHOD, vec![operand], loc)
    }

    pub(crate) fn resolve_in(&mut self, n: &InExpr, loc: Location) -> Option<TypedExpr> {
        let key = self.resolve_expr(&n.key);
        let container = self.resolve_expr(&n.container);
        let (key, container) = (key?, container?);

        if self.is_script() {
            let kind = TypedExprKind::ScriptIn { key: Box::new(key), container: Box::new(container) };
            return Some(TypedExpr::value(kind, self.builtins().boolean, loc));
        }

        let registry = self.registry();
        let b = self.builtins();
        let p = self.predefined();
        if registry.is_dynamic(container.ty) {
            let dictionary = registry.make_generic(p.dictionary_generic, &[b.string, b.object]);
            tracing::debug!("in on dynamic container rewritten to dictionary ContainsKey");
            return self.instance_call(cast(container, dictionary), dictionary, "ContainsKey", vec![key], loc);
        }

        let owner = container.ty;
        let method = if registry.implements(owner, p.dictionary) { "ContainsKey" } else { "Contains" };
        tracing::debug!(container = %self.type_name(owner), method, "in rewritten");
        self.instance_call(container, owner, method, vec![key], loc)
    }
}
