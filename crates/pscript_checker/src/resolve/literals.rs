//! `undefined`, regex and XML literals, and XML queries.

use crate::context::ResolveContext;
use crate::registry::UNDEFINED_FIELD;
use pscript_ast::node::{RegexLiteral, XmlLiteral};
use pscript_ast::typed::*;
use pscript_core::text::Location;

impl ResolveContext<'_> {
    /// Never fails, in either dialect.
    pub(crate) fn resolve_undefined(&mut self, loc: Location) -> TypedExpr {
        if self.is_script() {
            return TypedExpr::value(TypedExprKind::ScriptUndefined, self.builtins().dynamic, loc);
        }
        let owner = self.predefined().undefined;
        let kind = TypedExprKind::StaticField { owner, name: UNDEFINED_FIELD.to_string() };
        TypedExpr::value(kind, owner, loc)
    }

    pub(crate) fn resolve_regex(&mut self, lit: &RegexLiteral, loc: Location) -> Option<TypedExpr> {
        let regexp = self.predefined().regexp;
        if self.is_script() {
            return Some(TypedExpr::value(TypedExprKind::Constant(Constant::Regex(lit.clone())), regexp, loc));
        }
        let string = self.builtins().string;
        let args = vec![
            TypedExpr::string(lit.pattern(), string, loc),
            TypedExpr::string(lit.options(), string, loc),
        ];
        self.construct(regexp, args, loc)
    }

    pub(crate) fn resolve_xml(&mut self, lit: &XmlLiteral, loc: Location) -> Option<TypedExpr> {
        let xml = self.predefined().xml;
        if self.is_script() {
            return Some(TypedExpr::value(TypedExprKind::Constant(Constant::Xml(lit.clone())), xml, loc));
        }
        let args = vec![TypedExpr::string(lit.text(), self.builtins().string, loc)];
        self.construct(xml, args, loc)
    }

    /// XML queries have no lowering. Fails without a diagnostic: whoever
    /// produced the node has already reported why.
    pub(crate) fn resolve_xml_query(&mut self, loc: Location) -> Option<TypedExpr> {
        tracing::trace!(?loc, "xml query is not supported");
        None
    }
}
