//! Target-type inference for object and array initializers.
//!
//! A literal initializer has no type of its own. Its type comes from the
//! first of these that applies:
//!
//! 1. a type supplied by the caller (`InferenceSite::inferred`)
//! 2. an element type written at the literal site (arrays only), if it names
//!    a known type
//! 3. the declared type of the variable it initializes
//! 4. the type of the assignment target it is stored into
//! 5. the default collection: `Expando` for objects, `Array` for arrays
//!
//! Outside the extended dialect only rules 2 and 5 take part.

use crate::context::ResolveContext;
use pscript_ast::node::TypeName;
use pscript_ast::types::TypeId;

/// Declared type of the variable an initializer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    /// `var x = ...` with no annotation.
    Infer,
    Typed(TypeId),
}

/// What the surrounding code knows about where an initializer's value goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceSite {
    pub inferred: Option<TypeId>,
    pub variable: Option<DeclaredType>,
    pub assign_target: Option<TypeId>,
}

impl InferenceSite {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn inferred(ty: TypeId) -> Self {
        Self { inferred: Some(ty), ..Self::default() }
    }

    pub fn variable(declared: DeclaredType) -> Self {
        Self { variable: Some(declared), ..Self::default() }
    }

    pub fn assign_target(ty: TypeId) -> Self {
        Self { assign_target: Some(ty), ..Self::default() }
    }
}

impl ResolveContext<'_> {
    pub(crate) fn infer_object_type(&mut self, site: &InferenceSite) -> TypeId {
        let expando = self.predefined().expando;
        if !self.is_extended() {
            return expando;
        }
        let ty = self.infer_from_context(site).unwrap_or(expando);
        // A dynamic target still needs a concrete class to construct.
        if self.registry().is_dynamic(ty) {
            expando
        } else {
            ty
        }
    }

    pub(crate) fn infer_array_type(&mut self, vector_type: Option<&TypeName>, site: &InferenceSite) -> TypeId {
        let default = self.predefined().array;
        if let Some(inferred) = site.inferred.filter(|_| self.is_extended()) {
            return if self.registry().is_dynamic(inferred) { default } else { inferred };
        }
        if let Some(element) = vector_type {
            if let Some(element) = self.lookup_type_name(element) {
                return self.registry().make_generic(self.predefined().vector, &[element]);
            }
        }
        if !self.is_extended() {
            return default;
        }
        let ty = self.infer_from_context(site).unwrap_or(default);
        if self.registry().is_dynamic(ty) {
            default
        } else {
            ty
        }
    }

    /// Rules 1, 3 and 4. A dynamic or inferring declaration gives no answer.
    fn infer_from_context(&self, site: &InferenceSite) -> Option<TypeId> {
        if let Some(ty) = site.inferred {
            return Some(ty);
        }
        let dynamic = self.builtins().dynamic;
        match site.variable {
            Some(DeclaredType::Typed(ty)) if ty != dynamic => return Some(ty),
            Some(_) => return None,
            None => {}
        }
        site.assign_target.filter(|&ty| ty != dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use pscript_core::text::Location;
    use pscript_diagnostics::DiagnosticCollection;
    use pscript_options::{CompileTarget, Dialect, ResolveOptions};

    fn with_ctx(dialect: Dialect, f: impl FnOnce(&mut ResolveContext<'_>, &TypeRegistry)) {
        let reg = TypeRegistry::new();
        let mut diags = DiagnosticCollection::new();
        let mut ctx = ResolveContext::new(ResolveOptions::new(CompileTarget::Native, dialect), &reg, &mut diags);
        f(&mut ctx, &reg);
    }

    #[test]
    fn test_object_defaults_to_expando() {
        with_ctx(Dialect::Extended, |ctx, reg| {
            assert_eq!(ctx.infer_object_type(&InferenceSite::none()), reg.predefined().expando);
            let dynamic = reg.builtins().dynamic;
            assert_eq!(ctx.infer_object_type(&InferenceSite::inferred(dynamic)), reg.predefined().expando);
        });
    }

    #[test]
    fn test_variable_type_wins_over_assign_target() {
        with_ctx(Dialect::Extended, |ctx, reg| {
            let regexp = reg.predefined().regexp;
            let site = InferenceSite {
                inferred: None,
                variable: Some(DeclaredType::Typed(regexp)),
                assign_target: Some(reg.predefined().xml),
            };
            assert_eq!(ctx.infer_object_type(&site), regexp);
        });
    }

    #[test]
    fn test_inferring_declaration_falls_to_default() {
        with_ctx(Dialect::Extended, |ctx, reg| {
            let site = InferenceSite::variable(DeclaredType::Infer);
            assert_eq!(ctx.infer_array_type(None, &site), reg.predefined().array);
        });
    }

    #[test]
    fn test_dynamic_assign_target_falls_to_default() {
        with_ctx(Dialect::Extended, |ctx, reg| {
            let site = InferenceSite::assign_target(reg.builtins().dynamic);
            assert_eq!(ctx.infer_array_type(None, &site), reg.predefined().array);
        });
    }

    #[test]
    fn test_strict_dialect_ignores_context() {
        with_ctx(Dialect::Strict, |ctx, reg| {
            let int_array = reg.make_array(reg.builtins().int, 1);
            let site = InferenceSite::variable(DeclaredType::Typed(int_array));
            assert_eq!(ctx.infer_array_type(None, &site), reg.predefined().array);
            assert_eq!(ctx.infer_object_type(&site), reg.predefined().expando);
        });
    }

    #[test]
    fn test_caller_type_wins_for_arrays() {
        with_ctx(Dialect::Extended, |ctx, reg| {
            let int_array = reg.make_array(reg.builtins().int, 1);
            let site = InferenceSite {
                inferred: Some(int_array),
                variable: Some(DeclaredType::Typed(reg.predefined().array)),
                assign_target: None,
            };
            let annotation = TypeName::simple("String", Location::default());
            assert_eq!(ctx.infer_array_type(Some(&annotation), &site), int_array);
        });
    }

    #[test]
    fn test_dynamic_caller_type_falls_to_array() {
        with_ctx(Dialect::Extended, |ctx, reg| {
            let site = InferenceSite::inferred(reg.builtins().dynamic);
            assert_eq!(ctx.infer_array_type(None, &site), reg.predefined().array);
        });
    }

    #[test]
    fn test_strict_dialect_ignores_caller_type() {
        with_ctx(Dialect::Strict, |ctx, reg| {
            let site = InferenceSite::inferred(reg.make_array(reg.builtins().int, 1));
            assert_eq!(ctx.infer_array_type(None, &site), reg.predefined().array);
        });
    }

    #[test]
    fn test_vector_annotation_builds_generic() {
        with_ctx(Dialect::Strict, |ctx, reg| {
            let annotation = TypeName::simple("int", Location::default());
            let ty = ctx.infer_array_type(Some(&annotation), &InferenceSite::none());
            assert_eq!(reg.type_name(ty), "Vector.<int>");
        });
    }
}
