//! Object and array initializers.
//!
//! Both pick a target type through `infer`, then become either a scripting
//! literal, a native array creation, or a construction of the target type
//! followed by an initializer list built from the original elements.

use crate::context::ResolveContext;
use crate::infer::InferenceSite;
use crate::types::MemberKind;
use pscript_ast::node::{ArrayInitializer, ObjectInitializer};
use pscript_ast::typed::*;
use pscript_ast::types::TypeId;
use pscript_core::text::Location;
use pscript_diagnostics::messages;

impl ResolveContext<'_> {
    pub(crate) fn resolve_object_initializer(
        &mut self,
        init: &ObjectInitializer,
        loc: Location,
        site: &InferenceSite,
    ) -> Option<TypedExpr> {
        let ty = self.infer_object_type(site);
        self.resolve_object_initializer_with_type(init, loc, ty)
    }

    /// Resolve an object initializer against a type the caller already knows.
    pub fn resolve_object_initializer_with_type(
        &mut self,
        init: &ObjectInitializer,
        loc: Location,
        ty: TypeId,
    ) -> Option<TypedExpr> {
        let values: Vec<Option<TypedExpr>> = init.elements.iter().map(|e| self.resolve_expr(&e.value)).collect();
        let values: Vec<TypedExpr> = values.into_iter().collect::<Option<_>>()?;
        let pairs: Vec<(String, TypedExpr)> =
            init.elements.iter().map(|e| e.name.clone()).zip(values).collect();

        tracing::debug!(ty = %self.type_name(ty), elements = pairs.len(), "object initializer");
        if self.is_script() {
            return Some(TypedExpr::value(TypedExprKind::ObjectLiteral(pairs), ty, loc));
        }

        if !self.check_constructible(ty, loc) {
            return None;
        }
        // A fixed class only takes the fields it declares.
        if !self.registry().is_dynamic_capable(ty) {
            let mut ok = true;
            for element in &init.elements {
                let is_field = matches!(
                    self.registry().find_member(ty, &element.name),
                    Some((_, m)) if !m.is_static && matches!(m.kind, MemberKind::Field { .. })
                );
                if !is_field {
                    let type_name = self.type_name(ty);
                    self.error(
                        &messages::TYPE_0_DOES_NOT_CONTAIN_A_DEFINITION_FOR_1,
                        element.loc,
                        &[type_name.as_str(), element.name.as_str()],
                    );
                    ok = false;
                }
            }
            if !ok {
                return None;
            }
        }

        let initializers = pairs
            .into_iter()
            .map(|(name, value)| Initializer::Named { name, value })
            .collect();
        let kind = TypedExprKind::NewInitialize { args: Vec::new(), initializers };
        Some(TypedExpr::value(kind, ty, loc))
    }

    pub(crate) fn resolve_array_initializer(
        &mut self,
        init: &ArrayInitializer,
        loc: Location,
        site: &InferenceSite,
    ) -> Option<TypedExpr> {
        let ty = self.infer_array_type(init.vector_type.as_ref(), site);
        self.resolve_array_initializer_with_type(init, loc, ty)
    }

    /// Resolve an array initializer against a type the caller already knows.
    pub fn resolve_array_initializer_with_type(
        &mut self,
        init: &ArrayInitializer,
        loc: Location,
        ty: TypeId,
    ) -> Option<TypedExpr> {
        let elements = self.resolve_all(&init.elements)?;

        tracing::debug!(ty = %self.type_name(ty), elements = elements.len(), "array initializer");
        if self.is_script() {
            return Some(TypedExpr::value(TypedExprKind::ArrayLiteral(elements), ty, loc));
        }

        if let Some((element, rank)) = self.registry().array_element(ty) {
            // An initializer list only fills one dimension.
            if rank != 1 {
                let type_name = self.type_name(ty);
                self.error(&messages::ARRAY_INITIALIZER_REQUIRES_SINGLE_DIMENSION, loc, &[type_name.as_str()]);
                return None;
            }
            let length = i64::try_from(elements.len()).unwrap_or(i64::MAX);
            let length = TypedExpr::value(TypedExprKind::Constant(Constant::Int(length)), self.builtins().int, loc);
            let kind = TypedExprKind::ArrayCreation {
                element,
                dimensions: vec![length],
                initializer: Some(elements),
            };
            return Some(TypedExpr::value(kind, ty, loc));
        }

        if !self.check_constructible(ty, loc) {
            return None;
        }
        let initializers = elements.into_iter().map(Initializer::Element).collect();
        let kind = TypedExprKind::NewInitialize { args: Vec::new(), initializers };
        Some(TypedExpr::value(kind, ty, loc))
    }
}
