//! Per-unit resolution state.

use crate::registry::{BuiltinTypes, PredefinedTypes, TypeRegistry};
use pscript_ast::types::TypeId;
use pscript_core::text::Location;
use pscript_diagnostics::{DiagnosticMessage, DiagnosticSink};
use pscript_options::{CompileTarget, ResolveOptions};
use rustc_hash::FxHashMap;

/// Everything a node needs while it resolves.
///
/// The registry is shared with every other unit of the compilation and only
/// read through `&`. Scopes and the diagnostic sink belong to this unit.
pub struct ResolveContext<'a> {
    options: ResolveOptions,
    registry: &'a TypeRegistry,
    diagnostics: &'a mut dyn DiagnosticSink,
    scopes: Vec<FxHashMap<String, TypeId>>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        options: ResolveOptions,
        registry: &'a TypeRegistry,
        diagnostics: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            options,
            registry,
            diagnostics,
            scopes: vec![FxHashMap::default()],
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    pub fn builtins(&self) -> BuiltinTypes {
        *self.registry.builtins()
    }

    pub fn predefined(&self) -> PredefinedTypes {
        *self.registry.predefined()
    }

    #[inline]
    pub fn is_script(&self) -> bool {
        self.options.target == CompileTarget::Script
    }

    #[inline]
    pub fn is_extended(&self) -> bool {
        self.options.dialect.is_extended()
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a local in the innermost scope, shadowing outer ones.
    pub fn declare_local(&mut self, name: &str, ty: TypeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    pub fn lookup_local(&self, name: &str) -> Option<TypeId> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    pub(crate) fn error(&mut self, message: &DiagnosticMessage, location: Location, args: &[&str]) {
        tracing::debug!(code = message.code, ?location, "resolve error");
        self.diagnostics.error(message, location, args);
    }

    pub(crate) fn type_name(&self, id: TypeId) -> String {
        self.registry.type_name(id)
    }
}
