//! pscript_compiler: Compiler orchestration.
//!
//! A `Program` owns the compilation units and the type registry they share.
//! `check` resolves every unit; `emit` lowers the units that resolved into
//! the one backend the options select.

use pscript_ast::node::Stmt;
use pscript_ast::typed::TypedStmt;
use pscript_checker::{ResolveContext, TypeRegistry};
use pscript_core::error::InternalError;
use pscript_core::text::{FileId, Location};
use pscript_diagnostics::DiagnosticCollection;
use pscript_emitter::{emit_native_unit, emit_script_unit, Instruction};
use pscript_options::{parse_config, CompileTarget, CompilerOptions, ConfigError, ResolveOptions};
use rayon::prelude::*;
use std::sync::Arc;

/// One independently resolvable tree, typically one source file.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub name: String,
    pub file: FileId,
    pub statements: Vec<Stmt>,
}

/// A unit after resolution. `statements` is `None` if anything failed.
#[derive(Debug, Clone)]
pub struct CheckedUnit {
    pub name: String,
    pub file: FileId,
    pub statements: Option<Vec<TypedStmt>>,
}

#[derive(Debug, Default)]
pub struct CheckResult {
    pub units: Vec<CheckedUnit>,
    /// Every unit's diagnostics, sorted by file and position.
    pub diagnostics: DiagnosticCollection,
}

/// Output of one unit for the selected backend.
#[derive(Debug, Clone, PartialEq)]
pub enum EmitResult {
    Native(Vec<Instruction>),
    Script(String),
}

#[derive(Debug)]
pub struct UnitOutput {
    pub name: String,
    pub result: Result<EmitResult, InternalError>,
}

pub struct Program {
    options: CompilerOptions,
    resolve_options: ResolveOptions,
    registry: Arc<TypeRegistry>,
    units: Vec<CompilationUnit>,
}

impl Program {
    pub fn new(options: CompilerOptions) -> Self {
        let resolve_options = options.resolve_options();
        let registry = Arc::new(TypeRegistry::with_root_namespace(&resolve_options.root_namespace));
        Self { options, resolve_options, registry, units: Vec::new() }
    }

    /// Create a program from JSON config text.
    pub fn from_config(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_config(content)?))
    }

    /// Share an existing registry, e.g. one with user types already declared.
    pub fn with_registry(options: CompilerOptions, registry: Arc<TypeRegistry>) -> Self {
        let resolve_options = options.resolve_options();
        Self { options, resolve_options, registry, units: Vec::new() }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn target(&self) -> CompileTarget {
        self.resolve_options.target
    }

    /// Add a unit and return the file id its diagnostics will carry.
    pub fn add_unit(&mut self, name: impl Into<String>, statements: Vec<Stmt>) -> FileId {
        let file = FileId(self.units.len() as u32);
        self.units.push(CompilationUnit { name: name.into(), file, statements });
        file
    }

    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    /// Resolve every unit. Units share only the registry, so they run in
    /// parallel when there is more than one.
    pub fn check(&self) -> CheckResult {
        let checked: Vec<(CheckedUnit, DiagnosticCollection)> = if self.units.len() > 1 {
            self.units.par_iter().map(|u| self.check_unit(u)).collect()
        } else {
            self.units.iter().map(|u| self.check_unit(u)).collect()
        };

        let mut diagnostics = DiagnosticCollection::new();
        let mut units = Vec::with_capacity(checked.len());
        for (unit, diags) in checked {
            diagnostics.extend(diags);
            units.push(unit);
        }
        diagnostics.sort();
        tracing::info!(
            units = units.len(),
            errors = diagnostics.error_count(),
            backend = self.resolve_options.target.name(),
            "check finished"
        );
        CheckResult { units, diagnostics }
    }

    fn check_unit(&self, unit: &CompilationUnit) -> (CheckedUnit, DiagnosticCollection) {
        let mut diags = DiagnosticCollection::new();
        let statements = {
            let mut ctx = ResolveContext::new(self.resolve_options.clone(), &self.registry, &mut diags);
            ctx.resolve_unit(&unit.statements)
        };
        // Nodes carry positions only; stamp them with this unit's file.
        let diags = restamp(diags, unit.file);
        tracing::debug!(unit = %unit.name, errors = diags.error_count(), "unit resolved");
        let checked = CheckedUnit { name: unit.name.clone(), file: unit.file, statements };
        (checked, diags)
    }

    /// Emit every unit that resolved. Units that failed are skipped; their
    /// diagnostics are already in the check result.
    pub fn emit(&self, checked: &CheckResult) -> Vec<UnitOutput> {
        let emit = |unit: &CheckedUnit| UnitOutput { name: unit.name.clone(), result: self.emit_unit(unit) };
        let resolved: Vec<&CheckedUnit> = checked.units.iter().filter(|u| u.statements.is_some()).collect();
        if resolved.len() > 1 {
            resolved.into_par_iter().map(emit).collect()
        } else {
            resolved.into_iter().map(emit).collect()
        }
    }

    /// Emit one unit. Emitting a unit that did not resolve is a caller bug.
    pub fn emit_unit(&self, unit: &CheckedUnit) -> Result<EmitResult, InternalError> {
        let Some(statements) = &unit.statements else {
            return Err(InternalError::MissingResolve {
                kind: "compilation unit",
                location: Location { file: unit.file, ..Location::default() },
            });
        };
        let result = match self.resolve_options.target {
            CompileTarget::Native => emit_native_unit(statements, &self.registry).map(EmitResult::Native),
            CompileTarget::Script => emit_script_unit(statements, &self.registry).map(EmitResult::Script),
        };
        if let Err(err) = &result {
            tracing::error!(unit = %unit.name, %err, "emit aborted");
        }
        result
    }

    /// Check, then emit if checking found no errors.
    pub fn compile(&self) -> (DiagnosticCollection, Vec<UnitOutput>) {
        let checked = self.check();
        if checked.diagnostics.has_errors() {
            return (checked.diagnostics, Vec::new());
        }
        let outputs = self.emit(&checked);
        (checked.diagnostics, outputs)
    }
}

fn restamp(diags: DiagnosticCollection, file: FileId) -> DiagnosticCollection {
    let mut out = DiagnosticCollection::new();
    for mut d in diags.into_diagnostics() {
        if let Some(loc) = d.location.as_mut() {
            loc.file = file;
        }
        out.add(d);
    }
    out
}
