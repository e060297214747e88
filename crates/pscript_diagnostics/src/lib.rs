//! pscript_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Diagnostics are the recoverable, user-facing error class. A resolver files
//! them through a `DiagnosticSink` and keeps going, so one compile reports
//! every problem it can find rather than stopping at the first.

use pscript_core::text::Location;
use std::fmt;

/// Diagnostic category. Resolution only files errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The stable diagnostic code tooling filters on.
    pub code: u32,
    pub category: DiagnosticCategory,
    /// The message template. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the diagnostic points, if anywhere.
    pub location: Option<Location>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = self.location {
            write!(f, "file{}({}): ", loc.file.0, loc.span.start)?;
        }
        write!(f, "{} PS{}: {}", self.category, self.code, self.message_text)
    }
}

/// Format a message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Where resolution files its diagnostics.
///
/// Reporting is fire-and-forget: it never aborts the caller, and the caller
/// continues with sibling nodes after a failure.
pub trait DiagnosticSink {
    fn report(&mut self, code: u32, location: Location, message: String);

    /// Report an error from the static message table.
    fn error(&mut self, message: &DiagnosticMessage, location: Location, args: &[&str]) {
        self.report(message.code, location, format_message(message.message, args));
    }
}

/// A collection of diagnostics accumulated during compilation.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Whether any diagnostic carries this code.
    pub fn has_code(&self, code: u32) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Sort diagnostics by file and position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by_key(|d| {
            d.location
                .map(|l| (l.file, l.span.start))
                .unwrap_or_default()
        });
    }
}

impl DiagnosticSink for DiagnosticCollection {
    fn report(&mut self, code: u32, location: Location, message: String) {
        self.diagnostics.push(Diagnostic {
            location: Some(location),
            message_text: message,
            code,
            category: DiagnosticCategory::Error,
        });
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
    }

    // ========================================================================
    // Host resolution (1-1999)
    // ========================================================================
    pub const CANNOT_APPLY_INDEXING_TO_0: DiagnosticMessage = diag!(21, Error, "Cannot apply indexing with [] to an expression of type '{0}'.");
    pub const NAME_0_DOES_NOT_EXIST: DiagnosticMessage = diag!(103, Error, "The name '{0}' does not exist in the current context.");
    pub const TYPE_0_DOES_NOT_CONTAIN_A_DEFINITION_FOR_1: DiagnosticMessage = diag!(117, Error, "'{0}' does not contain a definition for '{1}'.");
    pub const EXPRESSION_DENOTES_A_VALUE_WHERE_A_TYPE_WAS_EXPECTED: DiagnosticMessage = diag!(118, Error, "'{0}' is a value but a type was expected.");
    pub const LEFT_HAND_SIDE_MUST_BE_ASSIGNABLE: DiagnosticMessage = diag!(131, Error, "The left-hand side of an assignment must be a variable, a property or an indexer.");
    pub const CANNOT_CREATE_AN_INSTANCE_OF_0: DiagnosticMessage = diag!(144, Error, "Cannot create an instance of the abstract class or interface '{0}'.");
    pub const TYPE_0_COULD_NOT_BE_FOUND: DiagnosticMessage = diag!(246, Error, "The type or namespace name '{0}' could not be found.");
    pub const NON_INVOCABLE_MEMBER_0: DiagnosticMessage = diag!(1955, Error, "Non-invocable member '{0}' cannot be used like a method.");
    pub const METHOD_GROUP_USED_AS_VALUE: DiagnosticMessage = diag!(428, Error, "Cannot convert method group '{0}' to a value.");
    pub const ARRAY_CREATION_MUST_HAVE_SIZE: DiagnosticMessage = diag!(1586, Error, "Array creation must have array size or array initializer.");
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: DiagnosticMessage = diag!(305, Error, "Using the generic type '{0}' requires '{1}' type arguments.");

    // ========================================================================
    // Dynamic extensions (7000-7199)
    // ========================================================================
    pub const DELETE_MUST_HAVE_ONLY_ONE_INDEX_ARGUMENT: DiagnosticMessage = diag!(7021, Error, "delete statement must have only one index argument.");
    pub const DELETE_NOT_ALLOWED_ON_ARRAYS: DiagnosticMessage = diag!(7022, Error, "delete statement not allowed on arrays.");
    pub const DELETE_ONLY_ALLOWED_ON_DYNAMIC_TYPES: DiagnosticMessage = diag!(7023, Error, "delete statement only allowed on dynamic types or dynamic classes.");
    pub const DELETE_OPERAND_MUST_BE_PROPERTY_REFERENCE: DiagnosticMessage = diag!(7024, Error, "The operand of a delete statement must be a property or element reference.");
    pub const TYPEOF_NOT_SUPPORTED_IN_EXTENDED_DIALECT: DiagnosticMessage = diag!(7101, Error, "'typeof' operator not supported in the extended dialect.");
    pub const NATIVE_ARRAYS_ONLY_IN_EXTENDED_DIALECT: DiagnosticMessage = diag!(7103, Error, "Native arrays are only supported in the extended dialect.");
    pub const JAGGED_ARRAY_CREATION_NOT_SUPPORTED: DiagnosticMessage = diag!(7104, Error, "Creating jagged native arrays is not supported; use a single multi-dimensional array.");
    pub const ARRAY_INITIALIZER_REQUIRES_SINGLE_DIMENSION: DiagnosticMessage = diag!(7105, Error, "An array initializer cannot create the multi-dimensional array type '{0}'.");
}
