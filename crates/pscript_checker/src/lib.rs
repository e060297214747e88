//! pscript_checker: type registry and resolution of dynamic-dialect nodes.
//!
//! Resolution turns the parser's `Expr`/`Stmt` trees into `TypedExpr`/
//! `TypedStmt` trees, rewriting dynamic constructs into calls against the
//! runtime's capability types, or files diagnostics.

pub mod context;
pub mod infer;
pub mod registry;
mod resolve;
pub mod types;

pub use context::ResolveContext;
pub use infer::{DeclaredType, InferenceSite};
pub use registry::{BuiltinTypes, ClassDecl, PredefinedTypes, TypeRegistry};
pub use types::{Member, MemberKind, INDEXER_NAME};
