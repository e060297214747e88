//! pscript_ast: node definitions for the dynamic-dialect front-end.
//!
//! Two node families live here. `node` is what the parser produces: host
//! forms plus the dynamic extension forms, untyped and possibly ambiguous.
//! `typed` is what resolution produces: every node carries its static type
//! and classification, and only typed nodes can be emitted.

pub mod node;
pub mod typed;
pub mod types;
pub mod visitor;

pub use node::*;
pub use typed::*;
pub use types::{ExprClass, TypeFlags, TypeId};
pub use visitor::{NodeRef, StructuralVisitor, VisitFlow};
