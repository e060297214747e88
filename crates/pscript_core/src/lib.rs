//! pscript_core: Core utilities shared by every phase of the pscript front-end.
//!
//! Provides source locations, name interning, and the internal error type
//! that aborts a compilation unit.

pub mod error;
pub mod intern;
pub mod text;

pub use error::InternalError;
pub use intern::{InternedName, NameInterner};
pub use text::{FileId, Location, TextSpan};
