//! Internal (programmer-facing) errors.
//!
//! These are never shown as ordinary diagnostics. Hitting one aborts the
//! current compilation unit.

use crate::text::Location;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// A node reached emission without a successful resolve.
    #[error("internal error: missing resolve call for {kind} at {location:?}")]
    MissingResolve {
        kind: &'static str,
        location: Location,
    },

    /// The active backend has no lowering for this resolved construct.
    #[error("internal error: {construct} cannot be emitted by the {backend} backend (at {location:?})")]
    UnsupportedOnBackend {
        construct: &'static str,
        backend: &'static str,
        location: Location,
    },

    /// A resolved construct reached emission in a shape the backend rejects.
    #[error("internal error: unsupported shape for {construct}: {detail}")]
    UnsupportedShape {
        construct: &'static str,
        detail: String,
    },
}
