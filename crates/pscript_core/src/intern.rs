//! Name interning.
//!
//! Type names, member names and namespace paths are interned so the type
//! registry can key its caches on a `u32` handle. The interner is shared by
//! every compilation unit and is safe for concurrent use.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// A handle to an interned name. Comparing two handles is an integer comparison.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct InternedName(Spur);

impl fmt::Debug for InternedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternedName({:?})", self.0)
    }
}

/// Thread-safe name interner. Cloning shares the underlying storage.
#[derive(Clone)]
pub struct NameInterner {
    rodeo: Arc<ThreadedRodeo>,
}

impl NameInterner {
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern a name, returning the existing handle if it was seen before.
    #[inline]
    pub fn intern(&self, s: &str) -> InternedName {
        InternedName(self.rodeo.get_or_intern(s))
    }

    /// Look up a name without interning it.
    #[inline]
    pub fn get(&self, s: &str) -> Option<InternedName> {
        self.rodeo.get(s).map(InternedName)
    }

    #[inline]
    pub fn resolve(&self, key: InternedName) -> &str {
        self.rodeo.resolve(&key.0)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameInterner")
            .field("len", &self.len())
            .finish()
    }
}
