//! Type handles and flags shared by the AST and the checker.

use std::fmt;

bitflags::bitflags! {
    /// Capability flags on a type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        const NONE                = 0;
        /// The universal dynamic type `*`.
        const DYNAMIC             = 1 << 0;
        const PRIMITIVE           = 1 << 1;
        const VOID                = 1 << 2;
        const NULL                = 1 << 3;
        const CLASS               = 1 << 4;
        const INTERFACE           = 1 << 5;
        /// A class whose instances accept runtime key-based get/set/delete.
        const DYNAMIC_CLASS       = 1 << 6;
        const STATIC_CLASS        = 1 << 7;
        const ARRAY               = 1 << 8;
        const GENERIC_DEFINITION  = 1 << 9;
        const GENERIC_INSTANCE    = 1 << 10;
        const TYPE_PARAMETER      = 1 << 11;
        const NAMESPACE           = 1 << 12;

        const CONSTRUCTIBLE_MASK = Self::INTERFACE.bits()
            | Self::STATIC_CLASS.bits()
            | Self::TYPE_PARAMETER.bits()
            | Self::NAMESPACE.bits()
            | Self::VOID.bits();
    }
}

/// Handle to a type in the checker's type table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const INVALID: TypeId = TypeId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// How a resolved expression may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprClass {
    /// Produces a value.
    Value,
    /// Produces a value and can be assigned to.
    Variable,
    /// Denotes a type, not a value.
    Type,
    /// Produces nothing (void calls, no-op statements).
    Nothing,
}

impl ExprClass {
    #[inline]
    pub fn has_value(self) -> bool {
        matches!(self, ExprClass::Value | ExprClass::Variable)
    }
}
