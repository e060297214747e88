//! Resolved nodes.
//!
//! A `TypedExpr` is the only thing a backend accepts. It always carries its
//! static type and classification, so nothing can read type information off
//! a node that was never resolved.

use crate::node::{RegexLiteral, XmlLiteral};
use crate::types::{ExprClass, TypeId};
use pscript_core::text::Location;

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: TypeId,
    pub class: ExprClass,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Constant(Constant),
    Local(String),
    /// Denotes the type in `ty`.
    TypeRef,
    StaticField {
        owner: TypeId,
        name: String,
    },
    InstanceField {
        target: Box<TypedExpr>,
        owner: TypeId,
        name: String,
    },
    /// Member lookup deferred to runtime on a dynamic receiver.
    DynamicMember {
        target: Box<TypedExpr>,
        name: String,
    },
    ElementAccess {
        target: Box<TypedExpr>,
        args: Vec<TypedExpr>,
    },
    Call(Call),
    /// Invocation of a dynamic value.
    DynamicInvoke {
        callee: Box<TypedExpr>,
        args: Vec<TypedExpr>,
    },
    /// Conversion of `operand` to `ty`.
    Cast {
        operand: Box<TypedExpr>,
    },
    /// Construction of `ty`.
    New {
        args: Vec<TypedExpr>,
    },
    /// Construction through a dynamic value standing in for a type.
    DynamicNew {
        callee: Box<TypedExpr>,
        args: Vec<TypedExpr>,
    },
    /// Construction of `ty` followed by a collection or object initializer.
    NewInitialize {
        args: Vec<TypedExpr>,
        initializers: Vec<Initializer>,
    },
    /// Native array creation; `ty` is the array type.
    ArrayCreation {
        element: TypeId,
        dimensions: Vec<TypedExpr>,
        initializer: Option<Vec<TypedExpr>>,
    },
    Assign {
        target: Box<TypedExpr>,
        value: Box<TypedExpr>,
    },

    // -- Scripting backend passthroughs --
    ScriptDelete(Box<TypedExpr>),
    ScriptNew(Box<TypedExpr>),
    ScriptTypeof(Box<TypedExpr>),
    ScriptIn {
        key: Box<TypedExpr>,
        container: Box<TypedExpr>,
    },
    ScriptUndefined,
    ObjectLiteral(Vec<(String, TypedExpr)>),
    ArrayLiteral(Vec<TypedExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    String(String),
    Int(i64),
    Number(f64),
    Bool(bool),
    Null,
    Regex(RegexLiteral),
    Xml(XmlLiteral),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub target: CallTarget,
    pub method: String,
    pub args: Vec<TypedExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    Static { owner: TypeId },
    Instance { receiver: Box<TypedExpr>, owner: TypeId },
    /// Method lookup deferred to runtime.
    Dynamic { receiver: Box<TypedExpr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    /// A single-value collection entry (`Add(value)`).
    Element(TypedExpr),
    /// A named entry (`obj[name] = value` or a member store).
    Named { name: String, value: TypedExpr },
}

impl Initializer {
    pub fn value(&self) -> &TypedExpr {
        match self {
            Initializer::Element(value) | Initializer::Named { value, .. } => value,
        }
    }
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, ty: TypeId, class: ExprClass, loc: Location) -> Self {
        Self { kind, ty, class, loc }
    }

    pub fn value(kind: TypedExprKind, ty: TypeId, loc: Location) -> Self {
        Self::new(kind, ty, ExprClass::Value, loc)
    }

    pub fn string(value: impl Into<String>, ty: TypeId, loc: Location) -> Self {
        Self::value(TypedExprKind::Constant(Constant::String(value.into())), ty, loc)
    }

    pub fn as_string_constant(&self) -> Option<&str> {
        match &self.kind {
            TypedExprKind::Constant(Constant::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether evaluating this expression can be skipped without changing behavior.
    pub fn is_side_effect_free(&self) -> bool {
        match &self.kind {
            TypedExprKind::Constant(_)
            | TypedExprKind::Local(_)
            | TypedExprKind::TypeRef
            | TypedExprKind::StaticField { .. }
            | TypedExprKind::ScriptUndefined => true,
            TypedExprKind::InstanceField { target, .. } => target.is_side_effect_free(),
            TypedExprKind::Cast { operand } => operand.is_side_effect_free(),
            TypedExprKind::ScriptTypeof(operand) => operand.is_side_effect_free(),
            TypedExprKind::ObjectLiteral(pairs) => pairs.iter().all(|(_, v)| v.is_side_effect_free()),
            TypedExprKind::ArrayLiteral(elems) => elems.iter().all(TypedExpr::is_side_effect_free),
            TypedExprKind::DynamicMember { .. }
            | TypedExprKind::ElementAccess { .. }
            | TypedExprKind::Call(_)
            | TypedExprKind::DynamicInvoke { .. }
            | TypedExprKind::New { .. }
            | TypedExprKind::DynamicNew { .. }
            | TypedExprKind::NewInitialize { .. }
            | TypedExprKind::ArrayCreation { .. }
            | TypedExprKind::Assign { .. }
            | TypedExprKind::ScriptDelete(_)
            | TypedExprKind::ScriptNew(_)
            | TypedExprKind::ScriptIn { .. } => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            TypedExprKind::Constant(_) => "constant",
            TypedExprKind::Local(_) => "local",
            TypedExprKind::TypeRef => "type reference",
            TypedExprKind::StaticField { .. } => "static field",
            TypedExprKind::InstanceField { .. } => "instance field",
            TypedExprKind::DynamicMember { .. } => "dynamic member",
            TypedExprKind::ElementAccess { .. } => "element access",
            TypedExprKind::Call(_) => "call",
            TypedExprKind::DynamicInvoke { .. } => "dynamic invocation",
            TypedExprKind::Cast { .. } => "cast",
            TypedExprKind::New { .. } => "new",
            TypedExprKind::DynamicNew { .. } => "dynamic new",
            TypedExprKind::NewInitialize { .. } => "new with initializer",
            TypedExprKind::ArrayCreation { .. } => "array creation",
            TypedExprKind::Assign { .. } => "assignment",
            TypedExprKind::ScriptDelete(_) => "delete",
            TypedExprKind::ScriptNew(_) => "new",
            TypedExprKind::ScriptTypeof(_) => "typeof",
            TypedExprKind::ScriptIn { .. } => "in",
            TypedExprKind::ScriptUndefined => "undefined",
            TypedExprKind::ObjectLiteral(_) => "object literal",
            TypedExprKind::ArrayLiteral(_) => "array literal",
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TypedStmt {
    pub kind: TypedStmtKind,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmtKind {
    VarDecl {
        name: String,
        ty: TypeId,
        initializer: Option<TypedExpr>,
    },
    Expression(TypedExpr),
    /// Emitted only when the expression may have side effects.
    NonAssign(TypedExpr),
    Block(Vec<TypedStmt>),
    /// Already lowered earlier in the pipeline; emits nothing.
    LocalFunction { name: String },
    /// Kept for tooling; emits nothing.
    UseNamespace { namespace: String },
}

impl TypedStmt {
    pub fn new(kind: TypedStmtKind, loc: Location) -> Self {
        Self { kind, loc }
    }
}
