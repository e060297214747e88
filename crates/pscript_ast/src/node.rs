//! Unresolved AST nodes.
//!
//! The parser builds these. Children are owned (`Box`/`Vec`), so cloning a
//! node deep-copies its whole subtree: two instantiations of one template
//! never share child state.

use pscript_core::text::Location;

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // -- Host forms --
    Literal(Literal),
    Name(String),
    MemberAccess(MemberAccess),
    ElementAccess(ElementAccess),
    Invocation(Invocation),
    Assign(Assign),
    /// An explicit type expression, e.g. `Vector.<int>` or `int[]`.
    TypeRef(TypeName),

    // -- Dynamic extensions --
    ObjectInitializer(ObjectInitializer),
    ArrayInitializer(ArrayInitializer),
    Delete(DeleteExpr),
    New(NewExpr),
    Typeof(TypeofExpr),
    In(InExpr),
    Undefined,
    Regex(RegexLiteral),
    Xml(XmlLiteral),
    XmlQuery(XmlQueryExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int(i64),
    Number(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub target: Box<Expr>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementAccess {
    pub target: Box<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Box<Expr>,
    pub value: Box<Expr>,
}

/// A written type: a possibly dotted name, generic arguments and an array rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: String,
    pub type_args: Vec<TypeName>,
    /// Dimensions of a native array written as `T[]` or `T[,]`; 0 for none.
    pub rank: u32,
    pub loc: Location,
}

impl TypeName {
    pub fn simple(name: impl Into<String>, loc: Location) -> Self {
        Self {
            name: name.into(),
            type_args: Vec::new(),
            rank: 0,
            loc,
        }
    }

    pub fn generic(name: impl Into<String>, type_args: Vec<TypeName>, loc: Location) -> Self {
        Self {
            name: name.into(),
            type_args,
            rank: 0,
            loc,
        }
    }

    pub fn array_of(element: TypeName, rank: u32) -> Self {
        Self {
            rank: element.rank + rank,
            ..element
        }
    }
}

/// `{ name: value, "literal": value }`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInitializer {
    pub elements: Vec<ElementInitializer>,
}

/// One `name: value` pair of an object initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInitializer {
    pub name: String,
    pub value: Expr,
    pub loc: Location,
}

/// `[a, b, c]`, or `new <T>[a, b, c]` when `vector_type` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayInitializer {
    pub elements: Vec<Expr>,
    /// Element type written at the literal site.
    pub vector_type: Option<TypeName>,
}

/// `delete x[k]` / `delete x.k`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteExpr {
    pub operand: Box<Expr>,
}

/// `new X` where `X` has not yet been told apart.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeofExpr {
    pub operand: Box<Expr>,
}

/// `key in container`
#[derive(Debug, Clone, PartialEq)]
pub struct InExpr {
    pub key: Box<Expr>,
    pub container: Box<Expr>,
}

/// A regular expression literal `/pattern/options`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegexLiteral {
    pattern: String,
    options: String,
}

impl RegexLiteral {
    pub fn new(pattern: impl Into<String>, options: Option<&str>) -> Self {
        Self {
            pattern: pattern.into(),
            options: options.unwrap_or_default().to_string(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    /// The literal as written: `/pattern/options`.
    pub fn value(&self) -> String {
        format!("/{}/{}", self.pattern, self.options)
    }

    pub fn is_default_value(&self) -> bool {
        self.pattern.is_empty() && self.options.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        false
    }

    pub fn is_null(&self) -> bool {
        self.is_default_value()
    }
}

/// An XML literal, kept as raw text. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmlLiteral {
    text: String,
}

impl XmlLiteral {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_default_value(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        false
    }

    pub fn is_null(&self) -> bool {
        self.is_default_value()
    }
}

/// `source.(query)`
#[derive(Debug, Clone, PartialEq)]
pub struct XmlQueryExpr {
    pub source: Box<Expr>,
    pub query: Box<Expr>,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Location) -> Self {
        Self { kind, loc }
    }

    pub fn name(name: impl Into<String>, loc: Location) -> Self {
        Self::new(ExprKind::Name(name.into()), loc)
    }

    pub fn string(value: impl Into<String>, loc: Location) -> Self {
        Self::new(ExprKind::Literal(Literal::String(value.into())), loc)
    }

    pub fn int(value: i64, loc: Location) -> Self {
        Self::new(ExprKind::Literal(Literal::Int(value)), loc)
    }

    pub fn member(target: Expr, name: impl Into<String>, loc: Location) -> Self {
        Self::new(
            ExprKind::MemberAccess(MemberAccess {
                target: Box::new(target),
                name: name.into(),
            }),
            loc,
        )
    }

    pub fn element(target: Expr, args: Vec<Expr>, loc: Location) -> Self {
        Self::new(
            ExprKind::ElementAccess(ElementAccess {
                target: Box::new(target),
                args,
            }),
            loc,
        )
    }

    pub fn invoke(callee: Expr, args: Vec<Expr>, loc: Location) -> Self {
        Self::new(
            ExprKind::Invocation(Invocation {
                callee: Box::new(callee),
                args,
            }),
            loc,
        )
    }

    pub fn assign(target: Expr, value: Expr, loc: Location) -> Self {
        Self::new(
            ExprKind::Assign(Assign {
                target: Box::new(target),
                value: Box::new(value),
            }),
            loc,
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Literal(_) => "literal",
            ExprKind::Name(_) => "name",
            ExprKind::MemberAccess(_) => "member access",
            ExprKind::ElementAccess(_) => "element access",
            ExprKind::Invocation(_) => "invocation",
            ExprKind::Assign(_) => "assignment",
            ExprKind::TypeRef(_) => "type reference",
            ExprKind::ObjectInitializer(_) => "object initializer",
            ExprKind::ArrayInitializer(_) => "array initializer",
            ExprKind::Delete(_) => "delete",
            ExprKind::New(_) => "new",
            ExprKind::Typeof(_) => "typeof",
            ExprKind::In(_) => "in",
            ExprKind::Undefined => "undefined",
            ExprKind::Regex(_) => "regex literal",
            ExprKind::Xml(_) => "xml literal",
            ExprKind::XmlQuery(_) => "xml query",
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl(VariableDeclaration),
    /// An assignment, call, `delete` or `new` used as a statement.
    Expression(Expr),
    /// Any other expression used as a statement; emitted only for its side effects.
    NonAssign(NonAssignStatementExpr),
    Block(Vec<Stmt>),
    LocalFunction(LocalFunctionStmt),
    UseNamespace(UseNamespaceStmt),
}

/// `var name: Type = initializer`. A missing annotation means "infer from initializer".
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    pub annotation: Option<TypeName>,
    pub initializer: Option<Expr>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NonAssignStatementExpr {
    pub expr: Expr,
}

/// A function declared inside another function body. Lowered to a variable
/// holding a closure before resolution reaches it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFunctionStmt {
    pub name: String,
    pub function: FunctionExpr,
    pub declaration: VariableDeclaration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeName>,
    pub body: Vec<Stmt>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<TypeName>,
}

/// `use namespace ns;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseNamespaceStmt {
    pub namespace: String,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: Location) -> Self {
        Self { kind, loc }
    }
}
