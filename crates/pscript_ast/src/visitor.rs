//! Structural traversal over unresolved nodes.
//!
//! A visitor sees every node before its children. While visiting, it can ask
//! the walk to skip the current node's subtree (`VisitFlow::skip_children`,
//! consumed by the next descent and then reset) or to halt the whole walk
//! (`VisitFlow::halt`, sticky). Nodes only know how to hand the visitor to
//! their children, in declaration order.

use crate::node::*;

/// A borrowed reference to any visitable node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'n> {
    Expr(&'n Expr),
    Stmt(&'n Stmt),
    /// One `name: value` pair of an object initializer.
    Element(&'n ElementInitializer),
}

/// Traversal state threaded by reference through the walk.
#[derive(Debug, Default, Clone)]
pub struct VisitFlow {
    skip: bool,
    halted: bool,
}

impl VisitFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not descend into the node being visited. Resets after use.
    pub fn skip_children(&mut self) {
        self.skip = true;
    }

    /// Stop the walk entirely. Never resets.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn take_skip(&mut self) -> bool {
        std::mem::take(&mut self.skip)
    }
}

pub trait StructuralVisitor {
    fn visit(&mut self, node: NodeRef<'_>, flow: &mut VisitFlow);

    /// Whether the walk should descend into children at all.
    fn auto_visit(&self) -> bool {
        true
    }
}

/// Call `f` on each direct child of `node`, in declaration order.
pub fn for_each_child<'n>(node: NodeRef<'n>, mut f: impl FnMut(NodeRef<'n>)) {
    match node {
        NodeRef::Expr(expr) => for_each_expr_child(expr, &mut f),
        NodeRef::Stmt(stmt) => for_each_stmt_child(stmt, &mut f),
        NodeRef::Element(elem) => f(NodeRef::Expr(&elem.value)),
    }
}

fn for_each_expr_child<'n>(expr: &'n Expr, f: &mut impl FnMut(NodeRef<'n>)) {
    match &expr.kind {
        ExprKind::Literal(_)
        | ExprKind::Name(_)
        | ExprKind::TypeRef(_)
        | ExprKind::Undefined
        | ExprKind::Regex(_)
        | ExprKind::Xml(_) => {}
        ExprKind::MemberAccess(n) => f(NodeRef::Expr(&n.target)),
        ExprKind::ElementAccess(n) => {
            f(NodeRef::Expr(&n.target));
            n.args.iter().for_each(|a| f(NodeRef::Expr(a)));
        }
        ExprKind::Invocation(n) => {
            f(NodeRef::Expr(&n.callee));
            n.args.iter().for_each(|a| f(NodeRef::Expr(a)));
        }
        ExprKind::Assign(n) => {
            f(NodeRef::Expr(&n.target));
            f(NodeRef::Expr(&n.value));
        }
        ExprKind::ObjectInitializer(n) => n.elements.iter().for_each(|e| f(NodeRef::Element(e))),
        ExprKind::ArrayInitializer(n) => n.elements.iter().for_each(|e| f(NodeRef::Expr(e))),
        ExprKind::Delete(n) => f(NodeRef::Expr(&n.operand)),
        ExprKind::New(n) => f(NodeRef::Expr(&n.operand)),
        ExprKind::Typeof(n) => f(NodeRef::Expr(&n.operand)),
        ExprKind::In(n) => {
            f(NodeRef::Expr(&n.key));
            f(NodeRef::Expr(&n.container));
        }
        ExprKind::XmlQuery(n) => {
            f(NodeRef::Expr(&n.source));
            f(NodeRef::Expr(&n.query));
        }
    }
}

fn for_each_stmt_child<'n>(stmt: &'n Stmt, f: &mut impl FnMut(NodeRef<'n>)) {
    match &stmt.kind {
        StmtKind::VarDecl(decl) => {
            if let Some(init) = &decl.initializer {
                f(NodeRef::Expr(init));
            }
        }
        StmtKind::Expression(expr) => f(NodeRef::Expr(expr)),
        StmtKind::NonAssign(n) => f(NodeRef::Expr(&n.expr)),
        StmtKind::Block(stmts) => stmts.iter().for_each(|s| f(NodeRef::Stmt(s))),
        StmtKind::LocalFunction(n) => n.function.body.iter().for_each(|s| f(NodeRef::Stmt(s))),
        StmtKind::UseNamespace(_) => {}
    }
}

/// Visit `node`, then (unless skipped or halted) its subtree.
pub fn accept(node: NodeRef<'_>, visitor: &mut dyn StructuralVisitor, flow: &mut VisitFlow) {
    visitor.visit(node, flow);

    if !visitor.auto_visit() {
        return;
    }
    if flow.take_skip() {
        return;
    }
    let mut children = Vec::new();
    for_each_child(node, |child| children.push(child));
    for child in children {
        if flow.is_halted() {
            return;
        }
        accept(child, visitor, flow);
    }
}

impl Expr {
    pub fn accept(&self, visitor: &mut dyn StructuralVisitor, flow: &mut VisitFlow) {
        accept(NodeRef::Expr(self), visitor, flow);
    }
}

impl Stmt {
    pub fn accept(&self, visitor: &mut dyn StructuralVisitor, flow: &mut VisitFlow) {
        accept(NodeRef::Stmt(self), visitor, flow);
    }
}
