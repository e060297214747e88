//! Statements.

use crate::context::ResolveContext;
use crate::infer::{DeclaredType, InferenceSite};
use pscript_ast::node::*;
use pscript_ast::typed::*;

impl ResolveContext<'_> {
    /// Resolve a whole unit. Every statement is resolved even after a failure.
    pub fn resolve_unit(&mut self, statements: &[Stmt]) -> Option<Vec<TypedStmt>> {
        let resolved: Vec<Option<TypedStmt>> = statements.iter().map(|s| self.resolve_stmt(s)).collect();
        resolved.into_iter().collect()
    }

    pub fn resolve_stmt(&mut self, stmt: &Stmt) -> Option<TypedStmt> {
        let loc = stmt.loc;
        let kind = match &stmt.kind {
            StmtKind::VarDecl(decl) => self.resolve_var_decl(decl)?,
            StmtKind::Expression(expr) => TypedStmtKind::Expression(self.resolve_expr(expr)?),
            StmtKind::NonAssign(n) => TypedStmtKind::NonAssign(self.resolve_expr(&n.expr)?),
            StmtKind::Block(stmts) => {
                self.push_scope();
                let body = self.resolve_unit(stmts);
                self.pop_scope();
                TypedStmtKind::Block(body?)
            }
            // Lowered to a closure variable before resolution gets here.
            StmtKind::LocalFunction(n) => TypedStmtKind::LocalFunction { name: n.name.clone() },
            StmtKind::UseNamespace(n) => TypedStmtKind::UseNamespace { namespace: n.namespace.clone() },
        };
        Some(TypedStmt::new(kind, loc))
    }

    fn resolve_var_decl(&mut self, decl: &VariableDeclaration) -> Option<TypedStmtKind> {
        let annotated = decl.annotation.as_ref().map(|name| self.resolve_type_name(name));
        let declared = match annotated {
            Some(Some(ty)) => DeclaredType::Typed(ty),
            _ => DeclaredType::Infer,
        };

        let site = InferenceSite::variable(declared);
        let initializer = decl.initializer.as_ref().map(|init| self.resolve_expr_with(init, &site));

        let ty = match (declared, &initializer) {
            (DeclaredType::Typed(ty), _) => ty,
            (DeclaredType::Infer, Some(Some(init))) => init.ty,
            _ => self.builtins().dynamic,
        };
        // Declare even on failure so later uses do not cascade into 103s.
        self.declare_local(&decl.name, ty);

        let annotation_failed = matches!(annotated, Some(None));
        let initializer = match initializer {
            Some(init) => Some(init?),
            None => None,
        };
        if annotation_failed {
            return None;
        }
        tracing::trace!(name = %decl.name, ty = %self.type_name(ty), "declare local");
        Some(TypedStmtKind::VarDecl { name: decl.name.clone(), ty, initializer })
    }
}
