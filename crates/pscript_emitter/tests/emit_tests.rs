//! Resolve, then emit, for both backends.

use pscript_ast::node::*;
use pscript_ast::typed::TypedStmt;
use pscript_checker::{ResolveContext, TypeRegistry};
use pscript_core::text::Location;
use pscript_diagnostics::DiagnosticCollection;
use pscript_emitter::{emit_native_unit, emit_script_unit, Instruction};
use pscript_options::{CompileTarget, Dialect, ResolveOptions};

fn loc() -> Location {
    Location::default()
}

fn resolve(registry: &TypeRegistry, target: CompileTarget, dialect: Dialect, stmts: &[Stmt]) -> Vec<TypedStmt> {
    let mut diags = DiagnosticCollection::new();
    let resolved = ResolveContext::new(ResolveOptions::new(target, dialect), registry, &mut diags).resolve_unit(stmts);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags.diagnostics());
    resolved.expect("unit should resolve")
}

fn script(stmts: &[Stmt]) -> String {
    let registry = TypeRegistry::new();
    let resolved = resolve(&registry, CompileTarget::Script, Dialect::Strict, stmts);
    emit_script_unit(&resolved, &registry).unwrap()
}

fn native(dialect: Dialect, stmts: &[Stmt]) -> (Vec<Instruction>, TypeRegistry) {
    let registry = TypeRegistry::new();
    let resolved = resolve(&registry, CompileTarget::Native, dialect, stmts);
    let code = emit_native_unit(&resolved, &registry).unwrap();
    (code, registry)
}

fn var(name: &str, init: Expr) -> Stmt {
    Stmt::new(
        StmtKind::VarDecl(VariableDeclaration { name: name.into(), annotation: None, initializer: Some(init), loc: loc() }),
        loc(),
    )
}

fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::new(StmtKind::Expression(expr), loc())
}

fn object(pairs: Vec<(&str, Expr)>) -> Expr {
    Expr::new(
        ExprKind::ObjectInitializer(ObjectInitializer {
            elements: pairs
                .into_iter()
                .map(|(name, value)| ElementInitializer { name: name.into(), value, loc: loc() })
                .collect(),
        }),
        loc(),
    )
}

fn array(elements: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::ArrayInitializer(ArrayInitializer { elements, vector_type: None }), loc())
}

// ============================================================================
// Script backend
// ============================================================================

#[test]
fn test_script_object_and_array_literals() {
    let text = script(&[
        var("o", object(vec![("a", Expr::int(1, loc())), ("b c", Expr::string("x", loc()))])),
        var("a", array(vec![Expr::int(1, loc()), Expr::int(2, loc())])),
    ]);
    assert_eq!(text, "\tvar o = {\"a\":1, \"b c\":\"x\"};\n\tvar a = [1, 2];\n");
}

#[test]
fn test_script_dynamic_operators() {
    let o = || Expr::name("o", loc());
    let text = script(&[
        var("o", object(vec![])),
        expr_stmt(Expr::new(ExprKind::Delete(DeleteExpr { operand: Box::new(Expr::member(o(), "k", loc())) }), loc())),
        expr_stmt(Expr::new(ExprKind::Typeof(TypeofExpr { operand: Box::new(o()) }), loc())),
        expr_stmt(Expr::new(
            ExprKind::In(InExpr { key: Box::new(Expr::string("k", loc())), container: Box::new(o()) }),
            loc(),
        )),
        expr_stmt(Expr::new(ExprKind::Undefined, loc())),
    ]);
    assert_eq!(
        text,
        "\tvar o = {};\n\tdelete o.k;\n\ttypeof o;\n\t\"k\" in o;\n\tundefined;\n"
    );
}

#[test]
fn test_script_new_invocation() {
    let text = script(&[expr_stmt(Expr::new(
        ExprKind::New(NewExpr {
            operand: Box::new(Expr::invoke(Expr::name("RegExp", loc()), vec![Expr::string("a", loc())], loc())),
        }),
        loc(),
    ))]);
    assert_eq!(text, "\tnew RegExp(\"a\");\n");
}

#[test]
fn test_script_regex_and_xml_are_verbatim() {
    let text = script(&[
        var("r", Expr::new(ExprKind::Regex(RegexLiteral::new("a+", None)), loc())),
        var("g", Expr::new(ExprKind::Regex(RegexLiteral::new("x", Some("gi"))), loc())),
        var("x", Expr::new(ExprKind::Xml(XmlLiteral::new("<a b=\"1\"/>")), loc())),
    ]);
    assert_eq!(text, "\tvar r = /a+/;\n\tvar g = /x/gi;\n\tvar x = <a b=\"1\"/>;\n");
}

#[test]
fn test_script_side_effect_free_statement_is_dropped() {
    let text = script(&[
        var("x", Expr::int(1, loc())),
        Stmt::new(StmtKind::NonAssign(NonAssignStatementExpr { expr: Expr::name("x", loc()) }), loc()),
        Stmt::new(StmtKind::UseNamespace(UseNamespaceStmt { namespace: "ns".into() }), loc()),
    ]);
    assert_eq!(text, "\tvar x = 1;\n");
}

// ============================================================================
// Native backend
// ============================================================================

#[test]
fn test_native_regex_construction() {
    let (code, registry) = native(
        Dialect::Strict,
        &[var("r", Expr::new(ExprKind::Regex(RegexLiteral::new("a+", None)), loc()))],
    );
    let regexp = registry.predefined().regexp;
    assert_eq!(
        code,
        vec![
            Instruction::DeclareLocal { name: "r".into(), ty: regexp },
            Instruction::LdStr("a+".into()),
            Instruction::LdStr(String::new()),
            Instruction::NewObj { ty: regexp, args: 2 },
            Instruction::StLoc("r".into()),
        ]
    );
}

#[test]
fn test_native_object_initializer_sets_keys() {
    let (code, registry) = native(Dialect::Strict, &[var("o", object(vec![("a", Expr::int(1, loc()))]))]);
    let expando = registry.predefined().expando;
    assert_eq!(
        &code[1..],
        &[
            Instruction::NewObj { ty: expando, args: 0 },
            Instruction::Dup,
            Instruction::LdStr("a".into()),
            Instruction::LdcI4(1),
            Instruction::CallVirt { owner: expando, method: "set_Item".into(), args: 2 },
            Instruction::StLoc("o".into()),
        ]
    );
}

#[test]
fn test_native_delete_statement_pops_result() {
    let (code, registry) = native(
        Dialect::Strict,
        &[
            var("o", object(vec![])),
            expr_stmt(Expr::new(
                ExprKind::Delete(DeleteExpr {
                    operand: Box::new(Expr::element(Expr::name("o", loc()), vec![Expr::string("k", loc())], loc())),
                }),
                loc(),
            )),
        ],
    );
    let capability = registry.predefined().dynamic_class;
    assert_eq!(
        &code[code.len() - 5..],
        &[
            Instruction::LdLoc("o".into()),
            Instruction::CastClass(capability),
            Instruction::LdStr("k".into()),
            Instruction::CallVirt { owner: capability, method: "__DeleteDynamicValue".into(), args: 1 },
            Instruction::Pop,
        ]
    );
}

#[test]
fn test_native_multi_dimensional_array() {
    let creation = Expr::new(
        ExprKind::New(NewExpr {
            operand: Box::new(Expr::element(
                Expr::name("int", loc()),
                vec![Expr::int(3, loc()), Expr::int(5, loc())],
                loc(),
            )),
        }),
        loc(),
    );
    let (code, registry) = native(Dialect::Extended, &[var("m", creation)]);
    let array = registry.make_array(registry.builtins().int, 2);
    assert_eq!(
        &code[1..],
        &[
            Instruction::LdcI4(3),
            Instruction::LdcI4(5),
            Instruction::NewMultiArr { array, rank: 2 },
            Instruction::StLoc("m".into()),
        ]
    );
}

#[test]
fn test_native_array_initializer_fills_elements() {
    let annotation = TypeName::array_of(TypeName::simple("int", loc()), 1);
    let decl = Stmt::new(
        StmtKind::VarDecl(VariableDeclaration {
            name: "a".into(),
            annotation: Some(annotation),
            initializer: Some(array(vec![Expr::int(7, loc())])),
            loc: loc(),
        }),
        loc(),
    );
    let (code, registry) = native(Dialect::Extended, &[decl]);
    let int = registry.builtins().int;
    assert_eq!(
        &code[1..],
        &[
            Instruction::LdcI4(1),
            Instruction::NewArr { element: int },
            Instruction::Dup,
            Instruction::LdcI4(0),
            Instruction::LdcI4(7),
            Instruction::StElem { element: int },
            Instruction::StLoc("a".into()),
        ]
    );
}

#[test]
fn test_native_typeof_and_undefined() {
    let (code, registry) = native(
        Dialect::Strict,
        &[
            var("u", Expr::new(ExprKind::Undefined, loc())),
            var("t", Expr::new(ExprKind::Typeof(TypeofExpr { operand: Box::new(Expr::name("u", loc())) }), loc())),
        ],
    );
    let p = registry.predefined();
    assert!(code.contains(&Instruction::LdSFld { owner: p.undefined, name: "_undefined".into() }));
    assert!(code.contains(&Instruction::Call { owner: p.typeof_helper, method: "_typeof".into(), args: 1 }));
}

#[test]
fn test_native_non_assign_with_side_effects_is_kept() {
    let call = Expr::invoke(Expr::member(Expr::name("r", loc()), "test", loc()), vec![Expr::string("s", loc())], loc());
    let (code, _) = native(
        Dialect::Strict,
        &[
            var("r", Expr::new(ExprKind::Regex(RegexLiteral::new("a", None)), loc())),
            Stmt::new(StmtKind::NonAssign(NonAssignStatementExpr { expr: Expr::name("r", loc()) }), loc()),
            Stmt::new(StmtKind::NonAssign(NonAssignStatementExpr { expr: call }), loc()),
        ],
    );
    assert_eq!(code.last(), Some(&Instruction::Pop));
    assert_eq!(code.iter().filter(|i| matches!(i, Instruction::LdLoc(_))).count(), 1);
}
