//! Compiler integration tests.
//!
//! End-to-end tests for the pipeline: resolve every unit, then emit into the
//! configured backend.

use pscript_ast::node::*;
use pscript_compiler::{EmitResult, Program};
use pscript_core::error::InternalError;
use pscript_core::text::{FileId, Location};
use pscript_emitter::Instruction;

fn at(start: u32) -> Location {
    Location::at(start, start + 1)
}

fn var(name: &str, init: Expr) -> Stmt {
    Stmt::new(
        StmtKind::VarDecl(VariableDeclaration { name: name.into(), annotation: None, initializer: Some(init), loc: at(0) }),
        at(0),
    )
}

fn expr_stmt(expr: Expr) -> Stmt {
    let loc = expr.loc;
    Stmt::new(StmtKind::Expression(expr), loc)
}

fn typeof_name(name: &str, pos: u32) -> Expr {
    Expr::new(ExprKind::Typeof(TypeofExpr { operand: Box::new(Expr::name(name, at(pos))) }), at(pos))
}

fn object_unit() -> Vec<Stmt> {
    let init = Expr::new(
        ExprKind::ObjectInitializer(ObjectInitializer {
            elements: vec![ElementInitializer { name: "a".into(), value: Expr::int(1, at(4)), loc: at(3) }],
        }),
        at(2),
    );
    vec![var("o", init)]
}

#[test]
fn test_empty_program() {
    let program = Program::from_config("{}").unwrap();
    let (diags, outputs) = program.compile();
    assert!(diags.is_empty());
    assert!(outputs.is_empty());
}

#[test]
fn test_script_compile() {
    let mut program = Program::from_config(r#"{ "target": "script" }"#).unwrap();
    program.add_unit("main", object_unit());
    let (diags, outputs) = program.compile();
    assert!(diags.is_empty());
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].result, Ok(EmitResult::Script("\tvar o = {\"a\":1};\n".to_string())));
}

#[test]
fn test_native_compile() {
    let mut program = Program::from_config("{}").unwrap();
    program.add_unit("main", object_unit());
    let (diags, outputs) = program.compile();
    assert!(diags.is_empty());
    match &outputs[0].result {
        Ok(EmitResult::Native(code)) => {
            let expando = program.registry().predefined().expando;
            assert!(code.contains(&Instruction::NewObj { ty: expando, args: 0 }));
        }
        other => panic!("expected native output, got {other:?}"),
    }
}

#[test]
fn test_diagnostics_are_merged_and_sorted_across_units() {
    let mut program = Program::from_config(r#"{ "extended": true }"#).unwrap();
    let first = program.add_unit("first", vec![expr_stmt(typeof_name("x", 9)), expr_stmt(typeof_name("y", 1))]);
    let second = program.add_unit("second", vec![expr_stmt(typeof_name("z", 5))]);
    let result = program.check();
    assert_eq!(result.diagnostics.codes(), vec![7101, 7101, 7101]);
    let positions: Vec<(FileId, u32)> = result
        .diagnostics
        .diagnostics()
        .iter()
        .map(|d| d.location.map(|l| (l.file, l.span.start)).unwrap())
        .collect();
    assert_eq!(positions, vec![(first, 1), (first, 9), (second, 5)]);
    assert!(result.units.iter().all(|u| u.statements.is_none()));
}

#[test]
fn test_failed_unit_is_not_emitted() {
    let mut program = Program::from_config("{}").unwrap();
    program.add_unit("good", object_unit());
    program.add_unit("bad", vec![expr_stmt(Expr::name("missing", at(0)))]);
    let checked = program.check();
    assert_eq!(checked.diagnostics.codes(), vec![103]);

    let outputs = program.emit(&checked);
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].name, "good");

    let bad = checked.units.iter().find(|u| u.name == "bad").unwrap();
    assert!(matches!(program.emit_unit(bad), Err(InternalError::MissingResolve { .. })));
}

#[test]
fn test_root_namespace_from_config() {
    let mut program = Program::from_config(r#"{ "rootNamespace": "_top" }"#).unwrap();
    program.add_unit("main", vec![var("n", Expr::int(1, at(0))), var("t", typeof_name("n", 2))]);
    let (diags, outputs) = program.compile();
    assert!(diags.is_empty(), "{:?}", diags.codes());
    let helper = program.registry().lookup("_top._typeof_fn", 0).unwrap();
    match &outputs[0].result {
        Ok(EmitResult::Native(code)) => {
            assert!(code.contains(&Instruction::Call { owner: helper, method: "_typeof".into(), args: 1 }))
        }
        other => panic!("expected native output, got {other:?}"),
    }
}

#[test]
fn test_multi_dimensional_array_initializer_is_a_diagnostic() {
    let mut program = Program::from_config(r#"{ "extended": true }"#).unwrap();
    let annotation = TypeName::array_of(TypeName::simple("int", at(7)), 2);
    let init = Expr::new(
        ExprKind::ArrayInitializer(ArrayInitializer {
            elements: vec![Expr::int(1, at(14)), Expr::int(2, at(16))],
            vector_type: None,
        }),
        at(13),
    );
    let decl = VariableDeclaration { name: "a".into(), annotation: Some(annotation), initializer: Some(init), loc: at(4) };
    program.add_unit("main", vec![Stmt::new(StmtKind::VarDecl(decl), at(0))]);
    let (diags, outputs) = program.compile();
    assert_eq!(diags.codes(), vec![7105]);
    assert!(outputs.is_empty());
}

#[test]
fn test_many_units_check_in_parallel() {
    let mut program = Program::from_config(r#"{ "extended": true }"#).unwrap();
    for i in 0..16 {
        program.add_unit(format!("unit{i}"), object_unit());
    }
    let (diags, outputs) = program.compile();
    assert!(diags.is_empty());
    assert_eq!(outputs.len(), 16);
    let first = &outputs[0].result;
    assert!(outputs.iter().all(|o| &o.result == first));
}

#[test]
fn test_invalid_config() {
    assert!(Program::from_config(r#"{ "target": 3 }"#).is_err());
}
