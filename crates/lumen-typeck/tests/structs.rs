//! Integration tests for struct declarations, literals and field access.

use lumen_ast::{AssignOp, Builder, PatternKind, Stmt};
use lumen_typeck::{check_module, CheckOptions, Type, TypeckResult};

// ── Helpers ────────────────────────────────────────────────────────────

fn check(b: &Builder, body: Vec<Stmt>) -> TypeckResult {
    check_module(Some(&b.module(body)), &CheckOptions::default()).unwrap()
}

fn messages(result: &TypeckResult) -> Vec<String> {
    result.diagnostics.iter().map(|d| d.message.clone()).collect()
}

fn assert_has_diagnostic(result: &TypeckResult, needle: &str) {
    assert!(
        result.diagnostics.iter().any(|d| d.message.contains(needle)),
        "expected a diagnostic containing `{needle}`, got: {:?}",
        messages(result)
    );
}

/// `struct Pair T U { first: T, second: U }`
fn pair(b: &Builder) -> Stmt {
    b.item(b.struct_def(
        "Pair",
        vec![b.generic("T", vec![]), b.generic("U", vec![])],
        vec![("first", b.ty("T")), ("second", b.ty("U"))],
    ))
}

/// `struct Point { x: i32, y: i32 }`
fn point(b: &Builder) -> Stmt {
    b.item(b.struct_def("Point", vec![], vec![("x", b.ty("i32")), ("y", b.ty("i32"))]))
}

// ── Generic literals ───────────────────────────────────────────────────

#[test]
fn generic_literal_infers_type_arguments() {
    let b = Builder::new();
    let literal = b.struct_lit("Pair", vec![("first", b.int(1)), ("second", b.string("one"))]);
    let id = literal.id;
    let result = check(&b, vec![pair(&b), b.expr_stmt(literal)]);
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));

    let Some(Type::StructInstance(instance)) = result.type_of(id) else {
        panic!("expected a struct instance, got {:?}", result.type_of(id));
    };
    let args: Vec<String> = instance.type_args.iter().map(ToString::to_string).collect();
    assert_eq!(args, vec!["i32", "string"]);
}

#[test]
fn explicit_type_arguments_guide_fields() {
    let b = Builder::new();
    let literal = b.struct_lit_with_type_args(
        "Pair",
        vec![("first", b.string("no")), ("second", b.int(2))],
        vec![b.ty("i64"), b.ty("i64")],
    );
    let result = check(&b, vec![pair(&b), b.expr_stmt(literal)]);
    assert_has_diagnostic(&result, "field 'first' expects i64, got string");
}

#[test]
fn too_many_type_arguments() {
    let b = Builder::new();
    let literal = b.struct_lit_with_type_args(
        "Pair",
        vec![("first", b.int(1)), ("second", b.int(2))],
        vec![b.ty("i32"), b.ty("i32"), b.ty("i32")],
    );
    let result = check(&b, vec![pair(&b), b.expr_stmt(literal)]);
    assert_has_diagnostic(&result, "struct Pair expects 2 type argument(s), got 3");
}

#[test]
fn field_access_on_an_instance() {
    let b = Builder::new();
    let literal = b.struct_lit("Pair", vec![("first", b.int(1)), ("second", b.string("one"))]);
    let access = b.member(b.var("p"), "second");
    let id = access.id;
    let result = check(&b, vec![pair(&b), b.declare("p", literal), b.expr_stmt(access)]);
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
    assert_eq!(result.type_of(id).map(ToString::to_string).as_deref(), Some("string"));
}

// ── Field checks ───────────────────────────────────────────────────────

#[test]
fn missing_field() {
    let b = Builder::new();
    let literal = b.struct_lit("Point", vec![("x", b.int(1))]);
    let result = check(&b, vec![point(&b), b.expr_stmt(literal)]);
    insta::assert_debug_snapshot!(messages(&result), @r#"
    [
        "typechecker: struct literal Point is missing field 'y'",
    ]
    "#);
}

#[test]
fn nullable_fields_may_be_omitted() {
    let b = Builder::new();
    let user = b.item(b.struct_def(
        "User",
        vec![],
        vec![("name", b.ty("string")), ("nickname", b.nullable_ty(b.ty("string")))],
    ));
    let literal = b.struct_lit("User", vec![("name", b.string("ada"))]);
    let result = check(&b, vec![user, b.expr_stmt(literal)]);
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
}

#[test]
fn unknown_field_in_literal() {
    let b = Builder::new();
    let literal = b.struct_lit("Point", vec![("x", b.int(1)), ("y", b.int(2)), ("z", b.int(3))]);
    let result = check(&b, vec![point(&b), b.expr_stmt(literal)]);
    assert_has_diagnostic(&result, "struct Point has no field 'z'");
}

#[test]
fn duplicate_field_in_literal() {
    let b = Builder::new();
    let literal = b.struct_lit("Point", vec![("x", b.int(1)), ("x", b.int(2)), ("y", b.int(3))]);
    let result = check(&b, vec![point(&b), b.expr_stmt(literal)]);
    assert_has_diagnostic(&result, "duplicate field 'x' in struct literal");
}

#[test]
fn unknown_struct_name() {
    let b = Builder::new();
    let result = check(&b, vec![b.expr_stmt(b.struct_lit("Ghost", vec![]))]);
    assert_has_diagnostic(&result, "unknown struct 'Ghost'");
}

#[test]
fn unknown_member_access() {
    let b = Builder::new();
    let literal = b.struct_lit("Point", vec![("x", b.int(1)), ("y", b.int(2))]);
    let access = b.member(b.var("p"), "z");
    let result = check(&b, vec![point(&b), b.declare("p", literal), b.expr_stmt(access)]);
    assert_has_diagnostic(&result, "struct 'Point' has no member 'z'");
}

#[test]
fn positional_structs_check_arity() {
    let b = Builder::new();
    let vec2 = b.item(b.positional_struct_def("Vec2", vec![], vec![b.ty("f64"), b.ty("f64")]));
    let literal = b.positional_struct_lit("Vec2", vec![b.float(1.0)]);
    let result = check(&b, vec![vec2, b.expr_stmt(literal)]);
    assert_has_diagnostic(&result, "struct Vec2 expects 2 positional value(s), got 1");
}

#[test]
fn destructuring_an_unknown_field_points_at_the_field() {
    let b = Builder::new();
    let literal = b.struct_lit("Point", vec![("x", b.int(1)), ("y", b.int(2))]);
    let pattern = b.pat_struct(Some("Point"), vec![("x", b.pat_ident("a")), ("z", b.pat_ident("c"))]);
    let PatternKind::Struct { fields, .. } = &pattern.kind else {
        unreachable!("pat_struct builds a struct pattern");
    };
    let missing = fields[1].id;
    let destructure = b.assign(AssignOp::Declare, pattern, literal);
    let result = check(&b, vec![point(&b), b.expr_stmt(destructure)]);
    assert_eq!(
        messages(&result),
        vec!["typechecker: struct pattern field 'z' not found in Point"]
    );
    assert_eq!(result.diagnostics[0].node, Some(missing));
}
