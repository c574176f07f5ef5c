//! Integration tests for expression typing.
//!
//! These tests exercise:
//! - Numeric promotion of mixed literal operands and division
//! - String concatenation and interpolation
//! - Integer literal bounds against declared field types
//! - Casts, logical operators and undefined names
//! - Generic calls, partial application and uniform call syntax

use lumen_ast::{BinaryOp, Builder, Expr, NodeId, Stmt};
use lumen_typeck::{check_module, CheckOptions, TypeckResult};

// ── Helpers ────────────────────────────────────────────────────────────

fn check(b: &Builder, body: Vec<Stmt>) -> TypeckResult {
    check_module(Some(&b.module(body)), &CheckOptions::default()).unwrap()
}

/// Check a module and require a clean result.
fn check_module_ok(b: &Builder, body: Vec<Stmt>) -> TypeckResult {
    let result = check(b, body);
    assert!(
        result.diagnostics.is_empty(),
        "expected no diagnostics, got: {:?}",
        messages(&result)
    );
    result
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

fn type_text(result: &TypeckResult, id: NodeId) -> String {
    result
        .type_of(id)
        .map(ToString::to_string)
        .unwrap_or_else(|| "<untyped>".to_string())
}

/// Check one expression and return its type and the result.
fn check_expr(b: &Builder, expr: Expr) -> (String, TypeckResult) {
    let id = expr.id;
    let result = check(b, vec![b.expr_stmt(expr)]);
    (type_text(&result, id), result)
}

// ── Numeric promotion ──────────────────────────────────────────────────

#[test]
fn integer_plus_float_literal_is_f64() {
    let b = Builder::new();
    let (ty, result) = check_expr(&b, b.binary(BinaryOp::Add, b.int(1), b.float(2.0)));
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
    assert_eq!(ty, "f64");
}

#[test]
fn integer_division_promotes_to_float() {
    let b = Builder::new();
    let (ty, _) = check_expr(&b, b.binary(BinaryOp::Div, b.int(5), b.int(2)));
    assert_eq!(ty, "f64");
}

#[test]
fn floor_division_stays_integral() {
    let b = Builder::new();
    let (ty, result) = check_expr(&b, b.binary(BinaryOp::FloorDiv, b.int(5), b.int(2)));
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
    assert_eq!(ty, "i32");
}

#[test]
fn string_concatenation() {
    let b = Builder::new();
    let (ty, result) = check_expr(&b, b.binary(BinaryOp::Add, b.string("a"), b.string("b")));
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
    assert_eq!(ty, "string");
}

#[test]
fn interpolation_is_a_string() {
    let b = Builder::new();
    let (ty, _) = check_expr(&b, b.interpolation(vec![b.string("n = "), b.int(3)]));
    assert_eq!(ty, "string");
}

#[test]
fn adding_bool_to_number_is_reported() {
    let b = Builder::new();
    let (_, result) = check_expr(&b, b.binary(BinaryOp::Add, b.bool(true), b.int(1)));
    assert_eq!(result.diagnostics.len(), 1, "{:?}", messages(&result));
    assert!(result.diagnostics[0].message.starts_with("typechecker: '+'"));
}

// ── Literal bounds ─────────────────────────────────────────────────────

#[test]
fn literal_out_of_range_for_struct_field() {
    let b = Builder::new();
    let pixel = b.item(b.struct_def("Pixel", vec![], vec![("level", b.ty("u8"))]));
    let literal = b.int(512);
    let literal_id = literal.id;
    let value = b.struct_lit("Pixel", vec![("level", literal)]);
    let result = check(&b, vec![pixel, b.expr_stmt(value)]);

    assert_eq!(result.diagnostics.len(), 1, "{:?}", messages(&result));
    let diagnostic = &result.diagnostics[0];
    assert!(diagnostic.message.contains("literal 512 does not fit in u8"));
    assert_eq!(diagnostic.node, Some(literal_id));
}

#[test]
fn literal_within_range_is_accepted() {
    let b = Builder::new();
    let pixel = b.item(b.struct_def("Pixel", vec![], vec![("level", b.ty("u8"))]));
    let value = b.struct_lit("Pixel", vec![("level", b.int(255))]);
    check_module_ok(&b, vec![pixel, b.expr_stmt(value)]);
}

// ── Casts, logic and names ─────────────────────────────────────────────

#[test]
fn numeric_casts_are_allowed() {
    let b = Builder::new();
    let (ty, result) = check_expr(&b, b.cast(b.float(2.5), b.ty("i64")));
    assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
    assert_eq!(ty, "i64");
}

#[test]
fn casting_a_string_to_a_number_is_reported() {
    let b = Builder::new();
    let (_, result) = check_expr(&b, b.cast(b.string("7"), b.ty("i32")));
    assert_has_diagnostic(&result, "cannot cast string to i32");
}

#[test]
fn logical_operators_merge_operand_types() {
    let b = Builder::new();
    let (ty, _) = check_expr(&b, b.binary(BinaryOp::Or, b.bool(true), b.bool(false)));
    assert_eq!(ty, "bool");
    let (ty, _) = check_expr(&b, b.binary(BinaryOp::And, b.string("a"), b.bool(false)));
    assert_eq!(ty, "Unknown");
}

#[test]
fn undefined_identifier() {
    let b = Builder::new();
    let (ty, result) = check_expr(&b, b.var("missing"));
    assert_eq!(ty, "Unknown");
    insta::assert_debug_snapshot!(messages(&result), @r#"
    [
        "typechecker: undefined identifier 'missing'",
    ]
    "#);
}

// ── Calls ──────────────────────────────────────────────────────────────

#[test]
fn call_arity_is_checked() {
    let b = Builder::new();
    let area = b.function_def(
        "area",
        vec![b.param("w", Some(b.ty("i32"))), b.param("h", Some(b.ty("i32")))],
        Some(b.ty("i32")),
        vec![b.expr_stmt(b.binary(BinaryOp::Mul, b.var("w"), b.var("h")))],
    );
    let call = b.call_named("area", vec![b.int(1), b.int(2), b.int(3)]);
    let result = check(&b, vec![b.item(area), b.expr_stmt(call)]);
    assert_has_diagnostic(&result, "function expects 2 arguments, got 3");
}

#[test]
fn argument_types_are_checked() {
    let b = Builder::new();
    let greet = b.function_def(
        "greet",
        vec![b.param("name", Some(b.ty("string")))],
        Some(b.ty("string")),
        vec![b.expr_stmt(b.var("name"))],
    );
    let call = b.call_named("greet", vec![b.bool(true)]);
    let result = check(&b, vec![b.item(greet), b.expr_stmt(call)]);
    assert_has_diagnostic(&result, "argument 1 has type bool, expected string");
}

#[test]
fn generic_return_is_inferred_from_arguments() {
    let b = Builder::new();
    let mut identity = b.function_def(
        "identity",
        vec![b.param("value", Some(b.ty("T")))],
        Some(b.ty("T")),
        vec![b.expr_stmt(b.var("value"))],
    );
    identity.generics = vec![b.generic("T", vec![])];
    let call = b.call_named("identity", vec![b.string("x")]);
    let call_id = call.id;
    let result = check_module_ok(&b, vec![b.item(identity), b.expr_stmt(call)]);
    assert_eq!(type_text(&result, call_id), "string");
}

#[test]
fn missing_trailing_arguments_give_a_partial_function() {
    let b = Builder::new();
    let add = b.function_def(
        "add",
        vec![b.param("a", Some(b.ty("i32"))), b.param("b", Some(b.ty("i32")))],
        Some(b.ty("i32")),
        vec![b.expr_stmt(b.binary(BinaryOp::Add, b.var("a"), b.var("b")))],
    );
    let call = b.call_named("add", vec![b.int(1)]);
    let call_id = call.id;
    let result = check_module_ok(&b, vec![b.item(add), b.expr_stmt(call)]);
    assert_eq!(type_text(&result, call_id), "fn(i32) -> i32");
}

#[test]
fn free_functions_are_callable_as_methods() {
    let b = Builder::new();
    let double = b.function_def(
        "double",
        vec![b.param("n", Some(b.ty("i32")))],
        Some(b.ty("i32")),
        vec![b.expr_stmt(b.binary(BinaryOp::Mul, b.var("n"), b.int(2)))],
    );
    let call = b.method_call(b.int(21), "double", vec![]);
    let call_id = call.id;
    let result = check_module_ok(&b, vec![b.item(double), b.expr_stmt(call)]);
    assert_eq!(type_text(&result, call_id), "i32");
}

#[test]
fn method_syntax_binds_generic_first_parameter() {
    let b = Builder::new();
    let echo = b.function_def(
        "echo",
        vec![b.param("value", Some(b.ty("T")))],
        Some(b.ty("T")),
        vec![b.expr_stmt(b.var("value"))],
    );
    let call = b.method_call(b.string("hi"), "echo", vec![]);
    let call_id = call.id;
    let result = check_module_ok(&b, vec![b.item(echo), b.expr_stmt(call)]);
    assert_eq!(type_text(&result, call_id), "string");
}

#[test]
fn method_syntax_accepts_a_nullable_first_parameter() {
    let b = Builder::new();
    let or_zero = b.function_def(
        "or_zero",
        vec![b.param("n", Some(b.nullable_ty(b.ty("i32"))))],
        Some(b.ty("i32")),
        vec![b.expr_stmt(b.int(0))],
    );
    let call = b.method_call(b.int(7), "or_zero", vec![]);
    let call_id = call.id;
    let result = check_module_ok(&b, vec![b.item(or_zero), b.expr_stmt(call)]);
    assert_eq!(type_text(&result, call_id), "i32");
}

#[test]
fn calling_a_number_is_reported() {
    let b = Builder::new();
    let (_, result) = check_expr(&b, b.call(b.int(3), vec![]));
    assert_has_diagnostic(&result, "cannot call non-callable value i32");
}
