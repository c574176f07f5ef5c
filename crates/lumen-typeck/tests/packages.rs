//! Integration tests for whole-program checking: dependency order,
//! imports, privacy, export summaries and fatal errors.

use lumen_ast::{Builder, Module, Program, Stmt};
use lumen_common::DiagnosticConfig;
use lumen_typeck::summary::Visibility;
use lumen_typeck::{check_module, CheckError, CheckOptions, ProgramChecker, ProgramResult};

// ── Helpers ────────────────────────────────────────────────────────────

fn check_program(modules: Vec<Module>) -> Result<ProgramResult, CheckError> {
    ProgramChecker::new(DiagnosticConfig::default()).check(&Program { modules })
}

fn messages(result: &ProgramResult) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .map(|d| d.diagnostic.message.clone())
        .collect()
}

fn assert_has_diagnostic(result: &ProgramResult, needle: &str) {
    assert!(
        result.diagnostics.iter().any(|d| d.diagnostic.message.contains(needle)),
        "expected a diagnostic containing `{needle}`, got: {:?}",
        messages(result)
    );
}

/// `fn area(w: i32, h: i32) -> i32`
fn area(b: &Builder) -> Stmt {
    b.item(b.function_def(
        "area",
        vec![b.param("w", Some(b.ty("i32"))), b.param("h", Some(b.ty("i32")))],
        Some(b.ty("i32")),
        vec![b.expr_stmt(b.int(0))],
    ))
}

/// `fn helper() -> i32`, declared private.
fn private_helper(b: &Builder) -> Stmt {
    let mut def = b.function_def("helper", vec![], Some(b.ty("i32")), vec![b.expr_stmt(b.int(1))]);
    def.private = true;
    b.item(def)
}

fn geo(b: &Builder) -> Module {
    b.module_in("geo", "src/geo/area.lm", vec![], vec![area(b), private_helper(b)])
}

// ── Ordering ───────────────────────────────────────────────────────────

#[test]
fn dependencies_are_checked_first() {
    let b = Builder::new();
    let call = b.call_named("area", vec![b.int(2), b.int(3)]);
    let app = b.module_in(
        "app",
        "src/app/main.lm",
        vec![b.import("geo", vec![("area", None)])],
        vec![b.expr_stmt(call)],
    );
    let result = check_program(vec![app, geo(&b)]).unwrap();
    assert!(!result.has_errors(), "{:?}", messages(&result));
    assert_eq!(result.order, vec!["geo", "app"]);
    assert!(result.exports["geo"].symbols.contains_key("area"));
}

#[test]
fn import_cycle_is_fatal() {
    let b = Builder::new();
    let a = b.module_in("a", "a.lm", vec![b.import("b", vec![])], vec![]);
    let other = b.module_in("b", "b.lm", vec![b.import("a", vec![])], vec![]);
    let Err(CheckError::PackageCycle { cycle }) = check_program(vec![a, other]) else {
        panic!("expected an import cycle");
    };
    assert!(cycle.contains(&"a".to_string()));
    assert!(cycle.contains(&"b".to_string()));
    assert_eq!(cycle.first(), cycle.last());
}

#[test]
fn modules_of_one_package_share_declarations() {
    let b = Builder::new();
    let first = b.module_in("geo", "src/geo/area.lm", vec![], vec![area(&b)]);
    let call = b.call_named("area", vec![b.int(1), b.int(1)]);
    let second = b.module_in("geo", "src/geo/use.lm", vec![], vec![b.expr_stmt(call)]);
    let result = check_program(vec![first, second]).unwrap();
    assert!(!result.has_errors(), "{:?}", messages(&result));
    assert_eq!(result.order, vec!["geo"]);
}

#[test]
fn anonymous_modules_form_the_main_package() {
    let b = Builder::new();
    let result = check_program(vec![b.module(vec![area(&b)])]).unwrap();
    assert_eq!(result.order, vec!["main"]);
}

// ── Imports ────────────────────────────────────────────────────────────

#[test]
fn unknown_package() {
    let b = Builder::new();
    let app = b.module_in("app", "src/app/main.lm", vec![b.import("nowhere", vec![])], vec![]);
    let result = check_program(vec![app]).unwrap();
    assert_has_diagnostic(&result, "unknown package 'nowhere'");

    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.package, "app");
    assert_eq!(diagnostic.files, vec!["src/app/main.lm"]);
    let hint = diagnostic.source.as_ref().unwrap();
    assert_eq!(hint.path, "src/app/main.lm");
    assert_eq!(hint.line, 1);
}

#[test]
fn private_symbol_is_not_importable() {
    let b = Builder::new();
    let app = b.module_in(
        "app",
        "src/app/main.lm",
        vec![b.import("geo", vec![("helper", None)])],
        vec![],
    );
    let result = check_program(vec![geo(&b), app]).unwrap();
    assert_has_diagnostic(&result, "package 'geo' symbol 'helper' is private");
}

#[test]
fn missing_symbol() {
    let b = Builder::new();
    let app = b.module_in(
        "app",
        "src/app/main.lm",
        vec![b.import("geo", vec![("volume", None)])],
        vec![],
    );
    let result = check_program(vec![geo(&b), app]).unwrap();
    assert_has_diagnostic(&result, "package 'geo' has no symbol 'volume'");
}

#[test]
fn package_import_binds_a_namespace() {
    let b = Builder::new();
    let call = b.call(b.member(b.var("geo"), "area"), vec![b.int(1), b.int(2)]);
    let id = call.id;
    let app = b.module_in("app", "src/app/main.lm", vec![b.import("geo", vec![])], vec![b.expr_stmt(call)]);
    let modules = vec![geo(&b), app];
    let result = check_program(modules.clone()).unwrap();
    assert!(!result.has_errors(), "{:?}", messages(&result));

    let geo_exports = result.exports["geo"].clone();
    let options = CheckOptions {
        packages: vec![geo_exports],
        ..Default::default()
    };
    let checked = check_module(Some(&modules[1]), &options).unwrap();
    assert_eq!(checked.type_of(id).map(ToString::to_string).as_deref(), Some("i32"));
}

#[test]
fn private_package_only_within_its_root() {
    let b = Builder::new();
    let mut internal = b.module_in("geo.internal", "src/geo/internal.lm", vec![], vec![area(&b)]);
    if let Some(package) = internal.package.as_mut() {
        package.private = true;
    }
    let sibling = b.module_in(
        "geo.shapes",
        "src/geo/shapes.lm",
        vec![b.import("geo.internal", vec![("area", None)])],
        vec![],
    );
    let outsider = b.module_in(
        "app",
        "src/app/main.lm",
        vec![b.import("geo.internal", vec![("area", None)])],
        vec![],
    );
    let result = check_program(vec![internal, sibling, outsider]).unwrap();
    let messages = messages(&result);
    assert_eq!(messages.len(), 1, "{messages:?}");
    assert!(messages[0].contains("package 'geo.internal' is private"));
    assert_eq!(result.diagnostics[0].package, "app");
}

#[test]
fn aliased_type_import_keeps_type_qualified_methods() {
    let b = Builder::new();
    let point = b.item(b.struct_def("Point", vec![], vec![("x", b.ty("i32")), ("y", b.ty("i32"))]));
    let origin = b.function_def(
        "origin",
        vec![],
        Some(b.ty("Point")),
        vec![b.expr_stmt(b.struct_lit("Point", vec![("x", b.int(0)), ("y", b.int(0))]))],
    );
    let methods = b.item(b.methods_def(b.ty("Point"), vec![origin]));
    let geo = b.module_in("geo", "src/geo/point.lm", vec![], vec![point, methods]);

    let call = b.call(b.member(b.var("P"), "origin"), vec![]);
    let id = call.id;
    let app = b.module_in(
        "app",
        "src/app/main.lm",
        vec![b.import("geo", vec![("Point", Some("P"))])],
        vec![b.expr_stmt(call)],
    );
    let modules = vec![geo, app];
    let result = check_program(modules.clone()).unwrap();
    assert!(!result.has_errors(), "{:?}", messages(&result));

    let options = CheckOptions {
        packages: vec![result.exports["geo"].clone()],
        ..Default::default()
    };
    let checked = check_module(Some(&modules[1]), &options).unwrap();
    assert_eq!(checked.type_of(id).map(ToString::to_string).as_deref(), Some("Point"));
}

// ── Summaries ──────────────────────────────────────────────────────────

#[test]
fn summaries_list_public_and_private_symbols() {
    let b = Builder::new();
    let result = check_program(vec![geo(&b)]).unwrap();
    let summary = &result.summaries[0];
    assert_eq!(summary.package, "geo");
    assert_eq!(summary.visibility, Visibility::Public);
    assert_eq!(summary.symbols["area"], "fn(i32, i32) -> i32");
    assert_eq!(summary.private_symbols, vec!["helper"]);
    assert_eq!(summary.functions["area"].signature, "fn(i32, i32) -> i32");

    let json = serde_json::to_value(summary).unwrap();
    assert_eq!(json["visibility"], "public");
}

// ── Fatal errors ───────────────────────────────────────────────────────

#[test]
fn missing_module_is_fatal() {
    let err = check_module(None, &CheckOptions::default()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"typechecker: module is nil");
}
