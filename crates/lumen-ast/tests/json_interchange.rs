//! The tree is exchanged with external parsers as JSON. These tests pin the
//! shapes a parser has to produce.

use lumen_ast::*;

/// A module built in Rust survives a trip through JSON unchanged.
#[test]
fn module_survives_json() {
    let b = Builder::new();
    let point = b.struct_def("Point", vec![], vec![("x", b.ty("i32")), ("y", b.ty("i32"))]);
    let body = vec![
        b.item(point),
        b.declare(
            "p",
            b.struct_lit("Point", vec![("x", b.int(1)), ("y", b.int(2))]),
        ),
        b.expr_stmt(b.binary(BinaryOp::FloorDiv, b.member(b.var("p"), "x"), b.int(2))),
    ];
    let module = b.module_in("geo", "geo/main.lm", vec![b.import("std.io", vec![])], body);

    let json = serde_json::to_string(&module).unwrap();
    let back: Module = serde_json::from_str(&json).unwrap();
    assert_eq!(back, module);
}

/// Operators use their source spelling on the wire.
#[test]
fn operators_serialize_as_symbols() {
    assert_eq!(serde_json::to_string(&BinaryOp::DivMod).unwrap(), "\"/%\"");
    assert_eq!(serde_json::to_string(&AssignOp::Declare).unwrap(), "\":=\"");
    let op: BinaryOp = serde_json::from_str("\"|>>\"").unwrap();
    assert_eq!(op, BinaryOp::PipeForward);
}

/// Spans and optional collections may be omitted by the producer.
#[test]
fn minimal_expression_json_parses() {
    let json = r#"{
        "id": 4,
        "kind": { "Literal": { "Integer": { "value": "512", "suffix": "u8" } } }
    }"#;
    let expr: Expr = serde_json::from_str(json).unwrap();
    assert_eq!(expr.id, NodeId(4));
    assert_eq!(
        expr.kind,
        ExprKind::Literal(Literal::Integer {
            value: "512".into(),
            suffix: Some(IntegerSuffix::U8),
        })
    );
    assert!(!expr.span.has_position());
}

/// Node origins are keyed by node id.
#[test]
fn origins_round_trip_with_numeric_keys() {
    let mut module = Module::default();
    module.origins.insert(NodeId(9), "lib/util.lm".into());
    let json = serde_json::to_string(&module).unwrap();
    assert!(json.contains("\"9\":\"lib/util.lm\""), "{json}");
    let back: Module = serde_json::from_str(&json).unwrap();
    assert_eq!(back.origin_of(NodeId(9)), Some("lib/util.lm"));
}
