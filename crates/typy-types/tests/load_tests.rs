//! JSON handoff tests: decoding, validation and the inverse encoding.

use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use typy_types::ast::{ExprKind, Item, Stmt, TypeKind};
use typy_types::build::*;
use typy_types::{load_module_json, module_to_json, LoadError, Span};

#[test]
fn minimal_module_without_spans() {
    let json = r#"{"items": [
        {"stmt": {"expr": {"expr": {"kind": {"call": {
            "name": {"name": "print"},
            "args": [{"kind": {"str_lit": "hi"}}]
        }}}}}}
    ]}"#;
    let m = load_module_json(json).unwrap();
    assert_eq!(m, module(vec![print(string("hi")).into()]));
    assert!(m.span.is_synthetic());
}

#[test]
fn spans_are_kept_when_present() {
    let json = r#"{"items": [
        {"stmt": {"pass": {"span": {"start_line": 7, "start_col": 3, "end_line": 7, "end_col": 7}}}}
    ]}"#;
    let m = load_module_json(json).unwrap();
    let stmt = m.statements().next().unwrap();
    assert_eq!(stmt.span(), Span::new(7, 3, 7, 7));
}

#[test]
fn class_and_slice_shapes() {
    let json = r#"{"items": [
        {"class": {
            "name": {"name": "Vector"},
            "fields": [{
                "name": {"name": "head"},
                "type_ann": {"kind": {"class": "Vector"}},
                "default": {"kind": "none_lit"}
            }],
            "methods": []
        }},
        {"stmt": {"expr": {"expr": {"kind": {"slice": {
            "object": {"kind": {"identifier": "s"}},
            "step": {"kind": {"int_lit": 2}}
        }}}}}}
    ]}"#;
    let m = load_module_json(json).unwrap();
    let class = m.classes().next().unwrap();
    assert_eq!(class.fields[0].type_ann.kind, TypeKind::Class("Vector".into()));
    let Some(Stmt::Expr(stmt)) = m.statements().next() else {
        panic!("expected expression statement");
    };
    match &stmt.expr.kind {
        ExprKind::Slice { start, stop, step, .. } => {
            assert!(start.is_none() && stop.is_none());
            assert_eq!(step.as_deref(), Some(&int(2)));
        }
        other => panic!("expected slice, got {other:?}"),
    }
}

#[test]
fn integer_literals_accept_numbers_and_decimal_strings() {
    let json = r#"{"items": [
        {"stmt": {"expr": {"expr": {"kind": {"int_lit": -7}}}}},
        {"stmt": {"expr": {"expr": {"kind": {"int_lit": "123456789012345678901234567890"}}}}}
    ]}"#;
    let m = load_module_json(json).unwrap();
    let literals: Vec<_> = m
        .statements()
        .map(|stmt| match stmt {
            Stmt::Expr(e) => e.expr.clone(),
            other => panic!("expected expression statement, got {other:?}"),
        })
        .collect();
    let big: BigInt = "123456789012345678901234567890".parse().unwrap();
    assert_eq!(literals, vec![int(-7), big_int(big)]);

    // wide literals are written back as strings, narrow ones as numbers
    let text = module_to_json(&m).unwrap();
    assert!(text.contains(r#""int_lit":-7"#));
    assert!(text.contains(r#""int_lit":"123456789012345678901234567890""#));
    assert_eq!(load_module_json(&text).unwrap(), m);
}

#[test]
fn bad_integer_literal_is_a_json_error() {
    let err = load_module_json(
        r#"{"items": [{"stmt": {"expr": {"expr": {"kind": {"int_lit": "12x"}}}}}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::Json(_)));
}

#[test]
fn malformed_json_is_a_json_error() {
    let err = load_module_json(r#"{"items": [{"stmt": {"loop": {}}}]}"#).unwrap_err();
    assert!(matches!(err, LoadError::Json(_)));
    assert!(err.to_string().starts_with("malformed module JSON"));
}

#[test]
fn duplicate_fields_are_rejected() {
    let m = module(vec![class(
        "P",
        vec![
            field_decl("x", TypeKind::Int, int(0)),
            field_decl("x", TypeKind::Int, int(1)),
        ],
        vec![],
    )
    .into()]);
    let json = module_to_json(&m).unwrap();
    let err = load_module_json(&json).unwrap_err();
    assert!(matches!(err, LoadError::Invalid(_)));
}

#[test]
fn methods_need_self() {
    let m = module(vec![class(
        "P",
        vec![],
        vec![function("bad", vec![], None, vec![pass()])],
    )
    .into()]);
    let err = load_module_json(&module_to_json(&m).unwrap()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid module: method 'P.bad' must take 'self' as its first parameter"
    );
}

#[test]
fn duplicate_parameters_are_rejected() {
    let m = module(vec![function(
        "f",
        vec![param("a", TypeKind::Int), param("a", TypeKind::Str)],
        None,
        vec![pass()],
    )
    .into()]);
    let err = load_module_json(&module_to_json(&m).unwrap()).unwrap_err();
    assert!(err.to_string().contains("duplicate parameter 'a' in 'f'"));
}

#[test]
fn built_module_survives_encoding() {
    let m = module(vec![
        function(
            "greet",
            vec![param("who", TypeKind::Str)],
            None,
            vec![print(add(string("hi "), var("who")))],
        )
        .into(),
        Item::Stmt(expr_stmt(call("greet", vec![string("there")]))),
        if_chain(
            lt(int(1), int(2)),
            vec![pass()],
            vec![(boolean(false), vec![ret_none()])],
            Some(vec![for_in("c", string("ab"), vec![pass()])]),
        )
        .into(),
    ]);
    let back = load_module_json(&module_to_json(&m).unwrap()).unwrap();
    assert_eq!(back, m);
}
