use serde_json::{Value, json};

use form_schema::expr::{self, Expr, ExprError};
use form_schema::{Expression, Values, evaluate_computed, evaluate_visibility};

fn ctx(value: Value) -> Values {
    value.as_object().cloned().expect("object context")
}

#[test]
fn age_gate_is_visible_and_fails_open() {
    let values = ctx(json!({"age": 20}));
    assert!(evaluate_visibility(Some("age >= 18"), &values));
    assert!(evaluate_visibility(Some("age >="), &values));
    assert_eq!(evaluate_computed(Some("age >="), &values), None);
}

#[test]
fn legacy_spellings_read_the_same_slot() {
    let values = ctx(json!({"country": "NL"}));
    for source in [
        "country == 'NL'",
        "values.country == 'NL'",
        "values['country'] === \"NL\"",
        "get(\"country\") == 'NL'",
    ] {
        assert!(evaluate_visibility(Some(source), &values), "{source}");
    }
}

#[test]
fn nothing_outside_the_context_is_reachable() {
    let values = ctx(json!({"x": 1}));
    for source in [
        "process.exit(1)",
        "alert('hi')",
        "x.constructor",
        "values",
        "x; y",
        "`template`",
        "x = 2",
    ] {
        assert!(expr::check(source).is_err(), "{source} should not parse");
        assert!(evaluate_visibility(Some(source), &values));
        assert_eq!(evaluate_computed(Some(source), &values), None);
    }
}

#[test]
fn computed_values_cover_arithmetic_and_concat() {
    let values = ctx(json!({
        "first": "Ada",
        "last": "Lovelace",
        "price": "19.5",
        "qty": 2,
        "member": true
    }));
    assert_eq!(
        evaluate_computed(Some("first + ' ' + last"), &values),
        Some(json!("Ada Lovelace"))
    );
    assert_eq!(evaluate_computed(Some("price * qty"), &values), Some(json!(39)));
    assert_eq!(
        evaluate_computed(Some("member ? price * 0.5 : price"), &values),
        Some(json!(9.75))
    );
    assert_eq!(
        evaluate_computed(Some("'Total: ' + qty * 3"), &values),
        Some(json!("Total: 6"))
    );
    assert_eq!(evaluate_computed(Some("nickname || first"), &values), Some(json!("Ada")));
}

#[test]
fn input_context_is_left_untouched() {
    let values = ctx(json!({"a": 1}));
    let copy = values.clone();
    let _ = evaluate_computed(Some("a + 1"), &values);
    assert_eq!(values, copy);
}

#[test]
fn expression_exposes_its_tree() {
    let expr = Expression::parse("'Hi ' + name + '!'").unwrap();
    assert!(matches!(expr.ast(), Expr::Concat(parts) if parts.len() == 3));
    assert_eq!(expr.field_refs().into_iter().collect::<Vec<_>>(), ["name"]);
    let out = expr.evaluate(&ctx(json!({"name": "Ava"}))).unwrap();
    assert_eq!(out, json!("Hi Ava!"));
}

#[test]
fn pathological_input_is_rejected_quickly() {
    let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    assert!(matches!(expr::check(&nested), Err(ExprError::TooDeep { .. })));
    let long = vec!["x"; 2000].join(" + ");
    assert!(matches!(expr::check(&long), Err(ExprError::TooLong { .. })));
    assert!(evaluate_visibility(Some(&long), &Values::new()));
}
