use graphcalc_eval::{evaluate, EvaluationError};
use graphcalc_parser::parse;

#[test]
fn wrong_argument_count() {
    let tree = parse("1 + sin(x, 2)", "x").unwrap();
    let err = evaluate(&tree, "x", &[0.0]).unwrap_err();
    assert_eq!(err.expression, "sin(x, 2)");
    assert!(err.message.contains("expects 1"), "{err}");
}

#[test]
fn free_identifier_other_than_the_variable() {
    let tree = parse("2*t", "t").unwrap();
    let err = evaluate(&tree, "x", &[1.0]).unwrap_err();
    assert!(err.message.contains("free identifier 't'"), "{err}");
}

#[test]
fn equation_where_expression_is_needed() {
    let tree = parse("x^2 = 4", "x").unwrap();
    let err: EvaluationError = evaluate(&tree, "x", &[1.0]).unwrap_err();
    assert_eq!(err.expression, "x^2 = 4");
}

#[test]
fn empty_sample_set_is_fine() {
    let tree = parse("x", "x").unwrap();
    assert!(evaluate(&tree, "x", &[]).unwrap().is_empty());
}

#[test]
fn sample_values_serialize_with_a_kind_tag() {
    let tree = parse("1/x", "x").unwrap();
    let ys = evaluate(&tree, "x", &[0.0, 2.0]).unwrap();
    let json = serde_json::to_value(&ys).unwrap();
    assert_eq!(json[0]["kind"], "nonfinite");
    assert_eq!(json[0]["value"], "posinf");
    assert_eq!(json[1]["kind"], "real");
    assert_eq!(json[1]["value"], 0.5);
}
