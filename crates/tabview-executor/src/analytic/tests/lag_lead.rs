use tabview_ast::{AnalyticClause, AnalyticFunction, Expression, OrderItem};
use tabview_types::Value;

use super::*;
use crate::{
    analytic::value::{first_value, lag, last_value, lead, nth_value},
    errors::ExecutorError,
};

fn values(items: &[Option<i64>]) -> Vec<Value> {
    items.iter().map(|v| v.map_or(Value::Null, Value::Integer)).collect()
}

// ===== LAG =====

#[test]
fn test_lag_default_offset() {
    let v = values(&[Some(10), Some(20), Some(30)]);
    assert_eq!(lag(&v, &[1, 1, 1], &[Value::Null, Value::Null, Value::Null], false), values(&[None, Some(10), Some(20)]));
}

#[test]
fn test_lag_offset_and_default() {
    let v = values(&[Some(10), Some(20), Some(30), Some(40)]);
    let defaults = vec![Value::Integer(0); 4];
    assert_eq!(lag(&v, &[2, 2, 2, 2], &defaults, false), values(&[Some(0), Some(0), Some(10), Some(20)]));
}

#[test]
fn test_lag_zero_offset_is_current_row() {
    let v = values(&[Some(1), None]);
    assert_eq!(lag(&v, &[0, 0], &[Value::Null, Value::Null], true), values(&[Some(1), None]));
}

#[test]
fn test_lag_ignore_nulls_scans_further_back() {
    let v = values(&[Some(1), None, None, Some(4)]);
    let defaults = vec![Value::Null; 4];
    assert_eq!(lag(&v, &[1; 4], &defaults, true), values(&[None, Some(1), Some(1), Some(1)]));
    assert_eq!(lag(&v, &[1; 4], &defaults, false), values(&[None, Some(1), None, None]));
}

// ===== LEAD =====

#[test]
fn test_lead_mirrors_lag() {
    let v = values(&[Some(10), Some(20), Some(30)]);
    let defaults = vec![Value::Integer(-1); 3];
    assert_eq!(lead(&v, &[1, 1, 1], &defaults, false), values(&[Some(20), Some(30), Some(-1)]));
}

#[test]
fn test_lead_leaves_input_untouched() {
    let v = values(&[Some(1), Some(2)]);
    let before = v.clone();
    lead(&v, &[1, 1], &[Value::Null, Value::Null], false);
    assert_eq!(v, before);
}

#[test]
fn test_lag_and_lead_over_view() {
    let mut view = make_view(&[("a", Some(30)), ("a", Some(10)), ("a", Some(20))]);
    let lag_fn = over_v("lag", vec![Expression::field("v")]);
    let lead_fn = over_v("lead", vec![Expression::field("v"), Expression::literal(1i64), Expression::literal(0i64)]);
    let scope = scope();
    let lag_idx = view.analyze(&scope, &lag_fn).unwrap();
    let lead_idx = view.analyze(&scope, &lead_fn).unwrap();
    assert_eq!(view.column(1), ints(&[10, 20, 30]));
    assert_eq!(view.column(lag_idx), values(&[None, Some(10), Some(20)]));
    assert_eq!(view.column(lead_idx), values(&[Some(20), Some(30), Some(0)]));
}

#[test]
fn test_negative_offset_is_rejected() {
    let mut view = make_view(&[("a", Some(1))]);
    let function = over_v("lag", vec![Expression::field("v"), Expression::literal(-1i64)]);
    assert!(matches!(
        view.analyze(&scope(), &function),
        Err(ExecutorError::FunctionInvalidArgument { .. })
    ));
}

// ===== FIRST_VALUE / LAST_VALUE / NTH_VALUE =====

#[test]
fn test_frame_values() {
    let v = values(&[None, Some(2), Some(3), None]);
    assert_eq!(first_value(&v, 0..4, false), Value::Null);
    assert_eq!(first_value(&v, 0..4, true), Value::Integer(2));
    assert_eq!(last_value(&v, 0..4, true), Value::Integer(3));
    assert_eq!(nth_value(&v, 0..4, 2, false), Value::Integer(2));
    assert_eq!(nth_value(&v, 0..4, 3, true), Value::Null);
    assert_eq!(first_value(&v, 2..2, false), Value::Null);
}

#[test]
fn test_last_value_default_frame_is_current_row() {
    let mut view = make_view(&[("a", Some(3)), ("a", Some(1)), ("a", Some(2))]);
    let function = over_v("last_value", vec![Expression::field("v")]);
    assert_eq!(results(&mut view, &function), ints(&[1, 2, 3]));
}

#[test]
fn test_first_value_ignore_nulls_over_view() {
    let mut view = make_view(&[("a", None), ("a", Some(5)), ("b", Some(7))]);
    let function = AnalyticFunction::new(
        "first_value",
        vec![Expression::field("v")],
        AnalyticClause::default().partition_by(vec![Expression::field("g")]),
    )
    .ignore_nulls();
    assert_eq!(results(&mut view, &function), ints(&[5, 5, 7]));
}

#[test]
fn test_nth_value_requires_positive_position() {
    let mut view = make_view(&[("a", Some(1))]);
    let function = AnalyticFunction::new(
        "nth_value",
        vec![Expression::field("v"), Expression::literal(0i64)],
        AnalyticClause::default().order_by(vec![OrderItem::new(Expression::field("v"))]),
    );
    let err = view.analyze(&scope(), &function).unwrap_err();
    assert_eq!(err.to_string(), "the second argument must be greater than 0 for function NTH_VALUE");
}
