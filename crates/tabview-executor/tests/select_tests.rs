//! End-to-end SELECT pipelines over a single view

mod common;

use common::{employees, ints, scope, strings};
use tabview_ast::{ArithmeticOperator, ComparisonOperator, Expression, LimitClause, OrderItem, SelectField};
use tabview_executor::{ExecutorError, View};
use tabview_types::{Ternary, Value};

fn field(name: &str) -> Expression {
    Expression::field(name)
}

#[test]
fn test_where_group_having_select_order() {
    // SELECT dept, SUM(salary) AS total FROM employees WHERE id > 1
    // GROUP BY dept HAVING COUNT(*) > 1 ORDER BY total DESC
    let scope = scope();
    let mut view = employees();
    view.where_clause(&scope, &Expression::comparison(ComparisonOperator::GreaterThan, field("id"), Expression::literal(1i64)))
        .unwrap();
    view.group_by(&scope, &[field("dept")]).unwrap();
    view.having(
        &scope,
        &Expression::comparison(ComparisonOperator::GreaterThan, Expression::count_all(), Expression::literal(1i64)),
    )
    .unwrap();
    let total = Expression::aggregate("sum", vec![field("salary")]);
    view.select(&scope, &[SelectField::new(field("dept")), SelectField::aliased(total, "total")], false).unwrap();
    view.order_by(&scope, &[OrderItem::desc(field("total"))]).unwrap();
    view.fix();

    assert_eq!(view.header().column_names(), vec!["dept", "total"]);
    assert_eq!(
        view.values(),
        vec![vec![Value::string("eng"), Value::Integer(200)], vec![Value::string("ops"), Value::Integer(160)]]
    );
}

#[test]
fn test_where_keeps_only_true_rows_in_order() {
    let scope = scope();
    let rows: Vec<Vec<Value>> = (0..2000)
        .map(|i| vec![Value::Integer(i), if i % 3 == 0 { Value::Null } else { Value::Integer(i % 5) }])
        .collect();
    let mut view = View::from_values("t", &["id", "v"], rows);
    view.where_clause(&scope, &Expression::comparison(ComparisonOperator::LessThan, field("v"), Expression::literal(2i64)))
        .unwrap();

    let ids: Vec<i64> = view.column(0).iter().filter_map(tabview_types::to_integer).collect();
    let expected: Vec<i64> = (0..2000).filter(|i| i % 3 != 0 && i % 5 < 2).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_group_all_keeps_every_value_in_order() {
    let scope = scope();
    let mut view = employees();
    view.group_by(&scope, &[]).unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view.field_len(), 4);
    let names = view.records()[0].cell(1).unwrap().values().to_vec();
    assert_eq!(names, strings(&["alice", "bob", "carol", "dave", "erin", "frank"]));
}

#[test]
fn test_non_key_column_in_grouped_view() {
    let scope = scope();
    let mut view = employees();
    view.group_by(&scope, &[field("dept")]).unwrap();
    let err = view.select(&scope, &[SelectField::new(field("name"))], false).unwrap_err();
    assert_eq!(err, ExecutorError::FieldNotGroupKey("name".into()));
}

#[test]
fn test_non_key_column_beside_implicit_aggregate() {
    // SELECT name, COUNT(*) FROM employees
    let scope = scope();
    let mut view = employees();
    let err = view
        .select(&scope, &[SelectField::new(field("name")), SelectField::new(Expression::count_all())], false)
        .unwrap_err();
    assert_eq!(err, ExecutorError::FieldNotGroupKey("name".into()));
}

#[test]
fn test_order_by_non_key_column_in_grouped_view() {
    let scope = scope();
    let mut view = employees();
    view.group_by(&scope, &[field("dept")]).unwrap();
    let err = view.order_by(&scope, &[OrderItem::new(field("name"))]).unwrap_err();
    assert_eq!(err, ExecutorError::FieldNotGroupKey("name".into()));

    view.order_by(&scope, &[OrderItem::desc(field("dept"))]).unwrap();
    assert_eq!(view.column(2), strings(&["sales", "ops", "eng"]));
}

#[test]
fn test_count_over_empty_input() {
    let scope = scope();
    let mut view = employees();
    view.where_clause(&scope, &Expression::literal(Value::Ternary(Ternary::False))).unwrap();
    view.select(&scope, &[SelectField::new(Expression::count_all())], false).unwrap();
    view.fix();
    assert_eq!(view.values(), vec![vec![Value::Integer(0)]]);
}

#[test]
fn test_distinct_then_order_offset_limit() {
    let scope = scope();
    let mut view = employees();
    view.select(&scope, &[SelectField::new(field("salary"))], true).unwrap();
    view.order_by(&scope, &[OrderItem::new(field("salary"))]).unwrap();
    view.offset(&scope, &Expression::literal(1i64)).unwrap();
    view.limit(&scope, &LimitClause::rows(Expression::literal(2i64))).unwrap();
    view.fix();
    assert_eq!(view.column(0), ints(&[80, 90]));
}

#[test]
fn test_limit_with_ties() {
    let scope = scope();
    for (n, expected) in [(3i64, 4usize), (2, 2), (1, 2)] {
        let mut view = common::int_view("t", &[2, 1, 3, 2, 1]);
        view.order_by(&scope, &[OrderItem::new(field("n"))]).unwrap();
        view.limit(&scope, &LimitClause::rows(Expression::literal(n)).with_ties()).unwrap();
        assert_eq!(view.len(), expected, "LIMIT {} WITH TIES", n);
    }
}

#[test]
fn test_limit_percent() {
    let scope = scope();
    let mut view = employees();
    view.order_by(&scope, &[OrderItem::new(field("id"))]).unwrap();
    view.limit(&scope, &LimitClause::percent(Expression::literal(50.0))).unwrap();
    view.fix();
    assert_eq!(view.column(0), ints(&[1, 2, 3]));
}

#[test]
fn test_integer_division_by_zero() {
    let scope = scope();
    let mut view = employees();
    let expr = Expression::arithmetic(ArithmeticOperator::Divide, field("salary"), Expression::literal(0i64));
    let err = view.select(&scope, &[SelectField::new(expr)], false).unwrap_err();
    assert_eq!(err, ExecutorError::IntegerDividedByZero);
}

#[test]
fn test_copy_shares_cells_and_leaves_original() {
    let scope = scope();
    let original = employees();
    let mut copy = original.copy();
    copy.where_clause(&scope, &Expression::comparison(ComparisonOperator::Equal, field("dept"), Expression::literal("ops")))
        .unwrap();
    copy.replace_value(0, 3, Value::Integer(1));

    assert_eq!(copy.len(), 2);
    assert_eq!(original.len(), 6);
    assert_eq!(original.column(3)[2], Value::Integer(90));
}
