//! Joins feeding later operators

mod common;

use common::{employees, ints, parallel_scope, scope, strings};
use tabview_ast::{
    ComparisonOperator, Expression, JoinCondition, JoinDirection, JoinSpec, OrderItem, SelectField,
};
use tabview_executor::View;
use tabview_types::Value;

fn departments() -> View {
    View::from_values(
        "departments",
        &["dept", "floor"],
        vec![
            vec![Value::string("eng"), Value::Integer(3)],
            vec![Value::string("ops"), Value::Integer(1)],
            vec![Value::string("hr"), Value::Integer(2)],
        ],
    )
}

fn on_dept() -> JoinCondition {
    JoinCondition::On(Expression::comparison(
        ComparisonOperator::Equal,
        Expression::qualified("employees", "dept"),
        Expression::qualified("departments", "dept"),
    ))
}

#[test]
fn test_inner_join_then_select() {
    let scope = scope();
    let mut view = employees();
    view.join(&scope, departments(), &JoinSpec::inner(on_dept())).unwrap();
    view.order_by(&scope, &[OrderItem::new(Expression::field("id"))]).unwrap();
    view.select(
        &scope,
        &[SelectField::new(Expression::field("name")), SelectField::new(Expression::field("floor"))],
        false,
    )
    .unwrap();
    view.fix();

    assert_eq!(view.column(0), strings(&["alice", "bob", "carol", "dave", "erin"]));
    assert_eq!(view.column(1), ints(&[3, 3, 1, 3, 1]));
}

#[test]
fn test_left_join_pads_unmatched() {
    let scope = scope();
    let mut view = employees();
    view.join(&scope, departments(), &JoinSpec::outer(JoinDirection::Left, on_dept())).unwrap();
    assert_eq!(view.len(), 6);
    let frank = view.records().iter().find(|r| r.value(1) == &Value::string("frank")).unwrap();
    assert_eq!(frank.value(5), &Value::Null);
}

#[test]
fn test_full_join_keeps_both_sides() {
    let scope = scope();
    let mut view = employees();
    view.join(&scope, departments(), &JoinSpec::outer(JoinDirection::Full, on_dept())).unwrap();
    // five matches, frank without a department, hr without employees
    assert_eq!(view.len(), 7);
}

#[test]
fn test_using_join_groups_on_coalesced_column() {
    let scope = scope();
    let mut view = employees();
    view.join(&scope, departments(), &JoinSpec::inner(JoinCondition::Using(vec!["dept".into()]))).unwrap();
    assert_eq!(view.header().column_names()[0], "dept");

    view.group_by(&scope, &[Expression::field("dept")]).unwrap();
    let count = Expression::count_all();
    view.select(&scope, &[SelectField::new(Expression::field("dept")), SelectField::new(count)], false).unwrap();
    view.fix();
    assert_eq!(
        view.values(),
        vec![vec![Value::string("eng"), Value::Integer(3)], vec![Value::string("ops"), Value::Integer(2)]]
    );
}

#[test]
fn test_parallel_join_matches_serial() {
    let left = View::from_values("l", &["k"], (0..300).map(|i| vec![Value::Integer(i % 17)]).collect());
    let right = View::from_values("r", &["k2"], (0..40).map(|i| vec![Value::Integer(i)]).collect());
    let condition = JoinCondition::On(Expression::comparison(
        ComparisonOperator::Equal,
        Expression::field("k"),
        Expression::field("k2"),
    ));

    let mut serial = left.copy();
    serial.join(&scope(), right.copy(), &JoinSpec::inner(condition.clone())).unwrap();
    let mut parallel = left.copy();
    parallel.join(&parallel_scope(), right, &JoinSpec::inner(condition)).unwrap();

    assert_eq!(serial.len(), 300);
    assert_eq!(serial.values(), parallel.values());
}
