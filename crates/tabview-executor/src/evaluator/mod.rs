//! Expression evaluation
//!
//! Operators never interpret expressions themselves; they hand them to the
//! [`Evaluator`] stored in the [`ReferenceScope`]. [`BasicEvaluator`] covers
//! the expression tree of this crate. Embedding programs with a richer
//! language supply their own implementation and may delegate to the basic one.

mod aggregate;
mod operators;

use tabview_ast::{Expression, LogicOperator};
use tabview_types::{to_ternary, Ternary, Value};

use crate::{
    errors::{ExecutorError, Result},
    scope::ReferenceScope,
};

pub use operators::{arithmetic, compare_values};

/// Evaluates one expression against the records of a scope.
///
/// Implementations are shared by every worker of an operator.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, scope: &ReferenceScope<'_>, expr: &Expression) -> Result<Value>;
}

/// Evaluator for the built-in expression tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEvaluator;

impl Evaluator for BasicEvaluator {
    fn evaluate(&self, scope: &ReferenceScope<'_>, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Literal(value) => return Ok(value.clone()),
            Expression::FieldReference { .. } | Expression::ColumnNumber { .. } => {
                return field_value(scope, expr)
            }
            _ => {}
        }

        // Computed columns (group keys, aggregates, window results) are read
        // back instead of being evaluated again.
        if let Some(value) = materialized(scope, expr) {
            return Ok(value);
        }

        match expr {
            Expression::Comparison { op, left, right } => {
                operators::comparison(scope, *op, left, right).map(Value::Ternary)
            }
            Expression::Arithmetic { op, left, right } => {
                let l = scope.evaluate(left)?;
                let r = scope.evaluate(right)?;
                arithmetic(*op, &l, &r)
            }
            Expression::Logic { op, left, right } => {
                let l = to_ternary(&scope.evaluate(left)?);
                let result = match (op, l) {
                    (LogicOperator::And, Ternary::False) => Ternary::False,
                    (LogicOperator::Or, Ternary::True) => Ternary::True,
                    (LogicOperator::And, l) => l.and(to_ternary(&scope.evaluate(right)?)),
                    (LogicOperator::Or, l) => l.or(to_ternary(&scope.evaluate(right)?)),
                };
                Ok(Value::Ternary(result))
            }
            Expression::Not(inner) => Ok(Value::Ternary(to_ternary(&scope.evaluate(inner)?).not())),
            Expression::IsNull { expr, negated } => {
                let is_null = scope.evaluate(expr)?.is_null();
                Ok(Value::Ternary(Ternary::from(is_null != *negated)))
            }
            Expression::InList { expr, list, negated } => {
                let found = operators::in_list(scope, expr, list)?;
                Ok(Value::Ternary(if *negated { found.not() } else { found }))
            }
            Expression::Function { name, args } => {
                let Some(function) = scope.get_function(name) else {
                    return Err(ExecutorError::FunctionNotExist(name.to_uppercase()));
                };
                if function.is_aggregate() {
                    return aggregate::user_aggregate(scope, expr, &function, args);
                }
                let values = args.iter().map(|a| scope.evaluate(a)).collect::<Result<Vec<_>>>()?;
                function.call(&values)
            }
            Expression::AggregateFunction { name, distinct, args } => {
                aggregate::builtin_aggregate(scope, expr, name, *distinct, args)
            }
            Expression::AnalyticFunction(func) => {
                Err(ExecutorError::NotAllowedAnalyticFunction(func.name.to_uppercase()))
            }
            Expression::AllColumns { .. }
            | Expression::RowValue(_)
            | Expression::Literal(_)
            | Expression::FieldReference { .. }
            | Expression::ColumnNumber { .. } => {
                Err(ExecutorError::InvalidValueExpression(expr.to_string()))
            }
        }
    }
}

/// Resolve a column reference through the record chain, innermost first.
///
/// A name missing from one record's view is looked up in the next; an
/// ambiguous name stops the search.
fn field_value(scope: &ReferenceScope<'_>, expr: &Expression) -> Result<Value> {
    for record in scope.records() {
        let header = record.view.header();
        match header.search(expr) {
            Ok(idx) => {
                if record.view.is_grouped() && record.member.is_none() {
                    if let Some(field) = header.get(idx) {
                        if field.is_from_table && !field.is_group_key {
                            return Err(ExecutorError::FieldNotGroupKey(expr.to_string()));
                        }
                    }
                }
                return Ok(record.value(idx).clone());
            }
            Err(ExecutorError::FieldNotExist(_)) => continue,
            Err(err) => return Err(err),
        }
    }
    Err(ExecutorError::FieldNotExist(expr.to_string()))
}

fn materialized(scope: &ReferenceScope<'_>, expr: &Expression) -> Option<Value> {
    scope.records().iter().find_map(|record| {
        record.view.header().contains_object(expr).map(|idx| record.value(idx).clone())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabview_ast::{ArithmeticOperator, ComparisonOperator};

    use super::*;
    use crate::{config::ExecutorConfig, functions::Arity, functions::UserDefinedFunction, view::View};

    fn scope() -> ReferenceScope<'static> {
        ReferenceScope::new(ExecutorConfig::default(), Arc::new(BasicEvaluator))
    }

    fn people() -> View {
        View::from_values(
            "p",
            &["name", "age"],
            vec![
                vec![Value::string("ann"), Value::Integer(30)],
                vec![Value::string("bob"), Value::Null],
            ],
        )
    }

    #[test]
    fn test_field_and_arithmetic() {
        let view = people();
        let root = scope();
        let row = root.with_record(&view, 0);
        let expr = Expression::arithmetic(
            ArithmeticOperator::Plus,
            Expression::field("age"),
            Expression::literal(1i64),
        );
        assert_eq!(row.evaluate(&expr).unwrap(), Value::Integer(31));
        assert_eq!(row.evaluate(&Expression::qualified("p", "NAME")).unwrap(), Value::string("ann"));
    }

    #[test]
    fn test_null_comparison_is_unknown() {
        let view = people();
        let root = scope();
        let row = root.with_record(&view, 1);
        let expr = Expression::comparison(
            ComparisonOperator::GreaterThan,
            Expression::field("age"),
            Expression::literal(10i64),
        );
        assert_eq!(row.evaluate(&expr).unwrap(), Value::Ternary(Ternary::Unknown));
    }

    #[test]
    fn test_short_circuit_logic() {
        let root = scope();
        // the right side would fail: no record in scope
        let expr = Expression::and(Expression::literal(false), Expression::field("missing"));
        assert_eq!(root.evaluate(&expr).unwrap(), Value::Ternary(Ternary::False));
        let expr = Expression::or(Expression::literal(false), Expression::field("missing"));
        assert!(matches!(root.evaluate(&expr), Err(ExecutorError::FieldNotExist(_))));
    }

    #[test]
    fn test_outer_record_lookup() {
        let outer = people();
        let inner = View::from_values("q", &["x"], vec![vec![Value::Integer(5)]]);
        let root = scope();
        let o = root.with_record(&outer, 0);
        let i = o.with_record(&inner, 0);
        assert_eq!(i.evaluate(&Expression::field("name")).unwrap(), Value::string("ann"));
        assert_eq!(i.evaluate(&Expression::field("x")).unwrap(), Value::Integer(5));
    }

    #[test]
    fn test_user_scalar_function() {
        let root = scope();
        root.declare_function(UserDefinedFunction::scalar("twice", Arity::exactly(1), |args| {
            arithmetic(ArithmeticOperator::Multiply, &args[0], &Value::Integer(2))
        }))
        .unwrap();
        let call = Expression::function("TWICE", vec![Expression::literal(21i64)]);
        assert_eq!(root.evaluate(&call).unwrap(), Value::Integer(42));
        assert_eq!(
            root.evaluate(&Expression::function("nope", vec![])).unwrap_err(),
            ExecutorError::FunctionNotExist("NOPE".into())
        );
    }

    #[test]
    fn test_aggregate_requires_grouping() {
        let view = people();
        let root = scope();
        let row = root.with_record(&view, 0);
        assert_eq!(
            row.evaluate(&Expression::count_all()).unwrap_err(),
            ExecutorError::NotGroupingRecords("COUNT".into())
        );
    }

    #[test]
    fn test_in_list_and_is_null() {
        let view = people();
        let root = scope();
        let row = root.with_record(&view, 1);
        let is_null = Expression::IsNull { expr: Box::new(Expression::field("age")), negated: false };
        assert_eq!(row.evaluate(&is_null).unwrap(), Value::Ternary(Ternary::True));

        let in_list = Expression::InList {
            expr: Box::new(Expression::field("name")),
            list: vec![Expression::literal("ann"), Expression::literal("BOB")],
            negated: false,
        };
        assert_eq!(row.evaluate(&in_list).unwrap(), Value::Ternary(Ternary::True));
    }
}
