mod frames;
mod lag_lead;

use std::sync::Arc;

use tabview_ast::{AnalyticClause, AnalyticFunction, Expression, OrderItem};
use tabview_types::Value;

use crate::{config::ExecutorConfig, evaluator::BasicEvaluator, scope::ReferenceScope, view::View};

fn scope() -> ReferenceScope<'static> {
    ReferenceScope::new(ExecutorConfig::default(), Arc::new(BasicEvaluator))
}

/// Columns `g` (partition) and `v` (value), in the given order.
fn make_view(rows: &[(&str, Option<i64>)]) -> View {
    View::from_values(
        "t",
        &["g", "v"],
        rows.iter()
            .map(|(g, v)| vec![Value::string(*g), v.map_or(Value::Null, Value::Integer)])
            .collect(),
    )
}

fn over_v(name: &str, args: Vec<Expression>) -> AnalyticFunction {
    AnalyticFunction::new(name, args, AnalyticClause::default().order_by(vec![OrderItem::new(Expression::field("v"))]))
}

/// Evaluate `function` and return (g, v, result) per record in view order.
fn run(view: &mut View, function: &AnalyticFunction) -> Vec<(Value, Value, Value)> {
    let idx = view.analyze(&scope(), function).unwrap();
    view.records().iter().map(|r| (r.value(0).clone(), r.value(1).clone(), r.value(idx).clone())).collect()
}

fn results(view: &mut View, function: &AnalyticFunction) -> Vec<Value> {
    run(view, function).into_iter().map(|(_, _, result)| result).collect()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Integer(*v)).collect()
}
