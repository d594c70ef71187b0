//! Common test utilities for executor integration tests

use std::sync::Arc;

use tabview_executor::{BasicEvaluator, ExecutorConfig, ReferenceScope, View};
use tabview_types::Value;

/// Scope with the default configuration and the basic evaluator.
#[allow(dead_code)] // Test helper - available for all test modules
pub fn scope() -> ReferenceScope<'static> {
    scope_with(ExecutorConfig::default())
}

#[allow(dead_code)]
pub fn scope_with(config: ExecutorConfig) -> ReferenceScope<'static> {
    ReferenceScope::new(config, Arc::new(BasicEvaluator))
}

/// Scope that splits even small inputs over four workers.
#[allow(dead_code)]
pub fn parallel_scope() -> ReferenceScope<'static> {
    scope_with(ExecutorConfig { cpu: 4, min_units_per_worker: 1, ..ExecutorConfig::default() })
}

/// employees(id, name, dept, salary)
#[allow(dead_code)]
pub fn employees() -> View {
    let rows = [
        (1, "alice", "eng", 120),
        (2, "bob", "eng", 100),
        (3, "carol", "ops", 90),
        (4, "dave", "eng", 100),
        (5, "erin", "ops", 70),
        (6, "frank", "sales", 80),
    ];
    View::from_values(
        "employees",
        &["id", "name", "dept", "salary"],
        rows.iter()
            .map(|(id, name, dept, salary)| {
                vec![Value::Integer(*id), Value::string(*name), Value::string(*dept), Value::Integer(*salary)]
            })
            .collect(),
    )
}

/// Single-column view `name(n)` over integers.
#[allow(dead_code)]
pub fn int_view(name: &str, values: &[i64]) -> View {
    View::from_values(name, &["n"], values.iter().map(|v| vec![Value::Integer(*v)]).collect())
}

#[allow(dead_code)]
pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Integer(*v)).collect()
}

#[allow(dead_code)]
pub fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::string(*v)).collect()
}
