//! Aggregate calls over grouped records
//!
//! The innermost record of the scope must belong to a grouped view. The first
//! argument is evaluated once per group member; remaining arguments are
//! evaluated once for the group.

use tabview_ast::Expression;
use tabview_types::{to_string, Value};

use crate::{
    errors::{ExecutorError, Result},
    functions::{distinct_values, AggregateFunction, UserDefinedFunction},
    scope::ReferenceScope,
};

pub(super) fn builtin_aggregate(
    scope: &ReferenceScope<'_>,
    expr: &Expression,
    name: &str,
    distinct: bool,
    args: &[Expression],
) -> Result<Value> {
    let Some(function) = AggregateFunction::from_name(name) else {
        return match scope.get_function(name) {
            Some(udf) if udf.is_aggregate() => user_aggregate(scope, expr, &udf, args),
            _ => Err(ExecutorError::FunctionNotExist(name.to_uppercase())),
        };
    };
    function.arity().check(name, args.len())?;
    let group_len = grouped_length(scope, expr, name, args)?;

    if function == AggregateFunction::Count && args[0].is_wildcard() {
        return Ok(Value::Integer(group_len as i64));
    }

    let mut list = collect_members(scope, &args[0], group_len)?;
    if distinct {
        list = distinct_values(list, scope.config());
    }

    let separator = match args.get(1) {
        Some(arg) => to_string(&scope.evaluate(arg)?).unwrap_or_default(),
        None => String::new(),
    };
    Ok(function.apply(&list, &separator, scope.config()))
}

pub(super) fn user_aggregate(
    scope: &ReferenceScope<'_>,
    expr: &Expression,
    function: &UserDefinedFunction,
    args: &[Expression],
) -> Result<Value> {
    function.arity().check(function.name(), args.len())?;
    let Some((first, rest)) = args.split_first() else {
        return function.call_aggregate(&[], &[]);
    };
    let group_len = grouped_length(scope, expr, function.name(), args)?;
    let list = collect_members(scope, first, group_len)?;
    let rest = rest.iter().map(|a| scope.evaluate(a)).collect::<Result<Vec<_>>>()?;
    function.call_aggregate(&list, &rest)
}

/// Member count of the innermost grouped record.
fn grouped_length(scope: &ReferenceScope<'_>, expr: &Expression, name: &str, args: &[Expression]) -> Result<usize> {
    let record = match scope.records().first() {
        Some(record) if record.view.is_grouped() => record,
        _ => return Err(ExecutorError::NotGroupingRecords(name.to_uppercase())),
    };
    if args.iter().any(|a| a.has_aggregate(&|n| scope.is_user_aggregate(n))) {
        return Err(ExecutorError::NestedAggregateFunctions(expr.to_string()));
    }
    Ok(record.view.records().get(record.index).map_or(0, |r| r.group_len()))
}

fn collect_members(scope: &ReferenceScope<'_>, arg: &Expression, group_len: usize) -> Result<Vec<Value>> {
    if arg.is_wildcard() {
        return Err(ExecutorError::InvalidValueExpression(arg.to_string()));
    }
    (0..group_len).map(|m| scope.with_member(m).evaluate(arg)).collect()
}
