//! Analytic (window) function engine
//!
//! [`View::analyze`] evaluates one analytic function call for every record
//! and appends the results as a computed column, which the evaluator then
//! reads like any other column.
//!
//! - `partition` - grouping records by PARTITION BY keys
//! - `frame` - ROWS frame boundaries
//! - `ranking` - ROW_NUMBER, RANK, DENSE_RANK, CUME_DIST, PERCENT_RANK, NTILE
//! - `value` - LAG, LEAD, FIRST_VALUE, LAST_VALUE, NTH_VALUE
//! - `aggregate` - aggregate and user-defined aggregate functions over frames
//!
//! With a window ORDER BY the view itself is sorted by the partition keys
//! followed by the order keys, so each partition lists its records in window
//! order. Partitions are evaluated in parallel, one work unit each.

mod aggregate;
mod frame;
mod partition;
mod ranking;
mod value;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tabview_ast::{AnalyticFunction, Expression, OrderItem};
use tabview_types::{to_integer, to_string, Value};

use self::{frame::frames, partition::partition_records};
use crate::{
    compare::SortValues,
    config::ExecutorConfig,
    errors::{ExecutorError, Result},
    functions::{builtin, AggregateFunction, AnalyticFunctionKind, BuiltinFunction, UserDefinedFunction},
    scope::ReferenceScope,
    task::TaskManager,
    view::{HeaderField, View},
};

#[derive(Clone)]
enum Resolved {
    Analytic(AnalyticFunctionKind),
    Aggregate(AggregateFunction),
    User(Arc<UserDefinedFunction>),
}

/// Everything one partition needs, indexed by record.
struct Call<'a> {
    function: &'a AnalyticFunction,
    resolved: Resolved,
    /// Argument values, `args[arg][record]`
    args: Vec<Vec<Value>>,
    /// Window ORDER BY keys
    order_keys: Vec<SortValues>,
    config: &'a ExecutorConfig,
}

impl View {
    /// Evaluate `function` over the view and append its result column.
    ///
    /// Returns the column index. A call already present in the header is not
    /// evaluated again.
    pub fn analyze(&mut self, scope: &ReferenceScope<'_>, function: &AnalyticFunction) -> Result<usize> {
        let expr = Expression::AnalyticFunction(Box::new(function.clone()));
        if let Some(idx) = self.header.contains_object(&expr) {
            return Ok(idx);
        }

        let resolved = resolve(scope, function)?;

        let nested = function.args.iter().chain(function.clause.partition_by.iter());
        for inner in nested.flat_map(|e| e.analytic_functions().into_iter().rev()).collect::<Vec<_>>() {
            self.analyze(scope, inner)?;
        }

        let mut partition_columns = Vec::with_capacity(function.clause.partition_by.len());
        for e in &function.clause.partition_by {
            partition_columns.push(self.eval_column(scope, e, None)?);
        }

        let ordered = !function.clause.order_by.is_empty();
        if ordered {
            let mut items: Vec<OrderItem> =
                function.clause.partition_by.iter().map(|e| OrderItem::new(e.clone())).collect();
            items.extend(function.clause.order_by.iter().cloned());
            self.order_by(scope, &items)?;
        }

        let args = self.argument_values(scope, function, &resolved)?;
        let partitions = partition_records(self.comparison_keys(scope, &partition_columns)?);

        let order_keys = if ordered {
            let skip = partition_columns.len();
            self.sort_values.iter().map(|sv| SortValues(sv.0.get(skip..).unwrap_or_default().to_vec())).collect()
        } else {
            vec![SortValues::default(); self.records.len()]
        };

        let call = Call { function, resolved, args, order_keys, config: scope.config() };

        let cap = if self.records.len() < scope.config().min_units_per_worker { 1 } else { scope.config().cpu };
        let tasks = TaskManager::new(partitions.len(), Some(1), cap, scope.cancellation().clone());
        let results = tasks.map(|p| {
            scope.cancellation().check()?;
            evaluate_partition(&call, &partitions[p].rows)
        })?;

        let mut column = vec![Value::Null; self.records.len()];
        for (partition, values) in partitions.iter().zip(results) {
            for (&row, value) in partition.rows.iter().zip(values) {
                column[row] = value;
            }
        }

        log::debug!(
            "analytic {}: {} partitions over {} records, {} workers",
            function.name.to_uppercase(),
            partitions.len(),
            self.records.len(),
            tasks.worker_count()
        );
        Ok(self.append_column(HeaderField::computed(&expr, None), column))
    }

    /// Every argument evaluated for every record. COUNT(*) counts each row.
    fn argument_values(
        &self,
        scope: &ReferenceScope<'_>,
        function: &AnalyticFunction,
        resolved: &Resolved,
    ) -> Result<Vec<Vec<Value>>> {
        let mut args = Vec::with_capacity(function.args.len());
        for (i, arg) in function.args.iter().enumerate() {
            let values = match resolved {
                Resolved::Aggregate(AggregateFunction::Count) if i == 0 && arg.is_wildcard() => {
                    vec![Value::Integer(1); self.records.len()]
                }
                _ => self.evaluate_rows(scope, arg)?,
            };
            args.push(values);
        }
        Ok(args)
    }
}

fn resolve(scope: &ReferenceScope<'_>, function: &AnalyticFunction) -> Result<Resolved> {
    let name = function.name.as_str();
    let count = function.args.len();
    match builtin(name) {
        Some(BuiltinFunction::Analytic(kind)) => {
            kind.arity().check(name, count)?;
            Ok(Resolved::Analytic(kind))
        }
        Some(BuiltinFunction::Aggregate(aggregate)) => {
            aggregate.arity().check(name, count)?;
            Ok(Resolved::Aggregate(aggregate))
        }
        None => match scope.get_function(name) {
            Some(udf) if udf.is_aggregate() => {
                udf.arity().check(name, count)?;
                Ok(Resolved::User(udf))
            }
            _ => Err(ExecutorError::FunctionNotExist(name.to_uppercase())),
        },
    }
}

fn evaluate_partition(call: &Call<'_>, rows: &[usize]) -> Result<Vec<Value>> {
    let name = call.function.name.as_str();
    let ignore_nulls = call.function.ignore_nulls;
    let argument = |arg: usize| -> Vec<Value> {
        match call.args.get(arg) {
            Some(values) => rows.iter().map(|&r| values[r].clone()).collect(),
            None => vec![Value::Null; rows.len()],
        }
    };
    let keys = || rows.iter().map(|&r| &call.order_keys[r]).collect::<Vec<_>>();
    let row_frames = || {
        let ordered = !call.function.clause.order_by.is_empty();
        frames(rows.len(), ordered, call.function.clause.frame.as_ref())
    };

    match &call.resolved {
        Resolved::Analytic(kind) => match kind {
            AnalyticFunctionKind::RowNumber => Ok(ranking::row_number(rows.len())),
            AnalyticFunctionKind::Rank => Ok(ranking::rank(&keys())),
            AnalyticFunctionKind::DenseRank => Ok(ranking::dense_rank(&keys())),
            AnalyticFunctionKind::CumeDist => Ok(ranking::cume_dist(&keys())),
            AnalyticFunctionKind::PercentRank => Ok(ranking::percent_rank(&keys())),
            AnalyticFunctionKind::Ntile => {
                let buckets = argument(0)
                    .first()
                    .and_then(to_integer)
                    .ok_or_else(|| ExecutorError::invalid_argument(name, "the first argument must be an integer"))?;
                ranking::ntile(rows.len(), buckets)
            }
            AnalyticFunctionKind::FirstValue => {
                let values = argument(0);
                Ok(row_frames().into_iter().map(|f| value::first_value(&values, f, ignore_nulls)).collect())
            }
            AnalyticFunctionKind::LastValue => {
                let values = argument(0);
                Ok(row_frames().into_iter().map(|f| value::last_value(&values, f, ignore_nulls)).collect())
            }
            AnalyticFunctionKind::NthValue => {
                let values = argument(0);
                let positions = argument(1);
                row_frames()
                    .into_iter()
                    .zip(&positions)
                    .map(|(f, n)| {
                        let n = to_integer(n)
                            .filter(|n| *n > 0)
                            .ok_or_else(|| {
                                ExecutorError::invalid_argument(name, "the second argument must be greater than 0")
                            })?;
                        Ok(value::nth_value(&values, f, n as usize, ignore_nulls))
                    })
                    .collect()
            }
            AnalyticFunctionKind::Lag | AnalyticFunctionKind::Lead => {
                let values = argument(0);
                let offsets = offsets(name, call.args.get(1).map(|_| argument(1)), rows.len())?;
                let defaults = argument(2);
                Ok(if *kind == AnalyticFunctionKind::Lag {
                    value::lag(&values, &offsets, &defaults, ignore_nulls)
                } else {
                    value::lead(&values, &offsets, &defaults, ignore_nulls)
                })
            }
        },
        Resolved::Aggregate(function) => {
            let separator = argument(1).first().and_then(to_string).unwrap_or_default();
            aggregate::aggregate_frames(
                *function,
                &argument(0),
                &row_frames(),
                call.function.distinct,
                &separator,
                call.config,
            )
        }
        Resolved::User(udf) => {
            let rest: Vec<Vec<Value>> = rows
                .iter()
                .map(|&r| call.args.iter().skip(1).map(|values| values[r].clone()).collect())
                .collect();
            aggregate::user_aggregate_frames(udf, &argument(0), &rest, &row_frames(), call.function.distinct, call.config)
        }
    }
}

/// LAG / LEAD offsets; 1 when omitted.
fn offsets(name: &str, values: Option<Vec<Value>>, len: usize) -> Result<Vec<usize>> {
    let Some(values) = values else {
        return Ok(vec![1; len]);
    };
    values
        .iter()
        .map(|v| {
            to_integer(v).and_then(|n| usize::try_from(n).ok()).ok_or_else(|| {
                ExecutorError::invalid_argument(name, "the second argument must be a non-negative integer")
            })
        })
        .collect()
}
