//! Aggregate reducers
//!
//! Each reducer takes the already collected argument values of a group or a
//! window frame. NULLs are skipped; an input without usable values yields
//! NULL, except COUNT which yields 0.

use std::collections::HashSet;

use tabview_types::{to_float, to_string, Ternary, Value};

use super::AggregateFunction;
use crate::{
    compare::{comparison_key, SortValue},
    config::ExecutorConfig,
};

impl AggregateFunction {
    /// Reduce `values`. `separator` is only read by LISTAGG.
    pub fn apply(self, values: &[Value], separator: &str, config: &ExecutorConfig) -> Value {
        match self {
            AggregateFunction::Count => {
                Value::Integer(values.iter().filter(|v| !v.is_null()).count() as i64)
            }
            AggregateFunction::Sum => sum(values),
            AggregateFunction::Avg => {
                let nums = numbers(values);
                if nums.is_empty() {
                    Value::Null
                } else {
                    Value::Float(nums.iter().sum::<f64>() / nums.len() as f64)
                }
            }
            AggregateFunction::Min => extreme(values, config, Ternary::True),
            AggregateFunction::Max => extreme(values, config, Ternary::False),
            AggregateFunction::Stdev => variance(values, true).map(f64::sqrt).into(),
            AggregateFunction::Stdevp => variance(values, false).map(f64::sqrt).into(),
            AggregateFunction::Var => variance(values, true).into(),
            AggregateFunction::Varp => variance(values, false).into(),
            AggregateFunction::Median => median(values),
            AggregateFunction::Listagg => {
                let parts: Vec<String> = values.iter().filter_map(to_string).collect();
                if parts.is_empty() {
                    Value::Null
                } else {
                    Value::String(parts.join(separator))
                }
            }
        }
    }
}

/// First occurrence of every distinct value, in input order.
pub fn distinct_values(values: Vec<Value>, config: &ExecutorConfig) -> Vec<Value> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|v| seen.insert(comparison_key([&SortValue::new(v, config)])))
        .collect()
}

fn numbers(values: &[Value]) -> Vec<f64> {
    values.iter().filter_map(to_float).collect()
}

/// Integer while every input is an integer and the sum fits; float otherwise.
fn sum(values: &[Value]) -> Value {
    let mut int_sum: Option<i64> = Some(0);
    let mut float_sum = 0.0;
    let mut count = 0usize;

    for value in values {
        let Some(f) = to_float(value) else { continue };
        count += 1;
        float_sum += f;
        int_sum = match (int_sum, value) {
            (Some(acc), Value::Integer(i)) => acc.checked_add(*i),
            _ => None,
        };
    }

    match (count, int_sum) {
        (0, _) => Value::Null,
        (_, Some(i)) => Value::Integer(i),
        (_, None) => Value::Float(float_sum),
    }
}

/// MIN when `wanted` is `True`, MAX when `False`: keep the value for which
/// `candidate.less(current)` returns `wanted`.
fn extreme(values: &[Value], config: &ExecutorConfig, wanted: Ternary) -> Value {
    let mut best: Option<(&Value, SortValue)> = None;
    for value in values.iter().filter(|v| !v.is_null()) {
        let sv = SortValue::new(value, config);
        if sv.is_null() {
            continue;
        }
        best = match best {
            None => Some((value, sv)),
            Some((current, current_sv)) => {
                if sv.less(&current_sv) == wanted {
                    Some((value, sv))
                } else {
                    Some((current, current_sv))
                }
            }
        };
    }
    best.map(|(v, _)| v.clone()).unwrap_or(Value::Null)
}

fn variance(values: &[Value], sample: bool) -> Option<f64> {
    let nums = numbers(values);
    let n = nums.len();
    let denominator = if sample { n.checked_sub(1)? } else { n };
    if denominator == 0 {
        return None;
    }
    let mean = nums.iter().sum::<f64>() / n as f64;
    let squares: f64 = nums.iter().map(|x| (x - mean) * (x - mean)).sum();
    Some(squares / denominator as f64)
}

fn median(values: &[Value]) -> Value {
    let mut nums = numbers(values);
    if nums.is_empty() {
        return Value::Null;
    }
    nums.sort_by(f64::total_cmp);
    let mid = nums.len() / 2;
    let m = if nums.len() % 2 == 0 { (nums[mid - 1] + nums[mid]) / 2.0 } else { nums[mid] };
    Value::Float(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(f: AggregateFunction, values: Vec<Value>) -> Value {
        f.apply(&values, ",", &ExecutorConfig::default())
    }

    #[test]
    fn test_count_skips_nulls() {
        let values = vec![Value::Integer(1), Value::Null, Value::string("a")];
        assert_eq!(apply(AggregateFunction::Count, values), Value::Integer(2));
        assert_eq!(apply(AggregateFunction::Count, vec![]), Value::Integer(0));
    }

    #[test]
    fn test_sum_integer_and_float() {
        assert_eq!(
            apply(AggregateFunction::Sum, vec![Value::Integer(1), Value::Integer(2), Value::Null]),
            Value::Integer(3)
        );
        assert_eq!(
            apply(AggregateFunction::Sum, vec![Value::Integer(1), Value::Float(0.5)]),
            Value::Float(1.5)
        );
        assert_eq!(apply(AggregateFunction::Sum, vec![Value::Null]), Value::Null);
    }

    #[test]
    fn test_avg() {
        assert_eq!(
            apply(AggregateFunction::Avg, vec![Value::Integer(1), Value::Integer(2)]),
            Value::Float(1.5)
        );
    }

    #[test]
    fn test_min_max_keep_original_value() {
        let values = vec![Value::string("10"), Value::Integer(3), Value::Null, Value::Float(7.5)];
        assert_eq!(apply(AggregateFunction::Min, values.clone()), Value::Integer(3));
        assert_eq!(apply(AggregateFunction::Max, values), Value::string("10"));
    }

    #[test]
    fn test_variance_family() {
        let values = vec![Value::Integer(2), Value::Integer(4), Value::Integer(4), Value::Integer(4),
            Value::Integer(5), Value::Integer(5), Value::Integer(7), Value::Integer(9)];
        assert_eq!(apply(AggregateFunction::Varp, values.clone()), Value::Float(4.0));
        assert_eq!(apply(AggregateFunction::Stdevp, values.clone()), Value::Float(2.0));
        assert_eq!(apply(AggregateFunction::Var, vec![Value::Integer(1)]), Value::Null);
    }

    #[test]
    fn test_median() {
        assert_eq!(
            apply(AggregateFunction::Median, vec![Value::Integer(3), Value::Integer(1), Value::Integer(2)]),
            Value::Float(2.0)
        );
        assert_eq!(
            apply(AggregateFunction::Median, vec![Value::Integer(4), Value::Integer(1), Value::Integer(2), Value::Integer(3)]),
            Value::Float(2.5)
        );
    }

    #[test]
    fn test_distinct_values() {
        let values = vec![Value::Integer(1), Value::Float(1.0), Value::string("a"), Value::string("A")];
        assert_eq!(
            distinct_values(values, &ExecutorConfig::default()),
            vec![Value::Integer(1), Value::string("a")]
        );
    }

    #[test]
    fn test_listagg() {
        let values = vec![Value::string("a"), Value::Null, Value::string("b")];
        assert_eq!(apply(AggregateFunction::Listagg, values), Value::string("a,b"));
        assert_eq!(apply(AggregateFunction::Listagg, vec![]), Value::Null);
    }
}
