//! Value access functions
//!
//! LAG and LEAD read another row of the partition; FIRST_VALUE, LAST_VALUE and
//! NTH_VALUE read a row of the current frame. With IGNORE NULLS, NULL values
//! are skipped as if their rows were absent.

use std::ops::Range;

use tabview_types::Value;

/// LAG over one partition, in a single forward pass.
///
/// `values`, `offsets` and `defaults` are aligned with the partition rows. A
/// row whose offset reaches before the first row takes its default.
pub fn lag(values: &[Value], offsets: &[usize], defaults: &[Value], ignore_nulls: bool) -> Vec<Value> {
    let mut seen: Vec<&Value> = Vec::with_capacity(values.len());
    let mut result = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let offset = offsets[i];
        let found = if offset == 0 {
            Some(value)
        } else {
            seen.len().checked_sub(offset).map(|pos| seen[pos])
        };
        result.push(found.cloned().unwrap_or_else(|| defaults[i].clone()));

        if !(ignore_nulls && value.is_null()) {
            seen.push(value);
        }
    }
    result
}

/// LEAD: LAG over a reversed copy of the partition.
pub fn lead(values: &[Value], offsets: &[usize], defaults: &[Value], ignore_nulls: bool) -> Vec<Value> {
    let values: Vec<Value> = values.iter().rev().cloned().collect();
    let offsets: Vec<usize> = offsets.iter().rev().copied().collect();
    let defaults: Vec<Value> = defaults.iter().rev().cloned().collect();
    let mut result = lag(&values, &offsets, &defaults, ignore_nulls);
    result.reverse();
    result
}

/// The `n`th value (1-based) of `frame`, counted from its start.
pub fn nth_value(values: &[Value], frame: Range<usize>, n: usize, ignore_nulls: bool) -> Value {
    values[frame]
        .iter()
        .filter(|v| !(ignore_nulls && v.is_null()))
        .nth(n.saturating_sub(1))
        .cloned()
        .unwrap_or(Value::Null)
}

pub fn first_value(values: &[Value], frame: Range<usize>, ignore_nulls: bool) -> Value {
    nth_value(values, frame, 1, ignore_nulls)
}

pub fn last_value(values: &[Value], frame: Range<usize>, ignore_nulls: bool) -> Value {
    values[frame].iter().rev().find(|v| !(ignore_nulls && v.is_null())).cloned().unwrap_or(Value::Null)
}
