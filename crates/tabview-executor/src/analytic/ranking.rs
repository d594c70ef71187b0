//! Ranking functions
//!
//! Implements ROW_NUMBER, RANK, DENSE_RANK, CUME_DIST, PERCENT_RANK and
//! NTILE. `keys` holds the ORDER BY sort keys of each partition row in
//! partition order; ties are rows whose keys are equivalent.

use tabview_types::Value;

use crate::{
    compare::SortValues,
    errors::{ExecutorError, Result},
};

/// 1, 2, 3, ... regardless of ties.
pub fn row_number(len: usize) -> Vec<Value> {
    (1..=len as i64).map(Value::Integer).collect()
}

/// Rank with gaps: scores [95, 90, 90, 85] rank [1, 2, 2, 4].
pub fn rank(keys: &[&SortValues]) -> Vec<Value> {
    let mut ranks = Vec::with_capacity(keys.len());
    let mut current = 1;
    for (i, key) in keys.iter().enumerate() {
        if i > 0 && !key.equivalent_to(keys[i - 1]) {
            current = i as i64 + 1;
        }
        ranks.push(Value::Integer(current));
    }
    ranks
}

/// Rank without gaps: scores [95, 90, 90, 85] rank [1, 2, 2, 3].
pub fn dense_rank(keys: &[&SortValues]) -> Vec<Value> {
    let mut ranks = Vec::with_capacity(keys.len());
    let mut current = 1;
    for (i, key) in keys.iter().enumerate() {
        if i > 0 && !key.equivalent_to(keys[i - 1]) {
            current += 1;
        }
        ranks.push(Value::Integer(current));
    }
    ranks
}

/// Share of rows up to and including the last peer of the current row.
pub fn cume_dist(keys: &[&SortValues]) -> Vec<Value> {
    let len = keys.len() as f64;
    let mut result = Vec::with_capacity(keys.len());
    for group in tie_groups(keys) {
        let dist = group.end as f64 / len;
        result.extend(group.map(|_| Value::Float(dist)));
    }
    result
}

/// (rank - 1) / (rows - 1); 1 for a partition of at most one row.
pub fn percent_rank(keys: &[&SortValues]) -> Vec<Value> {
    if keys.len() <= 1 {
        return vec![Value::Float(1.0); keys.len()];
    }
    let denominator = (keys.len() - 1) as f64;
    let mut result = Vec::with_capacity(keys.len());
    for group in tie_groups(keys) {
        let pct = group.start as f64 / denominator;
        result.extend(group.map(|_| Value::Float(pct)));
    }
    result
}

/// Split `len` rows into `buckets` groups as evenly as possible. The first
/// `len % buckets` groups take one extra row.
///
/// Seven rows in three buckets: [1, 1, 1, 2, 2, 3, 3].
pub fn ntile(len: usize, buckets: i64) -> Result<Vec<Value>> {
    if buckets < 1 {
        return Err(ExecutorError::invalid_argument("ntile", "the first argument must be greater than 0"));
    }
    let buckets = (buckets as usize).min(len.max(1));
    let base = len / buckets;
    let remainder = len % buckets;

    let mut result = Vec::with_capacity(len);
    for bucket in 0..buckets {
        let size = base + usize::from(bucket < remainder);
        result.extend(std::iter::repeat(Value::Integer(bucket as i64 + 1)).take(size));
    }
    Ok(result)
}

/// Position ranges of consecutive equivalent keys.
fn tie_groups(keys: &[&SortValues]) -> Vec<std::ops::Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=keys.len() {
        if i == keys.len() || !keys[i].equivalent_to(keys[start]) {
            groups.push(start..i);
            start = i;
        }
    }
    groups
}
