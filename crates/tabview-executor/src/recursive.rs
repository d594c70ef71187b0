//! Recursive common table expressions
//!
//! A recursive query starts from its base rows and repeatedly feeds the rows
//! produced by the previous iteration back into the recursive step until an
//! iteration produces nothing new.

use std::collections::HashSet;

use crate::{
    errors::{ExecutorError, Result},
    scope::ReferenceScope,
    view::View,
};

/// Run a recursive query to completion.
///
/// `step` receives the rows produced by the previous iteration (the base rows
/// on the first call) and returns the next ones. Without `all`, rows equal to
/// one already produced are dropped, as with UNION. Each iteration that adds
/// rows counts against `limit_recursion`; a negative limit disables the check.
pub fn evaluate_recursive<F>(scope: &ReferenceScope<'_>, mut base: View, all: bool, mut step: F) -> Result<View>
where
    F: FnMut(&ReferenceScope<'_>, &View) -> Result<View>,
{
    let limit = scope.config().limit_recursion;
    let mut seen = HashSet::new();
    if !all {
        let keys = base.all_column_keys(scope)?;
        let indices: Vec<usize> =
            keys.into_iter().enumerate().filter(|(_, key)| seen.insert(key.clone())).map(|(i, _)| i).collect();
        base.retain_indices(&indices);
    }

    let mut result = base.copy();
    let mut working = base;
    let mut iterations: i64 = 0;

    loop {
        scope.cancellation().check()?;

        let mut next = step(scope, &working)?;
        result.check_field_length(&next)?;
        if !all {
            let keys = next.all_column_keys(scope)?;
            let indices: Vec<usize> =
                keys.into_iter().enumerate().filter(|(_, key)| seen.insert(key.clone())).map(|(i, _)| i).collect();
            next.retain_indices(&indices);
        }
        if next.is_empty() {
            break;
        }

        iterations += 1;
        if limit >= 0 && iterations > limit {
            return Err(ExecutorError::RecursionExceededLimit(limit));
        }
        log::trace!("recursion {}: {} new records", iterations, next.len());

        result.records.extend(next.records.iter().cloned());
        next.clear_caches();
        working = next;
    }

    result.file_info = None;
    result.clear_caches();
    log::debug!("recursive query: {} iterations, {} records", iterations, result.len());
    Ok(result)
}
