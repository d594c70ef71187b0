//! OFFSET and LIMIT

use tabview_ast::{Expression, LimitClause};
use tabview_types::{to_float, to_integer, Value};

use super::View;
use crate::{
    errors::{ExecutorError, Result},
    scope::ReferenceScope,
};

impl View {
    /// OFFSET `expr`; `expr` must evaluate to an integer.
    pub fn offset(&mut self, scope: &ReferenceScope<'_>, expr: &Expression) -> Result<()> {
        let value = scope.evaluate(expr)?;
        let n = to_integer(&value).ok_or_else(|| ExecutorError::InvalidOffsetNumber(display(&value)))?;
        self.apply_offset(n);
        Ok(())
    }

    /// Drop the first `n` records; negative counts as zero.
    pub fn apply_offset(&mut self, n: i64) {
        let n = usize::try_from(n).unwrap_or(0);
        self.offset = n;
        let n = n.min(self.records.len());
        if n == 0 {
            return;
        }
        if self.sort_values.len() == self.records.len() {
            self.sort_values.drain(..n);
        }
        if self.sort_value_cache.len() == self.records.len() {
            self.sort_value_cache.drain(..n);
        }
        self.records.drain(..n);
    }

    /// LIMIT per `clause`: a row count, or a percentage of the rows that
    /// existed before OFFSET.
    pub fn limit(&mut self, scope: &ReferenceScope<'_>, clause: &LimitClause) -> Result<()> {
        let value = scope.evaluate(&clause.value)?;
        let n = if clause.percent {
            let p = to_float(&value)
                .filter(|p| !p.is_nan())
                .ok_or_else(|| ExecutorError::InvalidLimitPercentage(display(&value)))?
                .clamp(0.0, 100.0);
            ((self.records.len() + self.offset) as f64 * p / 100.0).ceil() as i64
        } else {
            to_integer(&value).ok_or_else(|| ExecutorError::InvalidLimitNumber(display(&value)))?
        };
        self.apply_limit(n, clause.with_ties);
        Ok(())
    }

    /// Keep the first `n` records.
    ///
    /// With `with_ties`, records following the cut whose sort keys are
    /// equivalent to those of the last kept record are kept as well. That
    /// needs the keys of a preceding ORDER BY; without them the flag has no
    /// effect.
    pub fn apply_limit(&mut self, n: i64, with_ties: bool) {
        let len = self.records.len();
        let mut n = usize::try_from(n).unwrap_or(0);
        if n >= len {
            return;
        }

        if with_ties && n > 0 && self.sort_values.len() == len {
            let last = &self.sort_values[n - 1];
            while n < len && self.sort_values[n].equivalent_to(last) {
                n += 1;
            }
        }

        self.records.truncate(n);
        self.sort_values.truncate(n);
        self.sort_value_cache.truncate(n);
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}
