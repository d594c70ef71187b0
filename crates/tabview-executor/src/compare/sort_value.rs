//! Sort values
//!
//! A [`SortValue`] is a primary value classified once into the type it will be
//! compared as. Classification tries, in order: NULL, integer (only when
//! lossless), float, datetime, boolean, string. Strings are compared in
//! upper-cased, trimmed form.
//!
//! Ordering across types follows these rules:
//! - integers and floats compare numerically with each other
//! - numbers compare with strings through their text
//! - datetimes only compare with datetimes
//! - booleans are never ordered, only tested for equivalence
//! - NaN sorts above every other number; two NaNs are unordered

use std::cmp::Ordering;

use tabview_ast::{NullsPosition, OrderDirection};
use tabview_types::{to_boolean, to_datetime, to_float, to_integer_strictly, Ternary, Value};

use crate::config::ExecutorConfig;

/// Classified payload of a sort value
#[derive(Debug, Clone, PartialEq)]
pub enum SortValueKind {
    Null,
    Integer(i64),
    Float(f64),
    /// Nanoseconds since the Unix epoch
    Datetime(i64),
    Boolean(bool),
    /// Upper-cased and trimmed
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortValue {
    kind: SortValueKind,
    /// Exact type+text key, present only in strict-equality mode
    strict: Option<String>,
}

impl SortValue {
    pub fn new(value: &Value, config: &ExecutorConfig) -> Self {
        let kind = classify(value, config);
        let strict = config.strict_equal.then(|| super::key::strict_key(value));
        SortValue { kind, strict }
    }

    pub fn kind(&self) -> &SortValueKind {
        &self.kind
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, SortValueKind::Null)
    }

    pub(crate) fn strict_key(&self) -> Option<&str> {
        self.strict.as_deref()
    }

    /// Three-valued "less than".
    ///
    /// Equal values and pairs that cannot be ordered both yield `Unknown`.
    pub fn less(&self, other: &SortValue) -> Ternary {
        use SortValueKind::*;
        match (&self.kind, &other.kind) {
            (Integer(a), Integer(b)) => less_ord(a, b),
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                less_float(self.as_float(), other.as_float())
            }
            (Integer(_) | Float(_) | String(_), Integer(_) | Float(_) | String(_)) => {
                less_ord(&self.as_text(), &other.as_text())
            }
            (Datetime(a), Datetime(b)) => less_ord(a, b),
            _ => Ternary::Unknown,
        }
    }

    /// Equality used for grouping, ranking ties and WITH TIES.
    ///
    /// NULL is equivalent to NULL and NaN to NaN. Integers match floats
    /// numerically and booleans through 0/1. In strict mode only identical
    /// type and text match.
    pub fn equivalent_to(&self, other: &SortValue) -> bool {
        if let (Some(a), Some(b)) = (&self.strict, &other.strict) {
            return a == b;
        }

        use SortValueKind::*;
        match (&self.kind, &other.kind) {
            (Null, Null) => true,
            (Integer(a), Integer(b)) => a == b,
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                let (a, b) = (self.as_float(), other.as_float());
                a == b || (a.is_nan() && b.is_nan())
            }
            (Integer(i), Boolean(b)) | (Boolean(b), Integer(i)) => {
                (*i == 1 && *b) || (*i == 0 && !*b)
            }
            (Boolean(a), Boolean(b)) => a == b,
            (Datetime(a), Datetime(b)) => a == b,
            (String(a), String(b)) => a == b,
            _ => false,
        }
    }

    fn as_float(&self) -> f64 {
        match self.kind {
            SortValueKind::Integer(i) => i as f64,
            SortValueKind::Float(f) => f,
            _ => f64::NAN,
        }
    }

    fn as_text(&self) -> String {
        match &self.kind {
            SortValueKind::Integer(i) => i.to_string(),
            SortValueKind::Float(f) => float_text(*f),
            SortValueKind::String(s) => s.clone(),
            _ => String::new(),
        }
    }
}

fn classify(value: &Value, config: &ExecutorConfig) -> SortValueKind {
    if value.is_null() {
        return SortValueKind::Null;
    }
    if let Some(i) = to_integer_strictly(value) {
        return SortValueKind::Integer(i);
    }
    if let Some(f) = to_float(value) {
        return SortValueKind::Float(f);
    }
    if let Some(dt) = to_datetime(value, &config.datetime_formats, config.timezone) {
        let nanos = dt
            .timestamp_nanos_opt()
            .unwrap_or_else(|| dt.timestamp().saturating_mul(1_000_000_000));
        return SortValueKind::Datetime(nanos);
    }
    if let Some(b) = to_boolean(value) {
        return SortValueKind::Boolean(b);
    }
    match value {
        Value::String(s) => SortValueKind::String(s.trim().to_uppercase()),
        _ => SortValueKind::Null,
    }
}

pub(crate) fn float_text(f: f64) -> String {
    Value::Float(f).to_string()
}

fn less_ord<T: PartialOrd>(a: &T, b: &T) -> Ternary {
    match a.partial_cmp(b) {
        Some(Ordering::Less) => Ternary::True,
        Some(Ordering::Greater) => Ternary::False,
        _ => Ternary::Unknown,
    }
}

fn less_float(a: f64, b: f64) -> Ternary {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ternary::Unknown,
        (true, false) => Ternary::False,
        (false, true) => Ternary::True,
        (false, false) => less_ord(&a, &b),
    }
}

/// Sort-key vector of one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortValues(pub Vec<SortValue>);

impl SortValues {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ordering of two records under the given directions and NULL placement.
    ///
    /// Keys are compared left to right; a pair that is equal or cannot be
    /// ordered moves on to the next key.
    pub fn compare(
        &self,
        other: &SortValues,
        directions: &[OrderDirection],
        nulls: &[NullsPosition],
    ) -> Ordering {
        for (i, (a, b)) in self.0.iter().zip(other.0.iter()).enumerate() {
            let direction = directions.get(i).copied().unwrap_or_default();
            let null_position = nulls.get(i).copied().unwrap_or(match direction {
                OrderDirection::Asc => NullsPosition::First,
                OrderDirection::Desc => NullsPosition::Last,
            });

            match (a.is_null(), b.is_null()) {
                (true, true) => continue,
                (true, false) => {
                    return match null_position {
                        NullsPosition::First => Ordering::Less,
                        NullsPosition::Last => Ordering::Greater,
                    }
                }
                (false, true) => {
                    return match null_position {
                        NullsPosition::First => Ordering::Greater,
                        NullsPosition::Last => Ordering::Less,
                    }
                }
                (false, false) => {}
            }

            let ordering = match a.less(b) {
                Ternary::True => Ordering::Less,
                Ternary::False => Ordering::Greater,
                Ternary::Unknown => continue,
            };
            return match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
        }
        Ordering::Equal
    }

    /// Every key equivalent to the corresponding key of `other`.
    pub fn equivalent_to(&self, other: &SortValues) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.equivalent_to(b))
    }
}
