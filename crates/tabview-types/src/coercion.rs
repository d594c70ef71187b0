//! Lossless coercions between primary values
//!
//! Every coercion returns `None` (or `Ternary::Unknown`) when the value cannot
//! be represented in the target type. None of them fail loudly: callers fall
//! through to the next candidate type.

use chrono::{DateTime, FixedOffset};

use crate::{datetime::parse_datetime, Ternary, Timezone, Value};

/// Integer only when no information would be lost.
///
/// Floats qualify when they hold an integral value inside the i64 range;
/// strings qualify when the trimmed text parses as a decimal integer.
pub fn to_integer_strictly(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) => float_to_integer(*f),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Integer with truncation of fractional floats and numeric strings.
pub fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.is_finite() => float_to_integer(f.trunc()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).and_then(|f| float_to_integer(f.trunc())))
        }
        _ => None,
    }
}

fn float_to_integer(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => parse_float(s.trim()),
        _ => None,
    }
}

fn parse_float(s: &str) -> Option<f64> {
    match s {
        "" => None,
        "NaN" => Some(f64::NAN),
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        // Rust accepts "inf"/"infinity" spellings that are plain words in data.
        _ if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => None,
        _ => s.parse::<f64>().ok(),
    }
}

/// Datetime from a datetime value or a string in one of `formats`.
pub fn to_datetime(
    value: &Value,
    formats: &[String],
    timezone: Timezone,
) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::Datetime(dt) => Some(*dt),
        Value::String(s) => parse_datetime(s, formats, timezone),
        _ => None,
    }
}

pub fn to_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Ternary(t) => t.as_bool(),
        Value::Integer(1) => Some(true),
        Value::Integer(0) => Some(false),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Some(true),
            "0" | "f" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn to_ternary(value: &Value) -> Ternary {
    match value {
        Value::Ternary(t) => *t,
        Value::Null => Ternary::Unknown,
        Value::String(s) if s.trim().eq_ignore_ascii_case("unknown") => Ternary::Unknown,
        other => to_boolean(other).map(Ternary::from).unwrap_or(Ternary::Unknown),
    }
}

/// String form of scalar values; booleans and datetimes have none.
pub fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(_) => Some(value.to_string()),
        _ => None,
    }
}
