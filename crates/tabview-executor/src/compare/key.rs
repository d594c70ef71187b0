//! Comparison key serialization
//!
//! Keys are hash inputs only; they are never shown or parsed. Equivalent
//! sort values serialize identically, so a key identifies a group, a
//! partition or a distinct row.

use std::fmt::Write;

use tabview_types::Value;

use super::sort_value::{float_text, SortValue, SortValueKind};

impl SortValue {
    /// Append this value's key to `buf`.
    ///
    /// Booleans serialize as the integers 1/0 so that they share keys with
    /// the integers they are equivalent to.
    pub fn serialize(&self, buf: &mut String) {
        if let Some(strict) = self.strict_key() {
            buf.push_str(strict);
            return;
        }
        match self.kind() {
            SortValueKind::Null => buf.push_str("[N]"),
            SortValueKind::Integer(i) => {
                let _ = write!(buf, "[I]{}", i);
            }
            SortValueKind::Float(f) => {
                let _ = write!(buf, "[F]{}", float_text(*f));
            }
            SortValueKind::Datetime(nanos) => {
                let _ = write!(buf, "[D]{}", nanos);
            }
            SortValueKind::Boolean(b) => buf.push_str(if *b { "[I]1" } else { "[I]0" }),
            SortValueKind::String(s) => {
                buf.push_str("[S]");
                buf.push_str(s);
            }
        }
    }
}

/// Key over several sort values, separated by `:`.
pub fn comparison_key<'a>(values: impl IntoIterator<Item = &'a SortValue>) -> String {
    let mut buf = String::new();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            buf.push(':');
        }
        value.serialize(&mut buf);
    }
    buf
}

/// Exact key keeping type and case, used in strict-equality mode.
pub(crate) fn strict_key(value: &Value) -> String {
    match value {
        Value::Null => "[N]".to_string(),
        Value::Integer(i) => format!("[i]{}", i),
        Value::Float(f) => format!("[f]{}", float_text(*f)),
        Value::String(s) => format!("[s]{}", s),
        Value::Boolean(b) => format!("[b]{}", b),
        Value::Ternary(t) => format!("[t]{}", t),
        Value::Datetime(dt) => format!(
            "[d]{}",
            dt.timestamp_nanos_opt().unwrap_or_else(|| dt.timestamp().saturating_mul(1_000_000_000))
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutorConfig;

    fn key(values: &[Value]) -> String {
        let config = ExecutorConfig::default();
        let svs: Vec<SortValue> = values.iter().map(|v| SortValue::new(v, &config)).collect();
        comparison_key(&svs)
    }

    #[test]
    fn test_key_format() {
        assert_eq!(key(&[Value::Null]), "[N]");
        assert_eq!(key(&[Value::Integer(5), Value::string(" ab ")]), "[I]5:[S]AB");
        assert_eq!(key(&[Value::Float(1.5)]), "[F]1.5");
    }

    #[test]
    fn test_equivalent_values_share_keys() {
        assert_eq!(key(&[Value::Float(5.0)]), key(&[Value::Integer(5)]));
        assert_eq!(key(&[Value::Boolean(true)]), key(&[Value::Integer(1)]));
        assert_eq!(key(&[Value::string("abc")]), key(&[Value::string("ABC")]));
    }

    #[test]
    fn test_strict_keys_keep_type_and_case() {
        let config = ExecutorConfig { strict_equal: true, ..Default::default() };
        let a = SortValue::new(&Value::string("abc"), &config);
        let b = SortValue::new(&Value::string("ABC"), &config);
        assert_ne!(comparison_key([&a]), comparison_key([&b]));
    }

    #[test]
    fn test_strict_keys_keep_whitespace_and_type() {
        let config = ExecutorConfig { strict_equal: true, ..Default::default() };
        let strict = |v: Value| comparison_key([&SortValue::new(&v, &config)]);

        assert_eq!(key(&[Value::string(" 1 ")]), key(&[Value::string("1")]));
        assert_eq!(key(&[Value::string("1")]), key(&[Value::Integer(1)]));

        assert_eq!(strict(Value::string(" 1 ")), "[s] 1 ");
        assert_ne!(strict(Value::string(" 1 ")), strict(Value::string("1")));
        assert_ne!(strict(Value::string("1")), strict(Value::Integer(1)));
    }
}
