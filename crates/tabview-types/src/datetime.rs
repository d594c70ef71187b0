//! Datetime parsing and the configured timezone

use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Layouts tried after the caller's formats when a string carries no offset.
const NAIVE_DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const NAIVE_DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const OFFSET_DATETIME_LAYOUTS: &[&str] =
    &["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f %z"];

/// Fixed offset applied to datetime strings without an explicit zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timezone(FixedOffset);

impl Timezone {
    pub fn utc() -> Self {
        Timezone(Utc.fix())
    }

    pub fn offset(&self) -> FixedOffset {
        self.0
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Timezone::utc()
    }
}

impl From<FixedOffset> for Timezone {
    fn from(offset: FixedOffset) -> Self {
        Timezone(offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneParseError(pub String);

impl fmt::Display for TimezoneParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is an invalid timezone", self.0)
    }
}

impl std::error::Error for TimezoneParseError {}

impl FromStr for Timezone {
    type Err = TimezoneParseError;

    /// Accepts `UTC`, `Z`, `Local`, or an offset such as `+09:00` / `-0500`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "UTC" | "Z" | "GMT" => return Ok(Timezone::utc()),
            "LOCAL" => return Ok(Timezone(Local::now().offset().fix())),
            _ => {}
        }

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(TimezoneParseError(s.to_string())),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(TimezoneParseError(s.to_string()));
        }
        let hours: i32 = digits[..2].parse().map_err(|_| TimezoneParseError(s.to_string()))?;
        let minutes: i32 = digits[2..].parse().map_err(|_| TimezoneParseError(s.to_string()))?;
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Timezone)
            .ok_or_else(|| TimezoneParseError(s.to_string()))
    }
}

impl TryFrom<String> for Timezone {
    type Error = TimezoneParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timezone> for String {
    fn from(tz: Timezone) -> Self {
        tz.to_string()
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.local_minus_utc();
        if secs == 0 {
            return write!(f, "UTC");
        }
        let sign = if secs < 0 { '-' } else { '+' };
        let secs = secs.abs();
        write!(f, "{}{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60)
    }
}

/// Parse a datetime string.
///
/// The caller's `formats` (chrono strftime layouts) are tried first, then
/// RFC 3339, RFC 2822 and a handful of common layouts. Strings without an
/// offset are interpreted in `timezone`.
pub fn parse_datetime(
    s: &str,
    formats: &[String],
    timezone: Timezone,
) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in formats {
        if let Some(dt) = parse_with_layout(s, format, timezone) {
            return Some(dt);
        }
    }

    // Cheap rejection: every built-in layout needs a date separator.
    if !s.contains('-') && !s.contains('/') && !s.contains(',') {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    OFFSET_DATETIME_LAYOUTS
        .iter()
        .chain(NAIVE_DATETIME_LAYOUTS)
        .chain(NAIVE_DATE_LAYOUTS)
        .find_map(|layout| parse_with_layout(s, layout, timezone))
}

fn parse_with_layout(s: &str, layout: &str, timezone: Timezone) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_str(s, layout) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
        return timezone.0.from_local_datetime(&naive).single();
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, layout) {
        return timezone.0.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single();
    }
    None
}
