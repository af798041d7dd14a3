//! Typed literal recognition shared by the lexer and the parser.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Hyphen positions of the canonical 8-4-4-4-12 GUID form.
const GUID_HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// Parses a GUID in its canonical hyphenated form only.
pub fn parse_guid(text: &str) -> Option<Uuid> {
    if text.len() != 36 {
        return None;
    }
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        let ok = if GUID_HYPHENS.contains(&i) {
            *b == b'-'
        } else {
            b.is_ascii_hexdigit()
        };
        if !ok {
            return None;
        }
    }
    Uuid::parse_str(text).ok()
}

/// Parses an RFC-3339 timestamp, falling back to a `YYYY-MM-DD` date at
/// midnight UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Strips the `f`/`F` suffix of a float literal, if present.
pub fn strip_float_suffix(text: &str) -> Option<&str> {
    text.strip_suffix('f').or_else(|| text.strip_suffix('F'))
}

pub fn parse_float(text: &str) -> Option<f64> {
    strip_float_suffix(text).unwrap_or(text).parse::<f64>().ok()
}

pub fn parse_integer(text: &str) -> Option<i64> {
    text.parse::<i64>().ok()
}
