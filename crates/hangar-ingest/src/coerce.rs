//! Typed field parsers, one per field type.
//!
//! Every parser is pure and returns `None` when the value cannot be read as
//! that type. Absent versus present-but-invalid is decided by the caller,
//! which sees the raw row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Formats tried, in order, after ISO `YYYY-MM-DD` and `DD/MM/YYYY`.
const GENERIC_DATE_FORMATS: &[&str] = &[
  "%Y/%m/%d",
  "%m/%d/%Y",
  "%B %d, %Y",
  "%b %d, %Y",
  "%d %B %Y",
  "%d %b %Y",
  "%b %d %Y",
];

const GENERIC_DATETIME_FORMATS: &[&str] =
  &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// `null` and whitespace-only strings count as "not provided".
pub fn is_blank(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    _ => false,
  }
}

/// Trimmed non-empty text. Numbers are accepted and rendered in their JSON
/// form, so `{"issue": 12}` reads as `"12"`.
pub fn parse_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => {
      let t = s.trim();
      (!t.is_empty()).then(|| t.to_owned())
    }
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// A native boolean or the literal strings `true`/`false`.
pub fn parse_flag(value: &Value) -> Option<bool> {
  match value {
    Value::Bool(b) => Some(*b),
    Value::String(s) => {
      let t = s.trim();
      if t.eq_ignore_ascii_case("true") {
        Some(true)
      } else if t.eq_ignore_ascii_case("false") {
        Some(false)
      } else {
        None
      }
    }
    _ => None,
  }
}

/// A finite float from a JSON number or a numeric string.
pub fn parse_float(value: &Value) -> Option<f64> {
  let n = match value {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  n.is_finite().then_some(n)
}

/// A whole number that fits in `i32`. `"2"`, `2` and `2.0` all read as 2;
/// `2.5` does not.
pub fn parse_integer(value: &Value) -> Option<i32> {
  if let Value::Number(n) = value
    && let Some(i) = n.as_i64()
  {
    return i32::try_from(i).ok();
  }
  if let Value::String(s) = value
    && let Ok(i) = s.trim().parse::<i64>()
  {
    return i32::try_from(i).ok();
  }
  let f = parse_float(value)?;
  if f.fract() != 0.0 || f < i32::MIN as f64 || f > i32::MAX as f64 {
    return None;
  }
  Some(f as i32)
}

/// A calendar date from a string value; see [`parse_date_str`].
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
  match value {
    Value::String(s) => parse_date_str(s),
    _ => None,
  }
}

/// Try ISO `YYYY-MM-DD`, then `DD/MM/YYYY`, then a set of generic formats.
/// The first attempt yielding a valid calendar date wins.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
  let s = raw.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Some(d);
  }
  if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
    return Some(d);
  }
  parse_generic_date(s)
}

fn parse_generic_date(s: &str) -> Option<NaiveDate> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc).date_naive());
  }
  if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
    return Some(dt.with_timezone(&Utc).date_naive());
  }
  for fmt in GENERIC_DATETIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(dt.date());
    }
  }
  GENERIC_DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn flags_accept_booleans_and_literals() {
    assert_eq!(parse_flag(&json!(true)), Some(true));
    assert_eq!(parse_flag(&json!("false")), Some(false));
    assert_eq!(parse_flag(&json!(" TRUE ")), Some(true));
    assert_eq!(parse_flag(&json!("yes")), None);
    assert_eq!(parse_flag(&json!(1)), None);
  }

  #[test]
  fn floats_reject_garbage_rather_than_zeroing() {
    assert_eq!(parse_float(&json!("12.50")), Some(12.5));
    assert_eq!(parse_float(&json!(7)), Some(7.0));
    assert_eq!(parse_float(&json!("")), None);
    assert_eq!(parse_float(&json!("abc")), None);
    assert_eq!(parse_float(&json!("NaN")), None);
  }

  #[test]
  fn integers_must_be_whole() {
    assert_eq!(parse_integer(&json!("3")), Some(3));
    assert_eq!(parse_integer(&json!(4)), Some(4));
    assert_eq!(parse_integer(&json!(5.0)), Some(5));
    assert_eq!(parse_integer(&json!("2.5")), None);
    assert_eq!(parse_integer(&json!("9999999999")), None);
  }

  #[test]
  fn day_first_slash_dates_parse() {
    assert_eq!(parse_date_str("15/03/2024"), Some(ymd(2024, 3, 15)));
  }

  #[test]
  fn iso_dates_win_first() {
    assert_eq!(parse_date_str("2024-03-15"), Some(ymd(2024, 3, 15)));
  }

  #[test]
  fn month_first_falls_through_to_generic() {
    assert_eq!(parse_date_str("03/25/2024"), Some(ymd(2024, 3, 25)));
  }

  #[test]
  fn generic_formats_cover_exports() {
    assert_eq!(
      parse_date_str("2024-03-15T00:00:00.000Z"),
      Some(ymd(2024, 3, 15))
    );
    assert_eq!(parse_date_str("March 15, 2024"), Some(ymd(2024, 3, 15)));
    assert_eq!(parse_date_str("15 Mar 2024"), Some(ymd(2024, 3, 15)));
  }

  #[test]
  fn unparseable_dates_are_omitted() {
    assert_eq!(parse_date_str("not-a-date"), None);
    assert_eq!(parse_date_str("31/02/2024"), None);
    assert_eq!(parse_date_str("   "), None);
    assert_eq!(parse_date(&json!(20240315)), None);
  }

  #[test]
  fn text_reads_numbers_and_trims() {
    assert_eq!(parse_text(&json!(12)), Some("12".to_string()));
    assert_eq!(parse_text(&json!("  Defiant ")), Some("Defiant".to_string()));
    assert_eq!(parse_text(&json!("  ")), None);
    assert_eq!(parse_text(&json!(null)), None);
  }
}
