//! Date and timestamp conventions.
//!
//! Records carry dates as strings so that a round trip never rewrites them.
//! These helpers interpret those strings for comparison and produce new ones
//! in the canonical ISO-8601 forms:
//!
//! - calendar dates are written `YYYY-MM-DD`;
//! - timestamps are written RFC 3339 in UTC at second precision.

use chrono::{
  DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc,
};

use crate::{Error, Result};

const NAIVE_TIMESTAMP_FORMATS: &[&str] =
  &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// PostgreSQL `timestamptz` text output, e.g. `2025-04-07 10:00:00.123+00`.
const OFFSET_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a timestamp field into UTC wall-clock time.
///
/// A bare calendar date is accepted and read as midnight.
pub fn parse_timestamp(field: &str, value: &str) -> Result<NaiveDateTime> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
    return Ok(dt.naive_utc());
  }
  if let Ok(dt) = DateTime::parse_from_str(value, OFFSET_TIMESTAMP_FORMAT) {
    return Ok(dt.naive_utc());
  }
  for format in NAIVE_TIMESTAMP_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
      return Ok(dt);
    }
  }
  if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
    return Ok(date.and_time(NaiveTime::MIN));
  }
  Err(invalid(field, value))
}

/// Parse a calendar-date field. A full timestamp is accepted and truncated to
/// its date part.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
  if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
    return Ok(date);
  }
  parse_timestamp(field, value)
    .map(|dt| dt.date())
    .map_err(|_| invalid(field, value))
}

pub fn format_date(date: NaiveDate) -> String {
  date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn invalid(field: &str, value: &str) -> Error {
  Error::InvalidDate {
    field: field.to_owned(),
    value: value.to_owned(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
      .unwrap()
      .and_hms_opt(h, min, s)
      .unwrap()
  }

  #[test]
  fn timestamps_in_accepted_layouts() {
    let expected = ts(2025, 4, 7, 10, 0, 0);
    for input in [
      "2025-04-07T10:00:00Z",
      "2025-04-07T12:00:00+02:00",
      "2025-04-07T10:00:00",
      "2025-04-07 10:00:00",
      "2025-04-07 10:00:00.000000",
      "2025-04-07 10:00:00+00",
      "2025-04-07 05:00:00-05",
    ] {
      assert_eq!(parse_timestamp("t", input).unwrap(), expected, "{input}");
    }
  }

  #[test]
  fn bare_date_is_midnight() {
    assert_eq!(
      parse_timestamp("t", "2001-03-01").unwrap(),
      ts(2001, 3, 1, 0, 0, 0)
    );
  }

  #[test]
  fn date_accepts_timestamp() {
    let d = parse_date("d", "2001-03-01T23:59:00Z").unwrap();
    assert_eq!(d, NaiveDate::from_ymd_opt(2001, 3, 1).unwrap());
  }

  #[test]
  fn garbage_and_empty_are_rejected() {
    for input in ["", "yesterday", "2001-13-01", "01/03/2001"] {
      let err = parse_date("start_date", input).unwrap_err();
      assert!(
        matches!(err, Error::InvalidDate { ref field, .. } if field == "start_date"),
        "{input}"
      );
    }
  }

  #[test]
  fn canonical_output_forms() {
    let at = Utc.with_ymd_and_hms(2025, 4, 7, 10, 0, 0).unwrap();
    assert_eq!(format_timestamp(at), "2025-04-07T10:00:00Z");
    assert_eq!(
      format_date(NaiveDate::from_ymd_opt(2025, 4, 7).unwrap()),
      "2025-04-07"
    );
  }
}
