//! Resolve the loose date columns of a location sheet into a date interval.
//!
//! Research sheets record when a perp was somewhere as a year (or year
//! range), optionally narrowed by a month, a month range, a season, or a pair
//! of `M/D` days. Precedence, highest first:
//!
//! 1. a year range `1999-2001` spans whole years;
//! 2. `Start Date`/`End Date` as `M/D` within the year;
//! 3. the `Month` column (month, month range, season, season range);
//! 4. the whole year.

use chrono::{Months, NaiveDate};
use perp_core::date::format_date;

use crate::{Error, Result};

/// A resolved interval. `end == None` leaves the interval open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
  pub start: NaiveDate,
  pub end:   Option<NaiveDate>,
}

impl Period {
  /// Resolve from the raw `Year`, `Month`, `Start Date`, and `End Date`
  /// cells. Only `year` is required; blank cells are ignored.
  pub fn resolve(year: &str, month: &str, start: &str, end: &str) -> Result<Self> {
    let year = year.trim();
    let invalid = || Error::InvalidYear(year.to_owned());

    let (first, last) = match year.split_once('-') {
      Some((a, b)) => {
        let a: i32 = a.trim().parse().map_err(|_| invalid())?;
        let b: i32 = b.trim().parse().map_err(|_| invalid())?;
        (a, Some(b))
      }
      None => (year.parse().map_err(|_| invalid())?, None),
    };

    if let Some(last) = last {
      if last < first {
        return Err(invalid());
      }
      return Ok(Self {
        start: ymd(first, 1, 1).ok_or_else(invalid)?,
        end:   Some(ymd(last, 12, 31).ok_or_else(invalid)?),
      });
    }

    if let Some(period) = day_range(first, start.trim(), end.trim()) {
      return Ok(period);
    }

    if let Some(period) = month_range(first, month.trim()) {
      return Ok(period);
    }

    Ok(Self {
      start: ymd(first, 1, 1).ok_or_else(invalid)?,
      end:   Some(ymd(first, 12, 31).ok_or_else(invalid)?),
    })
  }

  pub fn start_date(&self) -> String { format_date(self.start) }

  pub fn end_date(&self) -> Option<String> { self.end.map(format_date) }
}

// ─── Day range ───────────────────────────────────────────────────────────────

/// Both cells as `M/D`. An end before the start rolls into the next year.
fn day_range(year: i32, start: &str, end: &str) -> Option<Period> {
  if start.is_empty() || end.is_empty() {
    return None;
  }
  let start = month_day(year, start)?;
  let mut end = month_day(year, end)?;
  if end < start {
    end = end.checked_add_months(Months::new(12))?;
  }
  Some(Period { start, end: Some(end) })
}

fn month_day(year: i32, cell: &str) -> Option<NaiveDate> {
  let (m, d) = cell.split_once('/')?;
  ymd(year, m.trim().parse().ok()?, d.trim().parse().ok()?)
}

// ─── Month / season range ────────────────────────────────────────────────────

/// Whether `cell` reads as a `Month` column value: a month, a season, or a
/// range of either.
pub(crate) fn is_month_cell(cell: &str) -> bool {
  let cell = cell.trim();
  !cell.is_empty() && season_span(cell).or_else(|| month_span(cell)).is_some()
}

fn month_range(year: i32, cell: &str) -> Option<Period> {
  if cell.is_empty() {
    return None;
  }

  let (start_month, end_month) = season_span(cell).or_else(|| month_span(cell))?;
  let start = ymd(year, start_month, 1)?;
  let end = match end_month {
    Some(m) => {
      let end_year = if m < start_month { year + 1 } else { year };
      Some(last_day_of_month(end_year, m)?)
    }
    None => None,
  };
  Some(Period { start, end })
}

/// `Winter`, `Spring-Summer`, … Seasons always have an end month.
fn season_span(cell: &str) -> Option<(u32, Option<u32>)> {
  match cell.split_once('-') {
    Some((a, b)) => {
      let (start, _) = season(a.trim())?;
      let (_, end) = season(b.trim())?;
      Some((start, Some(end)))
    }
    None => season(cell).map(|(start, end)| (start, Some(end))),
  }
}

/// `Mar`, `March-May`, … A single month has no end month.
fn month_span(cell: &str) -> Option<(u32, Option<u32>)> {
  match cell.split_once('-') {
    Some((a, b)) => Some((month(a.trim())?, month(b.trim()))),
    None => Some((month(cell)?, None)),
  }
}

fn season(name: &str) -> Option<(u32, u32)> {
  match name.to_ascii_lowercase().as_str() {
    "spring" => Some((3, 5)),
    "summer" => Some((6, 8)),
    "autumn" | "fall" => Some((9, 11)),
    "winter" => Some((12, 2)),
    _ => None,
  }
}

pub(crate) fn month(name: &str) -> Option<u32> {
  let n = match name.to_ascii_lowercase().as_str() {
    "jan" | "january" => 1,
    "feb" | "february" => 2,
    "mar" | "march" => 3,
    "apr" | "april" => 4,
    "may" => 5,
    "jun" | "june" => 6,
    "jul" | "july" => 7,
    "aug" | "august" => 8,
    "sep" | "sept" | "september" => 9,
    "oct" | "october" => 10,
    "nov" | "november" => 11,
    "dec" | "december" => 12,
    _ => return None,
  };
  Some(n)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(year, month, day)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
  ymd(year, month, 1)?
    .checked_add_months(Months::new(1))?
    .pred_opt()
}
