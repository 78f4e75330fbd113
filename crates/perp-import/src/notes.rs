//! Turn a perp's research notes into a location sheet.
//!
//! Notes are plain text, one event per line, named after the perp:
//! `John Doe_from_txt.txt` (or `_from_pdf.txt`). A line that starts with a
//! year or year range is an event; anything else is ignored.
//!
//! ```text
//! 2003 Visited Nairobi Kenya (Jun 14-20)
//! 2004-2006 Worker in Provo, United States
//! 2005 Convention California (Summer)
//! ```
//!
//! A parenthetical day span becomes the `Start Date`/`End Date` cells and a
//! parenthetical month or season becomes the `Month` cell. The rest of the
//! line is resolved through the [`Gazetteer`] and kept as the `Note`. Lines
//! the gazetteer cannot place are emitted with status `NOMATCH`.

use std::{io::BufRead, path::Path};

use regex::Regex;
use tracing::debug;

use crate::{
  Gazetteer, LocationRow, Result,
  period::{is_month_cell, month},
};

/// The year prefix of a note line and the text after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearLine {
  pub start_year: i32,
  pub end_year:   Option<i32>,
  pub text:       String,
}

impl YearLine {
  /// `2003`, or `2003-2005` for a range. A range ending in its own start
  /// year collapses to the single year.
  pub fn year_cell(&self) -> String {
    match self.end_year {
      Some(end) if end != self.start_year => format!("{}-{end}", self.start_year),
      _ => self.start_year.to_string(),
    }
  }
}

/// Builds sheet rows from note lines.
#[derive(Debug)]
pub struct NoteExtractor<'a> {
  gazetteer:  &'a Gazetteer,
  year:       Regex,
  file_name:  Regex,
  paren:      Regex,
  day_span:   Regex,
  whitespace: Regex,
}

impl<'a> NoteExtractor<'a> {
  pub fn new(gazetteer: &'a Gazetteer) -> Result<Self> {
    Ok(Self {
      gazetteer,
      year: Regex::new(r"^(\d{4})(?:-(\d{4}))?\s+(.*)$")?,
      file_name: Regex::new(r"^(.+?)_from_(?:pdf|txt)\.txt$")?,
      paren: Regex::new(r"\(([^)]*)\)")?,
      day_span: Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})(?:\s*-\s*(\d{1,2}))?")?,
      whitespace: Regex::new(r"\s+")?,
    })
  }

  /// The perp name encoded in a notes file name.
  pub fn perp_name_from_file(&self, path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let caps = self.file_name.captures(name)?;
    Some(caps[1].trim().to_owned())
  }

  /// Split a line into its year prefix and text. `None` when the line does
  /// not start with a four-digit year followed by text.
  pub fn parse_year_line(&self, line: &str) -> Option<YearLine> {
    let caps = self.year.captures(line.trim())?;
    let start_year = caps[1].parse().ok()?;
    let end_year = caps.get(2).and_then(|m| m.as_str().parse().ok());
    Some(YearLine { start_year, end_year, text: caps[3].trim().to_owned() })
  }

  /// `Jun 14-20` → (`6/14`, `6/20`); a single day gives the same start and
  /// end. Month names may be abbreviated to their first three letters.
  pub fn parse_day_span(&self, text: &str) -> Option<(String, String)> {
    let caps = self.day_span.captures(text.trim())?;
    let word = &caps[1];
    let m = month(word).or_else(|| word.get(..3).and_then(month))?;
    let start = &caps[2];
    let end = caps.get(3).map_or(start, |e| e.as_str());
    Some((format!("{m}/{start}"), format!("{m}/{end}")))
  }

  /// The sheet row for one note line, or `None` when the line has no year.
  pub fn extract_line(&self, perp_name: &str, line: &str) -> Option<LocationRow> {
    let year_line = self.parse_year_line(line)?;
    let mut row = LocationRow {
      perp_name: perp_name.to_owned(),
      year: year_line.year_cell(),
      ..LocationRow::default()
    };

    let mut text = year_line.text.clone();
    let date_paren = self.paren.captures_iter(&year_line.text).find_map(|caps| {
      let inner = caps.get(1)?.as_str();
      let whole = caps.get(0)?.range();
      if let Some((start, end)) = self.parse_day_span(inner) {
        Some((whole, start, end, String::new()))
      } else if is_month_cell(inner) {
        Some((whole, String::new(), String::new(), inner.trim().to_owned()))
      } else {
        None
      }
    });
    if let Some((range, start, end, month)) = date_paren {
      text.replace_range(range, " ");
      row.start_date = start;
      row.end_date = end;
      row.month = month;
    }

    let text = self.clean(&text);
    let placement = self.gazetteer.resolve(&text);
    row.status = match placement.country {
      Some(_) => LocationRow::MATCHED,
      None => LocationRow::NO_MATCH,
    }
    .to_owned();
    row.country = placement.country.unwrap_or_default();
    row.state = placement.state.unwrap_or_default();
    row.location = placement.location.unwrap_or_default();
    row.note = text;
    Some(row)
  }

  /// Every event line of a notes file, in order.
  ///
  /// A line whose parenthetical is left open continues on the next line
  /// unless that line starts a new year.
  pub fn extract<R: BufRead>(&self, perp_name: &str, reader: R) -> Result<Vec<LocationRow>> {
    let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
    let mut rows = Vec::new();

    let mut i = 0;
    while i < lines.len() {
      let mut line = lines[i].trim().to_owned();
      i += 1;
      if line.is_empty() {
        continue;
      }
      if line.contains('(')
        && !line.contains(')')
        && let Some(next) = lines.get(i).map(|l| l.trim())
        && !next.is_empty()
        && self.parse_year_line(next).is_none()
      {
        line = format!("{line} {next}");
        i += 1;
      }

      match self.extract_line(perp_name, &line) {
        Some(row) => rows.push(row),
        None => debug!(%line, "no year prefix, skipping"),
      }
    }
    Ok(rows)
  }

  fn clean(&self, text: &str) -> String {
    self
      .whitespace
      .replace_all(text, " ")
      .trim()
      .trim_matches(',')
      .trim()
      .to_owned()
  }
}
