//! Turn location-sheet rows into validated `PerpLocation` records.

use std::io::Read;

use chrono::{DateTime, Utc};
use perp_core::{
  audit::Audit,
  integrity::RecordSet,
  perp::PerpLocation,
  place::Location,
  recid::{RecId, RecIdSource},
  validate::{Report, Validate},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{Gazetteer, LocationRow, Period, Result, rows::read_rows};

/// Stands in for the recid while a record is validated. Real recids are only
/// drawn for records that pass.
const UNASSIGNED: &str = "unassigned";

/// Why a row produced no record. `line` is the row's line in the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Skip {
  #[error("line {line}: status {status:?} is not MATCHED")]
  NotMatched { line: usize, status: String },

  #[error("line {line}: no perp named {name:?}")]
  UnknownPerp { line: usize, name: String },

  #[error("line {line}: no location {location:?} in {country:?}")]
  UnknownLocation {
    line:     usize,
    country:  String,
    location: String,
  },

  #[error("line {line}: {reason}")]
  BadPeriod { line: usize, reason: String },

  #[error("line {line}: built record has {} violation(s)", .report.len())]
  Invalid { line: usize, report: Report },
}

impl Skip {
  pub fn line(&self) -> usize {
    match self {
      Self::NotMatched { line, .. }
      | Self::UnknownPerp { line, .. }
      | Self::UnknownLocation { line, .. }
      | Self::BadPeriod { line, .. }
      | Self::Invalid { line, .. } => *line,
    }
  }
}

/// An imported record and the row's `Note` cell, if it had one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedLocation {
  #[serde(flatten)]
  pub record: PerpLocation,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub note:   Option<String>,
}

/// Result of importing a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Imported(Box<ImportedLocation>),
  Skipped(Skip),
}

/// Everything an import run produced, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub imported: Vec<ImportedLocation>,
  pub skipped:  Vec<Skip>,
}

/// Resolves rows against a loaded record set.
pub struct LocationImporter<'a> {
  records:   &'a RecordSet,
  gazetteer: &'a Gazetteer,
  author:    String,
}

impl<'a> LocationImporter<'a> {
  /// `author` is stamped into both audit `*_by` fields of every record.
  pub fn new(records: &'a RecordSet, gazetteer: &'a Gazetteer, author: impl Into<String>) -> Self {
    Self { records, gazetteer, author: author.into() }
  }

  /// Import one row. Lookup and period failures become [`Outcome::Skipped`];
  /// only recid exhaustion is an error. A recid is drawn from `ids` only
  /// when the row is imported.
  pub fn import_row(
    &self,
    line: usize,
    row: &LocationRow,
    ids: &mut impl RecIdSource,
    now: DateTime<Utc>,
  ) -> Result<Outcome> {
    if !row.is_matched() {
      return Ok(Outcome::Skipped(Skip::NotMatched { line, status: row.status.clone() }));
    }

    let Some(perp) = self.records.perp_named(&row.perp_name) else {
      return Ok(Outcome::Skipped(Skip::UnknownPerp { line, name: row.perp_name.clone() }));
    };

    let Some(location) = self.location_for(row) else {
      return Ok(Outcome::Skipped(Skip::UnknownLocation {
        line,
        country: row.country.clone(),
        location: place_name(row).to_owned(),
      }));
    };

    let period = match Period::resolve(&row.year, &row.month, &row.start_date, &row.end_date) {
      Ok(period) => period,
      Err(e) => {
        return Ok(Outcome::Skipped(Skip::BadPeriod { line, reason: e.to_string() }));
      }
    };

    let mut record = PerpLocation {
      recid:          RecId::new(UNASSIGNED),
      end_date:       period.end_date(),
      perp_recid:     perp.recid.clone(),
      start_date:     period.start_date(),
      location_recid: location.recid.clone(),
      audit:          Audit::created(self.author.as_str(), now),
      location:       location.clone(),
    };

    let report = record.validate();
    if !report.is_valid() {
      return Ok(Outcome::Skipped(Skip::Invalid { line, report }));
    }
    record.recid = ids.next_recid()?;

    let note = match row.note.trim() {
      "" => None,
      note => Some(note.to_owned()),
    };
    Ok(Outcome::Imported(Box::new(ImportedLocation { record, note })))
  }

  /// Import every row of a pipe-delimited sheet. Malformed input aborts the
  /// run; rows that cannot be placed are collected in
  /// [`ImportSummary::skipped`].
  pub fn import_all<R: Read>(
    &self,
    reader: R,
    ids: &mut impl RecIdSource,
    now: DateTime<Utc>,
  ) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for item in read_rows(reader) {
      let (line, row) = item?;
      match self.import_row(line, &row, ids, now)? {
        Outcome::Imported(imported) => summary.imported.push(*imported),
        Outcome::Skipped(skip) => {
          match &skip {
            Skip::NotMatched { .. } => debug!("skipping {skip}"),
            _ => warn!(perp = %row.perp_name, "skipping {skip}"),
          }
          summary.skipped.push(skip);
        }
      }
    }

    info!(
      imported = summary.imported.len(),
      skipped = summary.skipped.len(),
      "location import finished"
    );
    Ok(summary)
  }

  /// The row's country goes through the gazetteer so that aliases like `USA`
  /// find the canonical country record. Of several same-named locations the
  /// first in the record set is used.
  fn location_for(&self, row: &LocationRow) -> Option<&'a Location> {
    let country = row.country.trim();
    let country = self.gazetteer.canonical_country(country).unwrap_or(country);
    let name = place_name(row);
    let matches = self.records.locations_named(country, name);
    if matches.len() > 1 {
      warn!(
        country,
        location = name,
        count = matches.len(),
        "ambiguous location, using the first match"
      );
    }
    matches.into_iter().next()
  }
}

/// The `Location` cell, or `State` when the sheet only names a region.
fn place_name(row: &LocationRow) -> &str {
  match row.location.trim() {
    "" => row.state.trim(),
    name => name,
  }
}
