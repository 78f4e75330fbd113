//! Reader and writer for pipe-delimited location sheets.
//!
//! The first line is a header. Columns are matched by name, so their order is
//! free; every column except `Perp Name`, `Year`, and `Status` may be
//! omitted. Cells are taken verbatim.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::Result;

/// One line of a location sheet. Field order is the column order written by
/// [`write_rows`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRow {
  /// Outcome of the place-matching pass; only `MATCHED` rows are imported.
  #[serde(rename = "Status")]
  pub status:     String,
  #[serde(rename = "Perp Name")]
  pub perp_name:  String,
  #[serde(rename = "Year")]
  pub year:       String,
  #[serde(rename = "Country", default)]
  pub country:    String,
  #[serde(rename = "State", default)]
  pub state:      String,
  #[serde(rename = "Location", default)]
  pub location:   String,
  /// Researcher's remark. Imported beside the record and written to the
  /// `note` column of SQL output.
  #[serde(rename = "Note", default)]
  pub note:       String,
  #[serde(rename = "Start Date", default)]
  pub start_date: String,
  #[serde(rename = "End Date", default)]
  pub end_date:   String,
  #[serde(rename = "Month", default)]
  pub month:      String,
}

impl LocationRow {
  pub const MATCHED: &'static str = "MATCHED";
  pub const NO_MATCH: &'static str = "NOMATCH";

  pub fn is_matched(&self) -> bool { self.status == Self::MATCHED }
}

/// Iterate the rows of a sheet. Each item is paired with its 1-based line
/// number in the input, counting the header as line 1.
pub fn read_rows<R: Read>(reader: R) -> impl Iterator<Item = Result<(usize, LocationRow)>> {
  csv::ReaderBuilder::new()
    .delimiter(b'|')
    .has_headers(true)
    .flexible(true)
    .from_reader(reader)
    .into_deserialize::<LocationRow>()
    .enumerate()
    .map(|(i, row)| Ok((i + 2, row?)))
}

/// Write `rows` as a sheet, header first. Cells containing `|` or quotes are
/// quoted so [`read_rows`] reads them back unchanged.
pub fn write_rows<'r, W: Write>(
  writer: W,
  rows: impl IntoIterator<Item = &'r LocationRow>,
) -> Result<()> {
  let mut out = csv::WriterBuilder::new()
    .delimiter(b'|')
    .has_headers(false)
    .from_writer(writer);
  out.write_record([
    "Status",
    "Perp Name",
    "Year",
    "Country",
    "State",
    "Location",
    "Note",
    "Start Date",
    "End Date",
    "Month",
  ])?;
  for row in rows {
    out.serialize(row)?;
  }
  out.flush()?;
  Ok(())
}
