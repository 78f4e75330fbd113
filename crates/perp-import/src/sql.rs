//! Render records as SQL `INSERT` statements for bulk loading.
//!
//! Output is text only. Every value is a quoted string literal with `'`
//! doubled; a `None` column is left out of the statement entirely so the
//! table default (normally `NULL`) applies.

use perp_core::{
  integrity::RecordSet,
  perp::PerpLocation,
  place::{Country, Location},
};
use regex::Regex;

use crate::{Error, Result};

/// Writes statements against one schema.
#[derive(Debug, Clone)]
pub struct SqlWriter {
  schema: String,
}

impl SqlWriter {
  /// `schema` is written into statements unquoted, so it must be a plain
  /// identifier.
  pub fn new(schema: impl Into<String>) -> Result<Self> {
    let schema = schema.into();
    let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")?;
    if !identifier.is_match(&schema) {
      return Err(Error::InvalidSchema(schema));
    }
    Ok(Self { schema })
  }

  pub fn schema(&self) -> &str { &self.schema }

  pub fn country(&self, country: &Country) -> String {
    self.insert("country", &[
      ("recid", Some(country.recid.as_str())),
      ("name", Some(country.name.as_str())),
    ])
  }

  pub fn location(&self, location: &Location) -> String {
    self.insert("location", &[
      ("recid", Some(location.recid.as_str())),
      ("country_recid", Some(location.country_recid.as_str())),
      ("name", Some(location.name.as_str())),
    ])
  }

  /// The embedded location snapshot is not written; `location_recid` carries
  /// the reference. `note` is the researcher's remark from the import sheet.
  pub fn perp_location(&self, pl: &PerpLocation, note: Option<&str>) -> String {
    self.insert("perp_location", &[
      ("recid", Some(pl.recid.as_str())),
      ("perp_recid", Some(pl.perp_recid.as_str())),
      ("location_recid", Some(pl.location_recid.as_str())),
      ("start_date", Some(pl.start_date.as_str())),
      ("end_date", pl.end_date.as_deref()),
      ("note", note.filter(|n| !n.is_empty())),
      ("created_by", Some(pl.audit.created_by.as_str())),
      ("created_date", Some(pl.audit.created_date.as_str())),
      ("changed_by", Some(pl.audit.changed_by.as_str())),
      ("changed_date", Some(pl.audit.changed_date.as_str())),
    ])
  }

  /// Countries, then locations, then every perp's locations, so each
  /// statement only references rows inserted before it.
  pub fn record_set(&self, records: &RecordSet) -> Vec<String> {
    let countries = records.country.iter().map(|c| self.country(c));
    let locations = records.location.iter().map(|l| self.location(l));
    let perp_locations = records
      .perp
      .iter()
      .flat_map(|p| &p.perp_location)
      .map(|pl| self.perp_location(pl, None));
    countries.chain(locations).chain(perp_locations).collect()
  }

  fn insert(&self, table: &str, columns: &[(&str, Option<&str>)]) -> String {
    let (names, values): (Vec<&str>, Vec<String>) = columns
      .iter()
      .filter_map(|(name, value)| value.map(|v| (*name, quote(v))))
      .unzip();
    format!(
      "INSERT INTO {}.{table} ({}) VALUES ({});",
      self.schema,
      names.join(", "),
      values.join(", ")
    )
  }
}

fn quote(value: &str) -> String { format!("'{}'", value.replace('\'', "''")) }
