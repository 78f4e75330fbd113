//! Audit fields and their lifecycle.
//!
//! Every mutable record except `Country` and `Location` carries the four
//! audit fields. A record is stamped once on creation; each later update
//! refreshes only the `changed_*` pair. `changed_date` never precedes
//! `created_date`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  date::{format_timestamp, parse_timestamp},
};

/// Provenance and last-modification stamp of a record.
///
/// Flattened into the owning record on the wire, so the JSON field names are
/// exactly `created_by`, `created_date`, `changed_by`, `changed_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
  pub created_by:   String,
  pub created_date: String,
  pub changed_by:   String,
  pub changed_date: String,
}

impl Audit {
  /// A fresh stamp for a record created by `by` at `at`.
  pub fn created(by: impl Into<String>, at: DateTime<Utc>) -> Self {
    let by = by.into();
    let at = format_timestamp(at);
    Self {
      created_by:   by.clone(),
      created_date: at.clone(),
      changed_by:   by,
      changed_date: at,
    }
  }

  /// Record an update by `by` at `at`.
  ///
  /// Fails without modifying the stamp if `created_date` is unreadable or if
  /// `at` would precede it.
  pub fn touch(&mut self, by: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
    let created = parse_timestamp("created_date", &self.created_date)?;
    if at.naive_utc() < created {
      return Err(Error::AuditRegression {
        created: self.created_date.clone(),
        changed: format_timestamp(at),
      });
    }
    self.changed_by = by.into();
    self.changed_date = format_timestamp(at);
    Ok(())
  }
}

/// A record that carries [`Audit`] fields.
pub trait Audited {
  fn audit(&self) -> &Audit;

  fn audit_mut(&mut self) -> &mut Audit;

  /// Shorthand for [`Audit::touch`] on this record's stamp.
  fn touch(&mut self, by: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
    self.audit_mut().touch(by, at)
  }
}
