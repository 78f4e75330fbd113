//! Error types for `perp-core`.

use thiserror::Error;

use crate::validate::Report;

#[derive(Debug, Error)]
pub enum Error {
  /// The input did not match the record shape: a missing required field, a
  /// wrong primitive type, or `null` in a non-nullable field.
  #[error("shape error: {0}")]
  Shape(#[from] serde_json::Error),

  #[error("invalid date in {field}: {value:?}")]
  InvalidDate { field: String, value: String },

  #[error("changed_date {changed} precedes created_date {created}")]
  AuditRegression { created: String, changed: String },

  #[error("record failed validation ({} violation(s))", .0.len())]
  Invalid(Report),

  #[error("recid tag must be four lowercase hex digits, got {0:?}")]
  InvalidRecIdTag(String),

  #[error("recid sequence {0} is exhausted")]
  RecIdSequenceExhausted(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
