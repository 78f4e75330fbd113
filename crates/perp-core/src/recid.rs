//! Record identifiers and the sources that mint them.
//!
//! A recid is an opaque string. It serves as both primary key and foreign key
//! value and is never interpreted as a number.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── RecId ───────────────────────────────────────────────────────────────────

/// An opaque record identifier. Serialised as a bare JSON string.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct RecId(String);

impl RecId {
  pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for RecId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for RecId {
  fn from(value: &str) -> Self { Self(value.to_owned()) }
}

impl From<String> for RecId {
  fn from(value: String) -> Self { Self(value) }
}

impl AsRef<str> for RecId {
  fn as_ref(&self) -> &str { &self.0 }
}

impl PartialEq<str> for RecId {
  fn eq(&self, other: &str) -> bool { self.0 == other }
}

impl PartialEq<&str> for RecId {
  fn eq(&self, other: &&str) -> bool { self.0 == *other }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

/// Anything that can mint fresh recids.
pub trait RecIdSource {
  fn next_recid(&mut self) -> Result<RecId>;
}

/// Random UUID v4 recids, hyphenated lower case.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRecIds;

impl RecIdSource for RandomRecIds {
  fn next_recid(&mut self) -> Result<RecId> {
    Ok(RecId(Uuid::new_v4().hyphenated().to_string()))
  }
}

/// Deterministic recids in the bulk-load layout
/// `YYYYMMDD-tttt-tttt-tttt-ttttttttNNNN`.
///
/// The result is GUID-shaped (8-4-4-4-12), so it sorts and displays like the
/// random ids while staying reproducible across runs.
#[derive(Debug, Clone)]
pub struct SequentialRecIds {
  base: String,
  next: u32,
}

impl SequentialRecIds {
  const MAX: u32 = 9999;

  /// `tag` must be exactly four lowercase hex digits (e.g. `"cccc"`).
  pub fn new(date: NaiveDate, tag: &str) -> Result<Self> {
    let valid = tag.len() == 4
      && tag
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !valid {
      return Err(Error::InvalidRecIdTag(tag.to_owned()));
    }
    let base = format!("{}-{tag}-{tag}-{tag}-{tag}{tag}", date.format("%Y%m%d"));
    Ok(Self { base, next: 1 })
  }
}

impl RecIdSource for SequentialRecIds {
  fn next_recid(&mut self) -> Result<RecId> {
    if self.next > Self::MAX {
      return Err(Error::RecIdSequenceExhausted(self.base.clone()));
    }
    let id = RecId(format!("{}{:04}", self.base, self.next));
    self.next += 1;
    Ok(id)
  }
}
