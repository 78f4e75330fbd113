//! Invariant checks over well-shaped records.
//!
//! Deserialisation already rejects missing fields, wrong primitive types, and
//! `null` in non-nullable positions. What remains are the rules a type cannot
//! express: parseable dates, ordered intervals, monotonic audit stamps,
//! matching embedded keys, consistent parent links, and unique recids.
//!
//! Validation never stops at the first problem. Every violation is collected
//! into a [`Report`] together with the path of the offending field.

use std::{collections::HashSet, fmt};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::{
  Error, Result,
  audit::Audit,
  date::{parse_date, parse_timestamp},
  perp::{Allegation, Perp, PerpLocation, PerpNote, PublicReference},
  place::{Country, Location, LocationType},
  recid::RecId,
};

// ─── Paths ───────────────────────────────────────────────────────────────────

/// Location of a field inside a record tree, e.g. `perp_location[1].end_date`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
  pub fn root() -> Self { Self::default() }

  pub fn field(&self, name: &str) -> Self {
    if self.0.is_empty() {
      Self(name.to_owned())
    } else {
      Self(format!("{}.{name}", self.0))
    }
  }

  pub fn index(&self, i: usize) -> Self { Self(format!("{}[{i}]", self.0)) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for FieldPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Violations ──────────────────────────────────────────────────────────────

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
  #[error("{path}: recid is empty")]
  EmptyRecid { path: String },

  #[error("{path}: {value:?} is not a valid date")]
  InvalidDate { path: String, value: String },

  /// An empty string in a nullable field. Kept distinct from `null`.
  #[error("{path}: empty string in a nullable field (use null)")]
  EmptyNullable { path: String },

  #[error("{path}: end_date {end} precedes start_date {start}")]
  IntervalReversed {
    path:  String,
    start: String,
    end:   String,
  },

  #[error("{path}: changed_date {changed} precedes created_date {created}")]
  AuditRegression {
    path:    String,
    created: String,
    changed: String,
  },

  #[error("{path}: embedded country {embedded} does not match country_recid {expected}")]
  CountryMismatch {
    path:     String,
    expected: RecId,
    embedded: RecId,
  },

  #[error("{path}: embedded location {embedded} does not match location_recid {expected}")]
  LocationMismatch {
    path:     String,
    expected: RecId,
    embedded: RecId,
  },

  #[error("{path}: perp_recid {found} does not match parent {expected}")]
  ParentMismatch {
    path:     String,
    expected: RecId,
    found:    RecId,
  },

  #[error("{path}: duplicate recid {recid}")]
  DuplicateRecid { path: String, recid: RecId },

  #[error("{path}: no {entity} with recid {recid}")]
  DanglingReference {
    path:   String,
    entity: String,
    recid:  RecId,
  },
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// All violations found in one validation pass, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
  violations: Vec<Violation>,
}

impl Report {
  pub fn push(&mut self, violation: Violation) { self.violations.push(violation); }

  pub fn merge(&mut self, other: Report) { self.violations.extend(other.violations); }

  pub fn is_valid(&self) -> bool { self.violations.is_empty() }

  pub fn len(&self) -> usize { self.violations.len() }

  pub fn is_empty(&self) -> bool { self.violations.is_empty() }

  pub fn violations(&self) -> &[Violation] { &self.violations }

  pub fn iter(&self) -> impl Iterator<Item = &Violation> { self.violations.iter() }

  /// `Ok(())` when nothing was found, otherwise [`Error::Invalid`].
  pub fn into_result(self) -> Result<()> {
    if self.is_valid() { Ok(()) } else { Err(Error::Invalid(self)) }
  }
}

impl<'a> IntoIterator for &'a Report {
  type Item = &'a Violation;
  type IntoIter = std::slice::Iter<'a, Violation>;

  fn into_iter(self) -> Self::IntoIter { self.violations.iter() }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A record whose invariants can be checked.
pub trait Validate {
  /// Append every violation under `path` to `report`.
  fn validate_at(&self, path: &FieldPath, report: &mut Report);

  fn validate(&self) -> Report {
    let mut report = Report::default();
    self.validate_at(&FieldPath::root(), &mut report);
    report
  }
}

impl Validate for Country {
  fn validate_at(&self, path: &FieldPath, report: &mut Report) {
    check_recid(report, &path.field("recid"), &self.recid);
  }
}

impl Validate for Location {
  fn validate_at(&self, path: &FieldPath, report: &mut Report) {
    check_recid(report, &path.field("recid"), &self.recid);
    check_recid(report, &path.field("country_recid"), &self.country_recid);

    let country_path = path.field("country");
    self.country.validate_at(&country_path, report);
    if self.country.recid != self.country_recid {
      report.push(Violation::CountryMismatch {
        path:     country_path.field("recid").to_string(),
        expected: self.country_recid.clone(),
        embedded: self.country.recid.clone(),
      });
    }
  }
}

impl Validate for LocationType {
  fn validate_at(&self, path: &FieldPath, report: &mut Report) {
    check_recid(report, &path.field("recid"), &self.recid);
  }
}

impl Validate for PerpLocation {
  fn validate_at(&self, path: &FieldPath, report: &mut Report) {
    check_recid(report, &path.field("recid"), &self.recid);
    check_recid(report, &path.field("perp_recid"), &self.perp_recid);
    check_recid(report, &path.field("location_recid"), &self.location_recid);

    let start = check_date(report, &path.field("start_date"), &self.start_date);
    let end = check_nullable_date(report, &path.field("end_date"), self.end_date.as_deref());
    if let (Some(start), Some(end)) = (start, end)
      && end < start
    {
      report.push(Violation::IntervalReversed {
        path:  path.field("end_date").to_string(),
        start: self.start_date.clone(),
        end:   self.end_date.clone().unwrap_or_default(),
      });
    }

    check_audit(report, path, &self.audit);

    let location_path = path.field("location");
    self.location.validate_at(&location_path, report);
    if self.location.recid != self.location_recid {
      report.push(Violation::LocationMismatch {
        path:     location_path.field("recid").to_string(),
        expected: self.location_recid.clone(),
        embedded: self.location.recid.clone(),
      });
    }
  }
}

impl Validate for Allegation {
  fn validate_at(&self, path: &FieldPath, report: &mut Report) {
    check_recid(report, &path.field("recid"), &self.recid);
    check_recid(report, &path.field("perp_recid"), &self.perp_recid);
    check_audit(report, path, &self.audit);
  }
}

impl Validate for PerpNote {
  fn validate_at(&self, path: &FieldPath, report: &mut Report) {
    check_recid(report, &path.field("recid"), &self.recid);
    check_recid(report, &path.field("perp_recid"), &self.perp_recid);
    check_audit(report, path, &self.audit);
  }
}

impl Validate for PublicReference {
  fn validate_at(&self, path: &FieldPath, report: &mut Report) {
    check_recid(report, &path.field("recid"), &self.recid);
    check_recid(report, &path.field("perp_recid"), &self.perp_recid);
    check_audit(report, path, &self.audit);
  }
}

impl Validate for Perp {
  fn validate_at(&self, path: &FieldPath, report: &mut Report) {
    check_recid(report, &path.field("recid"), &self.recid);
    check_date(report, &path.field("birth_date"), &self.birth_date);
    check_nullable_date(report, &path.field("death_date"), self.death_date.as_deref());
    check_audit(report, path, &self.audit);

    check_children(report, path, &self.recid, "perp_location", &self.perp_location);
    check_children(report, path, &self.recid, "allegation", &self.allegation);
    check_children(report, path, &self.recid, "perp_note", &self.perp_note);
    check_children(report, path, &self.recid, "public_reference", &self.public_reference);
  }
}

/// Validate each child, check its parent link, and check recid uniqueness
/// within the collection.
fn check_children<C: Child>(
  report: &mut Report,
  path: &FieldPath,
  parent: &RecId,
  name: &str,
  children: &[C],
) {
  let collection = path.field(name);
  for (i, child) in children.iter().enumerate() {
    let child_path = collection.index(i);
    child.validate_at(&child_path, report);

    let found = child.perp_recid();
    if !found.is_empty() && found != parent {
      report.push(Violation::ParentMismatch {
        path:     child_path.field("perp_recid").to_string(),
        expected: parent.clone(),
        found:    found.clone(),
      });
    }
  }
  check_unique(report, &collection, children.iter().map(HasRecId::recid));
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Records keyed by their own recid.
pub trait HasRecId {
  fn recid(&self) -> &RecId;
}

macro_rules! impl_has_recid {
  ($($ty:ty),+ $(,)?) => {
    $(
      impl HasRecId for $ty {
        fn recid(&self) -> &RecId { &self.recid }
      }
    )+
  };
}

/// A record owned by a [`Perp`].
pub trait Child: Validate + HasRecId {
  fn perp_recid(&self) -> &RecId;
}

macro_rules! impl_child {
  ($($ty:ty),+ $(,)?) => {
    $(
      impl Child for $ty {
        fn perp_recid(&self) -> &RecId { &self.perp_recid }
      }
    )+
  };
}

impl_child!(PerpLocation, Allegation, PerpNote, PublicReference);

impl_has_recid!(
  Country,
  Location,
  LocationType,
  Perp,
  PerpLocation,
  Allegation,
  PerpNote,
  PublicReference,
);

/// Flag every repeat of a recid within one collection. `collection` is the
/// path of the collection itself; element paths are derived from it.
pub fn check_unique<'a>(
  report: &mut Report,
  collection: &FieldPath,
  ids: impl IntoIterator<Item = &'a RecId>,
) {
  let mut seen = HashSet::new();
  for (i, id) in ids.into_iter().enumerate() {
    if !id.is_empty() && !seen.insert(id) {
      report.push(Violation::DuplicateRecid {
        path:  collection.index(i).field("recid").to_string(),
        recid: id.clone(),
      });
    }
  }
}

fn check_recid(report: &mut Report, path: &FieldPath, id: &RecId) {
  if id.is_empty() {
    report.push(Violation::EmptyRecid { path: path.to_string() });
  }
}

fn check_date(report: &mut Report, path: &FieldPath, value: &str) -> Option<NaiveDate> {
  match parse_date(path.as_str(), value) {
    Ok(date) => Some(date),
    Err(_) => {
      report.push(Violation::InvalidDate {
        path:  path.to_string(),
        value: value.to_owned(),
      });
      None
    }
  }
}

fn check_nullable_date(
  report: &mut Report,
  path: &FieldPath,
  value: Option<&str>,
) -> Option<NaiveDate> {
  match value {
    None => None,
    Some("") => {
      report.push(Violation::EmptyNullable { path: path.to_string() });
      None
    }
    Some(value) => check_date(report, path, value),
  }
}

fn check_audit(report: &mut Report, path: &FieldPath, audit: &Audit) {
  let created = check_timestamp(report, &path.field("created_date"), &audit.created_date);
  let changed = check_timestamp(report, &path.field("changed_date"), &audit.changed_date);
  if let (Some(created), Some(changed)) = (created, changed)
    && changed < created
  {
    report.push(Violation::AuditRegression {
      path:    path.field("changed_date").to_string(),
      created: audit.created_date.clone(),
      changed: audit.changed_date.clone(),
    });
  }
}

fn check_timestamp(
  report: &mut Report,
  path: &FieldPath,
  value: &str,
) -> Option<chrono::NaiveDateTime> {
  match parse_timestamp(path.as_str(), value) {
    Ok(at) => Some(at),
    Err(_) => {
      report.push(Violation::InvalidDate {
        path:  path.to_string(),
        value: value.to_owned(),
      });
      None
    }
  }
}
