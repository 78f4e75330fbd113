//! The perp aggregate and its child records.
//!
//! A [`Perp`] owns four ordered child collections. Each child names its
//! parent through `perp_recid`; there are no back-pointers, so the value tree
//! is acyclic and can be cloned or serialised as a unit.

use serde::{Deserialize, Serialize};

use crate::{
  audit::{Audit, Audited},
  place::Location,
  recid::RecId,
};

// ─── Children ────────────────────────────────────────────────────────────────

/// A perp's presence at a location over a date interval.
///
/// `end_date == None` means the interval is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerpLocation {
  pub recid:          RecId,
  pub end_date:       Option<String>,
  pub perp_recid:     RecId,
  pub start_date:     String,
  pub location_recid: RecId,
  #[serde(flatten)]
  pub audit:          Audit,
  /// Snapshot of the location named by `location_recid`.
  pub location:       Location,
}

impl PerpLocation {
  pub fn is_open(&self) -> bool { self.end_date.is_none() }
}

/// A claim made against a perp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allegation {
  pub recid:       RecId,
  pub description: String,
  pub perp_recid:  RecId,
  #[serde(flatten)]
  pub audit:       Audit,
}

/// A free-text annotation on a perp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerpNote {
  pub note:       String,
  pub recid:      RecId,
  pub perp_recid: RecId,
  #[serde(flatten)]
  pub audit:      Audit,
}

/// An external citation about a perp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicReference {
  pub description_full: String,
  pub recid:            RecId,
  pub perp_recid:       RecId,
  #[serde(flatten)]
  pub audit:            Audit,
}

// ─── Aggregate root ──────────────────────────────────────────────────────────

/// A person of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perp {
  pub recid:            RecId,
  pub name:             String,
  pub sex:              String,
  pub birth_date:       String,
  /// `None` when the person is alive or the date is unknown.
  pub death_date:       Option<String>,
  /// Free-form flag that duplicates the presence of `death_date`. No rule
  /// keeps the two in step, and none is applied here.
  pub deceased:         String,
  pub position:         String,
  #[serde(flatten)]
  pub audit:            Audit,
  pub image_link:       String,
  #[serde(default)]
  pub perp_location:    Vec<PerpLocation>,
  #[serde(default)]
  pub allegation:       Vec<Allegation>,
  #[serde(default)]
  pub perp_note:        Vec<PerpNote>,
  #[serde(default)]
  pub public_reference: Vec<PublicReference>,
}

impl Perp {
  /// Locations whose interval has not ended.
  pub fn open_locations(&self) -> impl Iterator<Item = &PerpLocation> {
    self.perp_location.iter().filter(|pl| pl.is_open())
  }
}

// ─── Audited ─────────────────────────────────────────────────────────────────

macro_rules! impl_audited {
  ($($ty:ty),+ $(,)?) => {
    $(
      impl Audited for $ty {
        fn audit(&self) -> &Audit { &self.audit }

        fn audit_mut(&mut self) -> &mut Audit { &mut self.audit }
      }
    )+
  };
}

impl_audited!(Perp, PerpLocation, Allegation, PerpNote, PublicReference);
