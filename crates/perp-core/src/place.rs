//! Countries, locations, and the reduced location projection.

use serde::{Deserialize, Serialize};

use crate::recid::RecId;

/// A country. Leaf record; referenced by [`Location`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
  pub name:  String,
  pub recid: RecId,
}

/// A named place within a country.
///
/// `country` is an embedded snapshot of the referenced [`Country`]. Its
/// `recid` must equal `country_recid`; its other fields may lag behind the
/// canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub name:          String,
  pub recid:         RecId,
  pub country_recid: RecId,
  pub country:       Country,
}

impl Location {
  /// Build a location whose embedded snapshot is a copy of `country`.
  pub fn within(recid: RecId, name: impl Into<String>, country: &Country) -> Self {
    Self {
      name: name.into(),
      recid,
      country_recid: country.recid.clone(),
      country: country.clone(),
    }
  }

  /// The reduced read view of this location.
  pub fn projection(&self) -> LocationType { LocationType::from(self) }
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// The country part of a [`LocationType`]: a name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryName {
  pub name: String,
}

/// Read-optimised view of a [`Location`]. Not persisted on its own and not
/// interchangeable with `Location`: the nested country carries no recid and
/// there is no `country_recid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationType {
  pub recid:   RecId,
  pub name:    String,
  pub country: CountryName,
}

impl From<&Location> for LocationType {
  fn from(location: &Location) -> Self {
    Self {
      recid:   location.recid.clone(),
      name:    location.name.clone(),
      country: CountryName {
        name: location.country.name.clone(),
      },
    }
  }
}
