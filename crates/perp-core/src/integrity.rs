//! Referential integrity over a loaded set of records.
//!
//! Foreign keys are plain recid values, so nothing in the record types
//! guarantees they resolve. A [`RecordSet`] holds every collection side by
//! side and checks that they do.
//!
//! Embedded snapshots only need matching keys. A snapshot whose `name`
//! differs from the canonical record is stale, not invalid.

use serde::{Deserialize, Serialize};

use crate::{
  perp::Perp,
  place::{Country, Location},
  recid::RecId,
  validate::{FieldPath, HasRecId, Report, Validate, Violation, check_unique},
};

/// Every country, location, and perp known to one data set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
  #[serde(default)]
  pub country:  Vec<Country>,
  #[serde(default)]
  pub location: Vec<Location>,
  #[serde(default)]
  pub perp:     Vec<Perp>,
}

impl RecordSet {
  // ── Lookups ───────────────────────────────────────────────────────────

  pub fn country(&self, recid: &RecId) -> Option<&Country> {
    self.country.iter().find(|c| &c.recid == recid)
  }

  pub fn location(&self, recid: &RecId) -> Option<&Location> {
    self.location.iter().find(|l| &l.recid == recid)
  }

  pub fn perp(&self, recid: &RecId) -> Option<&Perp> {
    self.perp.iter().find(|p| &p.recid == recid)
  }

  /// First perp whose name matches exactly.
  pub fn perp_named(&self, name: &str) -> Option<&Perp> {
    self.perp.iter().find(|p| p.name == name)
  }

  pub fn country_named(&self, name: &str) -> Option<&Country> {
    self.country.iter().find(|c| c.name == name)
  }

  /// The location called `name` inside the country called `country`.
  ///
  /// The country is resolved through the canonical `country` collection, not
  /// the location's embedded snapshot.
  pub fn location_named(&self, country: &str, name: &str) -> Option<&Location> {
    self.locations_named(country, name).into_iter().next()
  }

  /// Every location called `name` inside `country`, in collection order.
  /// Place names are not unique within a country.
  pub fn locations_named(&self, country: &str, name: &str) -> Vec<&Location> {
    let Some(country) = self.country_named(country) else {
      return Vec::new();
    };
    self
      .location
      .iter()
      .filter(|l| l.country_recid == country.recid && l.name == name)
      .collect()
  }

  // ── Checks ────────────────────────────────────────────────────────────

  /// Validate every record, then check recid uniqueness and foreign keys.
  pub fn check(&self) -> Report {
    let mut report = Report::default();
    let root = FieldPath::root();

    let countries = root.field("country");
    for (i, country) in self.country.iter().enumerate() {
      country.validate_at(&countries.index(i), &mut report);
    }
    check_unique(&mut report, &countries, self.country.iter().map(HasRecId::recid));

    let locations = root.field("location");
    for (i, location) in self.location.iter().enumerate() {
      let path = locations.index(i);
      location.validate_at(&path, &mut report);
      self.check_country_ref(&path.field("country_recid"), &location.country_recid, &mut report);
    }
    check_unique(&mut report, &locations, self.location.iter().map(HasRecId::recid));

    let perps = root.field("perp");
    for (i, perp) in self.perp.iter().enumerate() {
      let path = perps.index(i);
      perp.validate_at(&path, &mut report);

      for (j, pl) in perp.perp_location.iter().enumerate() {
        let pl_path = path.field("perp_location").index(j);
        self.check_location_ref(&pl_path.field("location_recid"), &pl.location_recid, &mut report);
        self.check_country_ref(
          &pl_path.field("location").field("country_recid"),
          &pl.location.country_recid,
          &mut report,
        );
      }
    }
    check_unique(&mut report, &perps, self.perp.iter().map(HasRecId::recid));

    // Per-perp uniqueness is covered by `Perp::validate_at`; child recids must
    // also be unique across perps.
    self.check_children_unique(&mut report, "perp_location", |p| {
      p.perp_location.iter().map(HasRecId::recid).collect()
    });
    self.check_children_unique(&mut report, "allegation", |p| {
      p.allegation.iter().map(HasRecId::recid).collect()
    });
    self.check_children_unique(&mut report, "perp_note", |p| {
      p.perp_note.iter().map(HasRecId::recid).collect()
    });
    self.check_children_unique(&mut report, "public_reference", |p| {
      p.public_reference.iter().map(HasRecId::recid).collect()
    });

    report
  }

  fn check_country_ref(&self, path: &FieldPath, recid: &RecId, report: &mut Report) {
    if !recid.is_empty() && self.country(recid).is_none() {
      report.push(Violation::DanglingReference {
        path:   path.to_string(),
        entity: "country".into(),
        recid:  recid.clone(),
      });
    }
  }

  fn check_location_ref(&self, path: &FieldPath, recid: &RecId, report: &mut Report) {
    if !recid.is_empty() && self.location(recid).is_none() {
      report.push(Violation::DanglingReference {
        path:   path.to_string(),
        entity: "location".into(),
        recid:  recid.clone(),
      });
    }
  }

  /// Flag a child recid that already appeared under an earlier perp.
  fn check_children_unique<F>(&self, report: &mut Report, name: &str, ids_of: F)
  where
    F: for<'p> Fn(&'p Perp) -> Vec<&'p RecId>,
  {
    let mut owner: std::collections::HashMap<&RecId, usize> =
      std::collections::HashMap::new();
    for (i, perp) in self.perp.iter().enumerate() {
      for (j, id) in ids_of(perp).into_iter().enumerate() {
        if id.is_empty() {
          continue;
        }
        match owner.get(id) {
          Some(&first) if first != i => {
            report.push(Violation::DuplicateRecid {
              path:  FieldPath::root()
                .field("perp")
                .index(i)
                .field(name)
                .index(j)
                .field("recid")
                .to_string(),
              recid: id.clone(),
            });
          }
          Some(_) => {}
          None => {
            owner.insert(id, i);
          }
        }
      }
    }
  }
}
