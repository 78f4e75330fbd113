//! Conformance tests over whole records.

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use crate::{
  Error,
  audit::{Audit, Audited},
  integrity::RecordSet,
  perp::{Allegation, Perp, PerpLocation, PerpNote, PublicReference},
  place::{Country, Location, LocationType},
  recid::RecId,
  validate::{Validate, Violation},
  wire::{decode_valid, from_json, to_json},
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn audit() -> Value {
  json!({
    "created_by":   "script",
    "created_date": "2025-04-07T10:00:00Z",
    "changed_by":   "script",
    "changed_date": "2025-04-08T10:00:00Z",
  })
}

fn with_audit(mut record: Value) -> Value {
  let fields = audit();
  let (Some(target), Some(source)) = (record.as_object_mut(), fields.as_object())
  else {
    panic!("fixtures are objects")
  };
  for (k, v) in source {
    target.insert(k.clone(), v.clone());
  }
  record
}

fn kenya() -> Value { json!({ "name": "Kenya", "recid": "C1" }) }

fn nairobi() -> Value {
  json!({
    "name": "Nairobi",
    "recid": "L1",
    "country_recid": "C1",
    "country": kenya(),
  })
}

fn perp_json() -> Value {
  with_audit(json!({
    "recid": "P1",
    "name": "John Doe",
    "sex": "M",
    "birth_date": "1950-06-01",
    "death_date": null,
    "deceased": "N",
    "position": "Overseer",
    "image_link": "https://example.org/p1.jpg",
    "perp_location": [
      with_audit(json!({
        "recid": "PL1",
        "end_date": "2001-12-31",
        "perp_recid": "P1",
        "start_date": "2001-03-01",
        "location_recid": "L1",
        "location": nairobi(),
      })),
      with_audit(json!({
        "recid": "PL2",
        "end_date": null,
        "perp_recid": "P1",
        "start_date": "2002-01-01",
        "location_recid": "L1",
        "location": nairobi(),
      })),
    ],
    "allegation": [
      with_audit(json!({ "recid": "A1", "description": "Claim", "perp_recid": "P1" })),
    ],
    "perp_note": [
      with_audit(json!({ "note": "Seen in 2003", "recid": "N1", "perp_recid": "P1" })),
    ],
    "public_reference": [
      with_audit(json!({
        "description_full": "Newspaper, 2004-05-01, p. 3",
        "recid": "R1",
        "perp_recid": "P1",
      })),
    ],
  }))
}

fn perp() -> Perp { serde_json::from_value(perp_json()).unwrap() }

fn kinds(report: &crate::validate::Report) -> Vec<&'static str> {
  report
    .iter()
    .map(|v| match v {
      Violation::EmptyRecid { .. } => "empty_recid",
      Violation::InvalidDate { .. } => "invalid_date",
      Violation::EmptyNullable { .. } => "empty_nullable",
      Violation::IntervalReversed { .. } => "interval_reversed",
      Violation::AuditRegression { .. } => "audit_regression",
      Violation::CountryMismatch { .. } => "country_mismatch",
      Violation::LocationMismatch { .. } => "location_mismatch",
      Violation::ParentMismatch { .. } => "parent_mismatch",
      Violation::DuplicateRecid { .. } => "duplicate_recid",
      Violation::DanglingReference { .. } => "dangling_reference",
    })
    .collect()
}

// ─── Aggregate shape ─────────────────────────────────────────────────────────

#[test]
fn well_formed_perp_is_valid() {
  let p = perp();
  assert_eq!(p.perp_location.len(), 2);
  assert_eq!(p.allegation.len(), 1);
  assert_eq!(p.perp_note.len(), 1);
  assert_eq!(p.public_reference.len(), 1);
  assert!(p.validate().is_valid(), "{:?}", p.validate());
}

#[test]
fn child_collections_default_to_empty() {
  let mut value = perp_json();
  let obj = value.as_object_mut().unwrap();
  for key in ["perp_location", "allegation", "perp_note", "public_reference"] {
    obj.remove(key);
  }
  let p: Perp = serde_json::from_value(value).unwrap();
  assert!(p.perp_location.is_empty());
  assert!(p.public_reference.is_empty());
  assert!(p.validate().is_valid());
}

#[test]
fn children_must_point_at_their_parent() {
  let mut p = perp();
  p.allegation[0].perp_recid = RecId::from("P2");

  let report = p.validate();
  assert_eq!(report.violations(), &[Violation::ParentMismatch {
    path:     "allegation[0].perp_recid".into(),
    expected: RecId::from("P1"),
    found:    RecId::from("P2"),
  }]);
}

#[test]
fn child_recids_are_unique_within_collection() {
  let mut p = perp();
  p.perp_location[1].recid = RecId::from("PL1");
  assert_eq!(kinds(&p.validate()), ["duplicate_recid"]);
}

#[test]
fn child_order_is_preserved() {
  let p = perp();
  let ids: Vec<_> = p.perp_location.iter().map(|pl| pl.recid.as_str()).collect();
  assert_eq!(ids, ["PL1", "PL2"]);
}

#[test]
fn missing_required_field_is_a_shape_error() {
  let mut value = perp_json();
  value.as_object_mut().unwrap().remove("position");
  assert!(serde_json::from_value::<Perp>(value).is_err());
}

#[test]
fn null_in_non_nullable_field_is_a_shape_error() {
  let mut value = perp_json();
  value["birth_date"] = Value::Null;
  assert!(serde_json::from_value::<Perp>(value).is_err());

  let mut value = perp_json();
  value["perp_location"][0]["start_date"] = Value::Null;
  assert!(serde_json::from_value::<Perp>(value).is_err());
}

#[test]
fn null_audit_field_is_a_shape_error() {
  let mut value = perp_json();
  value["changed_by"] = Value::Null;
  assert!(serde_json::from_value::<Perp>(value).is_err());
}

#[test]
fn unknown_fields_are_ignored() {
  let mut value = perp_json();
  value["perp_location"][0]["note"] = json!("from import");
  value["perp_location"][0]["location"]["state_recid"] = json!("S1");
  let p: Perp = serde_json::from_value(value).unwrap();
  assert_eq!(p, perp());
}

// ─── Intervals ───────────────────────────────────────────────────────────────

#[test]
fn reversed_interval_is_flagged() {
  let mut value = perp_json();
  value["perp_location"][0]["end_date"] = json!("2001-02-01");
  let p: Perp = serde_json::from_value(value).unwrap();

  let report = p.validate();
  assert_eq!(report.violations(), &[Violation::IntervalReversed {
    path:  "perp_location[0].end_date".into(),
    start: "2001-03-01".into(),
    end:   "2001-02-01".into(),
  }]);
}

#[test]
fn single_day_interval_is_valid() {
  let mut p = perp();
  p.perp_location[0].end_date = Some("2001-03-01".into());
  assert!(p.validate().is_valid());
}

#[test]
fn open_interval_is_valid_and_listed() {
  let p = perp();
  let open: Vec<_> = p.open_locations().map(|pl| pl.recid.as_str()).collect();
  assert_eq!(open, ["PL2"]);
}

#[test]
fn unparseable_start_date_is_flagged() {
  let mut p = perp();
  p.perp_location[0].start_date = "March 2001".into();
  assert_eq!(kinds(&p.validate()), ["invalid_date"]);
}

// ─── Embedded snapshots ──────────────────────────────────────────────────────

#[test]
fn embedded_country_must_match_foreign_key() {
  let location: Location = serde_json::from_value(json!({
    "name": "X",
    "recid": "L9",
    "country_recid": "C1",
    "country": { "recid": "C2", "name": "X" },
  }))
  .unwrap();

  assert_eq!(location.validate().violations(), &[Violation::CountryMismatch {
    path:     "country.recid".into(),
    expected: RecId::from("C1"),
    embedded: RecId::from("C2"),
  }]);
}

#[test]
fn embedded_location_must_match_foreign_key() {
  let mut p = perp();
  p.perp_location[1].location_recid = RecId::from("L2");
  assert_eq!(kinds(&p.validate()), ["location_mismatch"]);
}

#[test]
fn nested_snapshot_errors_carry_full_path() {
  let mut p = perp();
  p.perp_location[1].location.country.recid = RecId::from("C9");
  let report = p.validate();
  assert_eq!(
    report.violations()[0].to_string(),
    "perp_location[1].location.country.recid: embedded country C9 does not \
     match country_recid C1"
  );
}

#[test]
fn location_within_copies_the_country() {
  let country = Country { name: "Kenya".into(), recid: RecId::from("C1") };
  let location = Location::within(RecId::from("L1"), "Nairobi", &country);
  assert_eq!(location.country_recid, country.recid);
  assert_eq!(location.country, country);
  assert!(location.validate().is_valid());
}

// ─── Projection ──────────────────────────────────────────────────────────────

#[test]
fn projection_accepts_name_only_country() {
  let view = json!({
    "recid": "L1",
    "name": "Nairobi",
    "country": { "name": "Kenya" },
  });

  let projection: LocationType = serde_json::from_value(view.clone()).unwrap();
  assert_eq!(projection.country.name, "Kenya");
  assert!(projection.validate().is_valid());

  assert!(serde_json::from_value::<Location>(view).is_err());
}

#[test]
fn projection_of_location_drops_keys() {
  let location: Location = serde_json::from_value(nairobi()).unwrap();
  let projection = location.projection();
  assert_eq!(
    serde_json::to_value(&projection).unwrap(),
    json!({ "recid": "L1", "name": "Nairobi", "country": { "name": "Kenya" } })
  );
}

// ─── Round trip ──────────────────────────────────────────────────────────────

#[test]
fn round_trip_preserves_every_field() {
  let p = perp();
  let encoded = to_json(&p).unwrap();
  let decoded: Perp = decode_valid(&encoded).unwrap();
  assert_eq!(decoded, p);

  let reencoded: Value = serde_json::from_str(&encoded).unwrap();
  assert_eq!(reencoded, perp_json());
}

#[test]
fn numeric_looking_recids_stay_strings() {
  let mut value = perp_json();
  value["recid"] = json!("000123");
  for child in ["allegation", "perp_note", "public_reference"] {
    value[child][0]["perp_recid"] = json!("000123");
  }
  for i in 0..2 {
    value["perp_location"][i]["perp_recid"] = json!("000123");
  }

  let p: Perp = serde_json::from_value(value).unwrap();
  let out = serde_json::to_value(&p).unwrap();
  assert_eq!(out["recid"], json!("000123"));
  assert!(p.validate().is_valid());
}

#[test]
fn numeric_recid_is_rejected() {
  let mut value = perp_json();
  value["recid"] = json!(123);
  let err = from_json::<Perp>(&value.to_string()).unwrap_err();
  assert!(matches!(err, Error::Shape(_)));
}

#[test]
fn decode_valid_rejects_invariant_breaks() {
  let mut value = perp_json();
  value["perp_location"][0]["end_date"] = json!("2001-02-01");
  let err = decode_valid::<Perp>(&value.to_string()).unwrap_err();
  let Error::Invalid(report) = err else { panic!("expected Invalid") };
  assert_eq!(report.len(), 1);
}

// ─── Nullability ─────────────────────────────────────────────────────────────

#[test]
fn null_and_absent_death_date_are_equivalent() {
  let mut value = perp_json();
  value.as_object_mut().unwrap().remove("death_date");
  let p: Perp = serde_json::from_value(value).unwrap();
  assert_eq!(p.death_date, None);
  assert!(p.validate().is_valid());
}

#[test]
fn empty_death_date_is_not_null() {
  let mut value = perp_json();
  value["death_date"] = json!("");
  let p: Perp = serde_json::from_value(value).unwrap();

  assert_eq!(p.death_date.as_deref(), Some(""));
  assert_eq!(p.validate().violations(), &[Violation::EmptyNullable {
    path: "death_date".into(),
  }]);

  // Re-encoding keeps the empty string.
  let out = serde_json::to_value(&p).unwrap();
  assert_eq!(out["death_date"], json!(""));
}

#[test]
fn empty_end_date_is_not_null() {
  let mut p = perp();
  p.perp_location[0].end_date = Some(String::new());
  assert_eq!(kinds(&p.validate()), ["empty_nullable"]);
}

/// `deceased` duplicates `death_date` with no rule tying them together.
/// Neither direction of disagreement is reported or repaired.
#[test]
fn deceased_flag_is_not_reconciled_with_death_date() {
  let mut p = perp();
  p.deceased = "N".into();
  p.death_date = Some("2010-01-01".into());
  assert!(p.validate().is_valid());
  assert_eq!(p.deceased, "N");

  p.deceased = "Y".into();
  p.death_date = None;
  assert!(p.validate().is_valid());
  assert_eq!(p.death_date, None);
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[test]
fn audit_fields_are_flattened_on_the_wire() {
  let out = serde_json::to_value(perp()).unwrap();
  assert_eq!(out["created_by"], json!("script"));
  assert!(out.get("audit").is_none());
}

#[test]
fn regressed_audit_is_flagged() {
  let mut p = perp();
  p.perp_note[0].audit.changed_date = "2025-04-06T10:00:00Z".into();
  let report = p.validate();
  assert_eq!(report.violations(), &[Violation::AuditRegression {
    path:    "perp_note[0].changed_date".into(),
    created: "2025-04-07T10:00:00Z".into(),
    changed: "2025-04-06T10:00:00Z".into(),
  }]);
}

#[test]
fn touch_through_audited_trait() {
  let mut p = perp();
  let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
  p.public_reference[0].touch("editor", at).unwrap();
  assert_eq!(p.public_reference[0].audit().changed_by, "editor");
  assert!(p.validate().is_valid());
}

#[test]
fn fresh_children_validate() {
  let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
  let mut p = perp();
  p.allegation.push(Allegation {
    recid:       RecId::from("A2"),
    description: "Second claim".into(),
    perp_recid:  p.recid.clone(),
    audit:       Audit::created("editor", at),
  });
  p.perp_note.push(PerpNote {
    note:       "Follow-up".into(),
    recid:      RecId::from("N2"),
    perp_recid: p.recid.clone(),
    audit:      Audit::created("editor", at),
  });
  p.public_reference.push(PublicReference {
    description_full: "Court record".into(),
    recid:            RecId::from("R2"),
    perp_recid:       p.recid.clone(),
    audit:            Audit::created("editor", at),
  });
  assert!(p.validate().is_valid());
}

// ─── Record sets ─────────────────────────────────────────────────────────────

fn record_set() -> RecordSet {
  serde_json::from_value(json!({
    "country": [kenya()],
    "location": [nairobi()],
    "perp": [perp_json()],
  }))
  .unwrap()
}

#[test]
fn consistent_record_set_passes() {
  let set = record_set();
  assert!(set.check().is_valid(), "{:?}", set.check());
}

#[test]
fn dangling_location_reference_is_flagged() {
  let mut set = record_set();
  let pl: &mut PerpLocation = &mut set.perp[0].perp_location[0];
  pl.location_recid = RecId::from("L404");
  pl.location.recid = RecId::from("L404");

  let report = set.check();
  assert_eq!(report.violations(), &[Violation::DanglingReference {
    path:   "perp[0].perp_location[0].location_recid".into(),
    entity: "location".into(),
    recid:  RecId::from("L404"),
  }]);
}

#[test]
fn dangling_country_reference_is_flagged() {
  let mut set = record_set();
  set.country.clear();
  let report = set.check();
  // The canonical location plus both embedded snapshots.
  assert_eq!(kinds(&report), [
    "dangling_reference",
    "dangling_reference",
    "dangling_reference"
  ]);
  assert!(report.iter().any(|v| v.to_string().starts_with("location[0].country_recid")));
}

#[test]
fn duplicate_countries_are_flagged() {
  let mut set = record_set();
  set.country.push(Country { name: "Kenya again".into(), recid: RecId::from("C1") });
  assert_eq!(kinds(&set.check()), ["duplicate_recid"]);
}

#[test]
fn child_recids_are_unique_across_perps() {
  let mut set = record_set();
  let mut other = perp();
  other.recid = RecId::from("P2");
  other.perp_location.clear();
  other.perp_note.clear();
  other.public_reference.clear();
  other.allegation[0].perp_recid = RecId::from("P2");
  set.perp.push(other);

  let report = set.check();
  assert_eq!(report.violations(), &[Violation::DuplicateRecid {
    path:  "perp[1].allegation[0].recid".into(),
    recid: RecId::from("A1"),
  }]);
}

#[test]
fn stale_snapshot_name_is_tolerated() {
  let mut set = record_set();
  set.country[0].name = "Republic of Kenya".into();
  assert!(set.check().is_valid());
}

#[test]
fn record_set_lookups() {
  let set = record_set();
  assert_eq!(set.perp_named("John Doe").map(|p| p.recid.as_str()), Some("P1"));
  assert!(set.perp_named("Jane Doe").is_none());
  assert_eq!(
    set.location_named("Kenya", "Nairobi").map(|l| l.recid.as_str()),
    Some("L1")
  );
  assert!(set.location_named("Uganda", "Nairobi").is_none());
  assert!(set.country(&RecId::from("C1")).is_some());
  assert!(set.perp(&RecId::from("P1")).is_some());
}

#[test]
fn same_named_locations_are_all_listed() {
  let mut set = record_set();
  let kenya = set.country[0].clone();
  set.location.push(Location::within(RecId::from("L2"), "Nairobi", &kenya));

  let ids: Vec<_> = set
    .locations_named("Kenya", "Nairobi")
    .iter()
    .map(|l| l.recid.as_str())
    .collect();
  assert_eq!(ids, ["L1", "L2"]);
  assert_eq!(
    set.location_named("Kenya", "Nairobi").map(|l| l.recid.as_str()),
    Some("L1")
  );
  assert!(set.locations_named("Uganda", "Nairobi").is_empty());
}
