//! JSON encoding of records.
//!
//! Field names on the wire are exactly the struct field names. Nested
//! `country`/`location` snapshots are embedded inline. Unknown fields are
//! ignored so rows carrying extra columns still decode.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Result, validate::Validate};

/// Decode a record, checking shape only.
pub fn from_json<T: DeserializeOwned>(input: &str) -> Result<T> {
  Ok(serde_json::from_str(input)?)
}

/// Decode a record and reject it unless it also passes [`Validate`].
pub fn decode_valid<T: DeserializeOwned + Validate>(input: &str) -> Result<T> {
  let record: T = from_json(input)?;
  record.validate().into_result()?;
  Ok(record)
}

pub fn to_json<T: Serialize>(record: &T) -> Result<String> {
  Ok(serde_json::to_string(record)?)
}

pub fn to_json_pretty<T: Serialize>(record: &T) -> Result<String> {
  Ok(serde_json::to_string_pretty(record)?)
}
