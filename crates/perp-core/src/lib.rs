//! Core record types and invariant checks for the perp record store.
//!
//! This crate has no I/O, logging, or database dependencies. The import
//! tooling and the CLI depend on it; it depends on nothing project-specific.
//!
//! Records are plain owned values. Foreign keys are `*_recid` strings, and the
//! embedded `country`/`location` objects are snapshot copies, never shared
//! references to the canonical record.

pub mod audit;
pub mod date;
pub mod error;
pub mod integrity;
pub mod perp;
pub mod place;
pub mod recid;
pub mod validate;
pub mod wire;

pub use error::{Error, Result};
pub use recid::RecId;

#[cfg(test)]
mod tests;
