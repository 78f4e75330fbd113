//! Import tooling for perp location records.
//!
//! Turns the pipe-delimited location sheets produced by manual research into
//! validated [`PerpLocation`](perp_core::perp::PerpLocation) records, and
//! renders records as SQL `INSERT` text for bulk loading. Pure synchronous;
//! nothing here opens a database connection.
//!
//! # Pipeline
//!
//! ```text
//! notes::NoteExtractor       → LocationRow sheet (rows::write_rows)
//! rows::read_rows()          → LocationRow
//!   └─ LocationImporter      → perp lookup, place lookup, period::Period
//!        └─ ImportedLocation → sql::SqlWriter / JSON
//! ```

pub mod error;
pub mod gazetteer;
pub mod import;
pub mod notes;
pub mod period;
pub mod rows;
pub mod sql;

pub use error::{Error, Result};
pub use gazetteer::{Gazetteer, Placement};
pub use import::{ImportSummary, ImportedLocation, LocationImporter, Outcome, Skip};
pub use notes::{NoteExtractor, YearLine};
pub use period::Period;
pub use rows::{LocationRow, read_rows, write_rows};
pub use sql::SqlWriter;
