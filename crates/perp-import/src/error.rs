//! Error types for `perp-import`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] perp_core::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("gazetteer error: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("pattern error: {0}")]
  Regex(#[from] regex::Error),

  #[error("invalid year: {0:?}")]
  InvalidYear(String),

  #[error("invalid SQL schema name: {0:?}")]
  InvalidSchema(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
