//! Runtime settings: an optional TOML file overlaid by `PERP_*` variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Written into `created_by` and `changed_by` of imported records.
  pub author:    String,
  /// Schema prefix for generated SQL.
  pub schema:    String,
  /// Catalogue to use instead of the bundled one.
  pub gazetteer: Option<PathBuf>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      author:    "script".to_string(),
      schema:    "public".to_string(),
      gazetteer: None,
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then apply `PERP_AUTHOR`, `PERP_SCHEMA` and
  /// `PERP_GAZETTEER`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(Environment::with_prefix("PERP")),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder.build()?.try_deserialize()
  }
}
