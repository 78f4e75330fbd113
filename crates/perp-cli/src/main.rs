//! `perp` — validate perp record sets and import location sheets.
//!
//! # Usage
//!
//! ```
//! perp validate records.json
//! perp extract-locations "John Doe_from_txt.txt" > locations.psv
//! perp import-locations --records records.json --format sql < locations.psv
//! perp export-sql --records records.json
//! perp resolve-place "Provo, United States"
//! perp period --year 2003 --month Winter
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=debug` to see per-row decisions.

mod settings;

use std::{
  fs::File,
  io::{self, BufReader},
  path::{Path, PathBuf},
  process::ExitCode,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use perp_core::{
  integrity::RecordSet,
  recid::{RandomRecIds, RecIdSource, SequentialRecIds},
  wire,
};
use perp_import::{Gazetteer, LocationImporter, NoteExtractor, Period, SqlWriter, write_rows};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Perp record tooling")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "perp.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Check a JSON record set and print every violation.
  Validate {
    /// JSON file with `country`, `location` and `perp` arrays.
    file: PathBuf,
  },

  /// Read a pipe-delimited location sheet on stdin and emit perp_location
  /// records.
  ImportLocations {
    /// JSON record set used to look up perps and locations.
    #[arg(long, value_name = "FILE")]
    records: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Sql)]
    format: Format,

    /// Four hex digits; switches to date-stamped sequential recids.
    #[arg(long, value_name = "TAG")]
    sequence_tag: Option<String>,
  },

  /// Write every country, location and perp_location of a JSON record set as
  /// SQL `INSERT`s. The set must pass `validate` first.
  ExportSql {
    #[arg(long, value_name = "FILE")]
    records: PathBuf,
  },

  /// Turn a perp's notes file into a pipe-delimited location sheet on stdout.
  ExtractLocations {
    /// Notes named `<Perp Name>_from_txt.txt` or `<Perp Name>_from_pdf.txt`.
    file: PathBuf,

    /// Perp name to use instead of the one in the file name.
    #[arg(long)]
    perp: Option<String>,
  },

  /// Resolve free text to `country|state|location`.
  ResolvePlace { text: String },

  /// Resolve sheet date cells to `start|end`.
  Period {
    #[arg(long)]
    year:  String,
    #[arg(long, default_value = "")]
    month: String,
    /// Start day as `M/D`.
    #[arg(long, default_value = "")]
    start: String,
    /// End day as `M/D`.
    #[arg(long, default_value = "")]
    end:   String,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
  Sql,
  Json,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<ExitCode> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to read config {:?}", cli.config))?;

  match cli.command {
    Command::Validate { file } => validate(&file),
    Command::ImportLocations { records, format, sequence_tag } => {
      import_locations(&settings, &records, format, sequence_tag.as_deref())?;
      Ok(ExitCode::SUCCESS)
    }
    Command::ExportSql { records } => export_sql(&settings, &records),
    Command::ExtractLocations { file, perp } => {
      extract_locations(&settings, &file, perp)?;
      Ok(ExitCode::SUCCESS)
    }
    Command::ResolvePlace { text } => {
      let placement = gazetteer(&settings)?.resolve(&text);
      println!(
        "{}|{}|{}",
        placement.country.unwrap_or_default(),
        placement.state.unwrap_or_default(),
        placement.location.unwrap_or_default()
      );
      Ok(ExitCode::SUCCESS)
    }
    Command::Period { year, month, start, end } => {
      let period = Period::resolve(&year, &month, &start, &end)?;
      println!("{}|{}", period.start_date(), period.end_date().unwrap_or_default());
      Ok(ExitCode::SUCCESS)
    }
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

fn validate(file: &Path) -> anyhow::Result<ExitCode> {
  let records = load_records(file)?;
  let report = records.check();

  for violation in &report {
    println!("{violation}");
  }

  if report.is_valid() {
    tracing::info!(
      countries = records.country.len(),
      locations = records.location.len(),
      perps = records.perp.len(),
      "record set is valid"
    );
    Ok(ExitCode::SUCCESS)
  } else {
    tracing::warn!(violations = report.len(), "record set is invalid");
    Ok(ExitCode::FAILURE)
  }
}

fn import_locations(
  settings: &Settings,
  records: &Path,
  format: Format,
  sequence_tag: Option<&str>,
) -> anyhow::Result<()> {
  let sql = sql_writer(settings, format)?;
  let now = Utc::now();
  match sequence_tag {
    Some(tag) => {
      let mut ids = SequentialRecIds::new(now.date_naive(), tag)?;
      run_import(settings, records, sql.as_ref(), &mut ids)
    }
    None => run_import(settings, records, sql.as_ref(), &mut RandomRecIds),
  }
}

/// `sql` is `None` for JSON output.
fn run_import(
  settings: &Settings,
  records: &Path,
  sql: Option<&SqlWriter>,
  ids: &mut impl RecIdSource,
) -> anyhow::Result<()> {
  let records = load_records(records)?;
  let gazetteer = gazetteer(settings)?;
  let importer = LocationImporter::new(&records, &gazetteer, settings.author.as_str());

  let summary = importer
    .import_all(io::stdin().lock(), ids, Utc::now())
    .context("failed to import location sheet")?;

  match sql {
    Some(sql) => {
      for item in &summary.imported {
        println!("{}", sql.perp_location(&item.record, item.note.as_deref()));
      }
    }
    None => println!("{}", wire::to_json_pretty(&summary.imported)?),
  }
  Ok(())
}

fn export_sql(settings: &Settings, records: &Path) -> anyhow::Result<ExitCode> {
  let sql = SqlWriter::new(settings.schema.as_str())?;
  let records = load_records(records)?;

  let report = records.check();
  if !report.is_valid() {
    for violation in &report {
      tracing::warn!("{violation}");
    }
    tracing::warn!(violations = report.len(), "record set is invalid, nothing exported");
    return Ok(ExitCode::FAILURE);
  }

  for statement in sql.record_set(&records) {
    println!("{statement}");
  }
  Ok(ExitCode::SUCCESS)
}

fn extract_locations(settings: &Settings, file: &Path, perp: Option<String>) -> anyhow::Result<()> {
  let gazetteer = gazetteer(settings)?;
  let notes = NoteExtractor::new(&gazetteer)?;

  let perp = perp
    .or_else(|| notes.perp_name_from_file(file))
    .with_context(|| format!("no perp name in {file:?}; pass --perp"))?;

  let reader = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
  let rows = notes
    .extract(&perp, BufReader::new(reader))
    .with_context(|| format!("failed to read {file:?}"))?;

  let matched = rows.iter().filter(|r| r.is_matched()).count();
  tracing::info!(
    %perp,
    matched,
    unmatched = rows.len() - matched,
    "extracted location rows"
  );

  write_rows(io::stdout().lock(), &rows)?;
  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn load_records(path: &Path) -> anyhow::Result<RecordSet> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {path:?}"))?;
  wire::from_json(&raw).with_context(|| format!("failed to decode {path:?}"))
}

/// Built before any input is read so a bad schema fails the run up front.
fn sql_writer(settings: &Settings, format: Format) -> anyhow::Result<Option<SqlWriter>> {
  match format {
    Format::Sql => {
      let sql = SqlWriter::new(settings.schema.as_str())
        .with_context(|| format!("invalid schema {:?}", settings.schema))?;
      Ok(Some(sql))
    }
    Format::Json => Ok(None),
  }
}

fn gazetteer(settings: &Settings) -> anyhow::Result<Gazetteer> {
  match &settings.gazetteer {
    Some(path) => Gazetteer::load(path)
      .with_context(|| format!("failed to load gazetteer {path:?}")),
    None => Gazetteer::bundled().context("failed to load bundled gazetteer"),
  }
}
