//! `salud-etl` binary.
//!
//! Reads `salud-etl.toml` (or the path given with `--config`) layered under
//! `SALUD_*` environment variables, then runs one pipeline stage or all of
//! them:
//!
//! ```text
//! salud-etl init
//! salud-etl run
//! salud-etl validate --json reports/validation.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use salud_etl::{
  EtlConfig,
  config::DEFAULT_CONFIG_FILE,
  logging,
  stages::{clean, dimensions, export, facts, staging, validate},
};
use salud_store_sqlite::SqliteWarehouse;
use tracing::{Instrument as _, error, info};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Mental-health survey warehouse ETL")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
  config: PathBuf,

  /// Warehouse database file; overrides `database_path`.
  #[arg(long, global = true)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the warehouse schema.
  Init,
  /// Stage 1: raw CSV to cleaned CSV.
  Clean {
    #[arg(long)]
    input:  Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
  },
  /// Stage 2: cleaned CSV to the staging table.
  Stage {
    #[arg(long)]
    input: Option<PathBuf>,
  },
  /// Stage 3: rebuild the dimension tables.
  Dimensions,
  /// Stage 4: aggregate staging into the fact table.
  Facts,
  /// Stage 5: check the warehouse and report.
  Validate {
    /// Also write the report as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
  },
  /// Write the denormalised fact export.
  Export {
    #[arg(long)]
    output: Option<PathBuf>,
  },
  /// `init`, every stage in order, then `export`.
  Run,
}

impl Command {
  fn name(&self) -> &'static str {
    match self {
      Command::Init => "init",
      Command::Clean { .. } => "clean",
      Command::Stage { .. } => "stage",
      Command::Dimensions => "dimensions",
      Command::Facts => "facts",
      Command::Validate { .. } => "validate",
      Command::Export { .. } => "export",
      Command::Run => "run",
    }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let mut cfg = EtlConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  if let Some(database) = cli.database {
    cfg.database_path = database;
  }

  let _guard = logging::init(&cfg.log_dir, &cfg.log_file).context("failed to initialise logging")?;

  let span = tracing::info_span!(
    "pipeline",
    run_id = %Uuid::new_v4(),
    stage = cli.command.name(),
  );

  let result = execute(cli.command, &cfg).instrument(span.clone()).await;
  if let Err(e) = &result {
    span.in_scope(|| error!("❌ {e:#}"));
  }
  result
}

async fn execute(command: Command, cfg: &EtlConfig) -> anyhow::Result<()> {
  match command {
    Command::Init => {
      open_warehouse(&cfg.database_path).await?.init_schema().await?;
      info!(path = %cfg.database_path.display(), "✅ warehouse schema ready");
    }
    Command::Clean { input, output } => {
      let input = input.unwrap_or_else(|| cfg.raw_csv_path.clone());
      let output = output.unwrap_or_else(|| cfg.clean_csv_path.clone());
      clean::run(&input, &output).context("cleaning failed")?;
    }
    Command::Stage { input } => {
      let input = input.unwrap_or_else(|| cfg.clean_csv_path.clone());
      let warehouse = open_warehouse(&cfg.database_path).await?;
      staging::run(&warehouse, &input, cfg.batch_size).await.context("staging load failed")?;
    }
    Command::Dimensions => {
      let warehouse = open_warehouse(&cfg.database_path).await?;
      dimensions::run(&warehouse).await.context("dimension load failed")?;
    }
    Command::Facts => {
      let warehouse = open_warehouse(&cfg.database_path).await?;
      facts::run(&warehouse, &cfg.dimension_minimums).await.context("fact load failed")?;
    }
    Command::Validate { json } => {
      let warehouse = open_warehouse(&cfg.database_path).await?;
      let report = validate::run(&warehouse).await.context("validation failed")?;
      if let Some(path) = json {
        report.write_json(&path).with_context(|| format!("failed to write {path:?}"))?;
        info!(path = %path.display(), "validation report written");
      }
    }
    Command::Export { output } => {
      let output = output.unwrap_or_else(|| cfg.export_csv_path.clone());
      let warehouse = open_warehouse(&cfg.database_path).await?;
      export::run(&warehouse, &output).await.context("export failed")?;
    }
    Command::Run => run_all(cfg).await?,
  }
  Ok(())
}

async fn run_all(cfg: &EtlConfig) -> anyhow::Result<()> {
  let warehouse = open_warehouse(&cfg.database_path).await?;
  warehouse.init_schema().await?;

  info!("[1/6] cleaning");
  clean::run(&cfg.raw_csv_path, &cfg.clean_csv_path).context("cleaning failed")?;

  info!("[2/6] staging load");
  staging::run(&warehouse, &cfg.clean_csv_path, cfg.batch_size)
    .await
    .context("staging load failed")?;

  info!("[3/6] dimensions");
  dimensions::run(&warehouse).await.context("dimension load failed")?;

  info!("[4/6] facts");
  facts::run(&warehouse, &cfg.dimension_minimums).await.context("fact load failed")?;

  info!("[5/6] validation");
  validate::run(&warehouse).await.context("validation failed")?;

  info!("[6/6] export");
  export::run(&warehouse, &cfg.export_csv_path).await.context("export failed")?;

  info!("✅ pipeline complete");
  Ok(())
}

/// Open the warehouse, creating its parent directory if needed.
async fn open_warehouse(path: &Path) -> anyhow::Result<SqliteWarehouse> {
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
  }
  SqliteWarehouse::open(path)
    .await
    .with_context(|| format!("failed to open warehouse at {path:?}"))
}
