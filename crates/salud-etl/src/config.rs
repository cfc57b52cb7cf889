//! Pipeline configuration.
//!
//! Values come from an optional TOML file layered under `SALUD_*`
//! environment variables (`SALUD_DATABASE_PATH`,
//! `SALUD_DIMENSION_MINIMUMS__PAIS`, …). Every field has a default, so an
//! absent file is not an error.

use std::path::{Path, PathBuf};

use salud_core::dimension::Dimension;
use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "salud-etl.toml";

/// Runtime configuration for every stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
  pub database_path:      PathBuf,
  pub raw_csv_path:       PathBuf,
  pub clean_csv_path:     PathBuf,
  pub export_csv_path:    PathBuf,
  pub log_dir:            PathBuf,
  pub log_file:           String,
  /// Rows per staging transaction.
  pub batch_size:         usize,
  pub dimension_minimums: DimensionMinimums,
}

impl Default for EtlConfig {
  fn default() -> Self {
    Self {
      database_path:      "data/dw_salud_mental.sqlite3".into(),
      raw_csv_path:       "data/raw/mental_health.csv".into(),
      clean_csv_path:     "data/processed/mental_health_clean.csv".into(),
      export_csv_path:    "data/export/powerbi_export.csv".into(),
      log_dir:            "logs".into(),
      log_file:           "etl_log.txt".into(),
      batch_size:         1000,
      dimension_minimums: DimensionMinimums::default(),
    }
  }
}

/// Rows each dimension must hold before facts are aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DimensionMinimums {
  pub tiempo:      i64,
  pub genero:      i64,
  pub historial:   i64,
  pub ocupacion:   i64,
  pub pais:        i64,
  pub aislamiento: i64,
  pub sintomas:    i64,
  pub acceso:      i64,
}

impl Default for DimensionMinimums {
  fn default() -> Self {
    Self {
      tiempo:      12,
      genero:      2,
      historial:   2,
      ocupacion:   5,
      pais:        35,
      aislamiento: 5,
      sintomas:    1,
      acceso:      1,
    }
  }
}

impl DimensionMinimums {
  pub fn for_dimension(&self, dimension: Dimension) -> i64 {
    match dimension {
      Dimension::Time => self.tiempo,
      Dimension::Gender => self.genero,
      Dimension::History => self.historial,
      Dimension::Occupation => self.ocupacion,
      Dimension::Country => self.pais,
      Dimension::Isolation => self.aislamiento,
      Dimension::Symptoms => self.sintomas,
      Dimension::Access => self.acceso,
    }
  }
}

impl EtlConfig {
  /// Load from `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(
        config::Environment::with_prefix("SALUD")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;

    let cfg: EtlConfig = settings.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> Result<()> {
    if self.batch_size == 0 {
      return Err(Error::Config("batch_size must be at least 1".into()));
    }
    if self.log_file.trim().is_empty() {
      return Err(Error::Config("log_file must not be empty".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  fn toml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = EtlConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.batch_size, 1000);
    assert_eq!(cfg.log_dir.join(&cfg.log_file), PathBuf::from("logs/etl_log.txt"));
    assert_eq!(cfg.dimension_minimums, DimensionMinimums::default());
  }

  #[test]
  fn file_values_override_defaults() {
    let file = toml_file(
      r#"
database_path = "warehouse.sqlite3"
batch_size = 250

[dimension_minimums]
pais = 30
"#,
    );
    let cfg = EtlConfig::load(file.path()).unwrap();
    assert_eq!(cfg.database_path, PathBuf::from("warehouse.sqlite3"));
    assert_eq!(cfg.batch_size, 250);
    assert_eq!(cfg.dimension_minimums.for_dimension(Dimension::Country), 30);
    assert_eq!(cfg.dimension_minimums.for_dimension(Dimension::Time), 12);
    assert_eq!(cfg.raw_csv_path, EtlConfig::default().raw_csv_path);
  }

  #[test]
  fn zero_batch_size_is_rejected() {
    let file = toml_file("batch_size = 0\n");
    assert!(matches!(EtlConfig::load(file.path()), Err(Error::Config(_))));
  }

  #[test]
  fn default_minimums_match_dimension_order() {
    let m = DimensionMinimums::default();
    let all = Dimension::ALL.map(|d| m.for_dimension(d));
    assert_eq!(all, [12, 2, 2, 5, 35, 5, 1, 1]);
  }
}
