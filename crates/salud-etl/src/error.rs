//! Error type for `salud-etl`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Any failure reported by the warehouse backend.
  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync>),

  #[error("input file not found: {}", .0.display())]
  MissingInput(PathBuf),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// An expected warehouse table has not been created.
  #[error("table {0} does not exist; run `salud-etl init` first")]
  MissingTable(&'static str),

  /// One or more dimensions hold fewer rows than the fact load requires.
  #[error("insufficient dimension rows: {}", .0.join(", "))]
  InsufficientDimensions(Vec<String>),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("logging setup failed: {0}")]
  Logging(#[from] tracing_subscriber::util::TryInitError),
}

impl Error {
  /// Box a backend error.
  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Store(Box::new(err))
  }
}

impl From<config::ConfigError> for Error {
  fn from(err: config::ConfigError) -> Self { Error::Config(err.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
