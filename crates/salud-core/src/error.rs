//! Error types for `salud-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown column: {0:?}")]
  UnknownColumn(String),

  #[error("unknown dimension table: {0:?}")]
  UnknownDimension(String),

  #[error("month out of range: {0}")]
  MonthOutOfRange(u32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
