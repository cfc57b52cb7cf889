//! Log sinks: standard output plus one append-only file shared by every
//! stage.
//!
//! The filter defaults to `info` and honours `RUST_LOG`. The returned guard
//! flushes the file writer when dropped, so hold it until the process exits.

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use crate::Result;

pub fn init(log_dir: &Path, log_file: &str) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir)?;

  // `never` rotates nothing: one file, opened for append.
  let appender = tracing_appender::rolling::never(log_dir, log_file);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  let stdout_layer = fmt::layer().with_target(false);
  let file_layer = fmt::layer().with_target(false).with_ansi(false).with_writer(writer);

  tracing_subscriber::registry()
    .with(filter)
    .with(stdout_layer)
    .with(file_layer)
    .try_init()?;

  Ok(guard)
}
