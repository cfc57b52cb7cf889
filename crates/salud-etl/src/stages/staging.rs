//! Stage 2: cleaned CSV → staging table, in independently committed batches.

use std::path::Path;

use salud_core::{
  record::{CRITICAL_COLUMNS, SurveyRecord},
  store::{STAGING_TABLE, StagingProfile, StagingStore},
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{Error, Result, io};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagingReport {
  pub source_rows:    usize,
  pub inserted_rows:  usize,
  pub batches:        usize,
  pub failed_batches: usize,
  /// Rows in batches that were rolled back.
  pub rows_lost:      usize,
}

/// Read `input` and load it into staging, then check what landed.
pub async fn run<S: StagingStore>(
  store: &S,
  input: &Path,
  batch_size: usize,
) -> Result<StagingReport> {
  let records = io::read_records(input)?;
  info!(path = %input.display(), "✅ {} cleaned rows read", records.len());

  let report = load(store, &records, batch_size).await?;
  verify(store, report.source_rows).await?;
  Ok(report)
}

/// Replace the staging contents with `records`.
///
/// A failing batch is rolled back by the store and counted; loading carries
/// on with the next one.
pub async fn load<S: StagingStore>(
  store: &S,
  records: &[SurveyRecord],
  batch_size: usize,
) -> Result<StagingReport> {
  if batch_size == 0 {
    return Err(Error::Config("batch_size must be at least 1".into()));
  }
  if !store.staging_exists().await.map_err(Error::store)? {
    error!("❌ table {STAGING_TABLE} does not exist");
    return Err(Error::MissingTable(STAGING_TABLE));
  }

  store.truncate_staging().await.map_err(Error::store)?;
  info!("✅ {STAGING_TABLE} truncated");

  let mut report = StagingReport { source_rows: records.len(), ..Default::default() };
  for (i, batch) in records.chunks(batch_size).enumerate() {
    report.batches += 1;
    match store.insert_staging_batch(batch).await {
      Ok(n) => {
        report.inserted_rows += n;
        info!(batch = i + 1, "inserted {} / {} rows", report.inserted_rows, records.len());
      }
      Err(e) => {
        report.failed_batches += 1;
        report.rows_lost += batch.len();
        error!(batch = i + 1, "❌ batch rolled back ({} rows): {e}", batch.len());
      }
    }
  }

  if report.failed_batches == 0 {
    info!("✅ {} rows loaded in {} batches", report.inserted_rows, report.batches);
  } else {
    warn!(
      "⚠️ {} rows loaded; {} of {} batches failed, {} rows lost",
      report.inserted_rows, report.failed_batches, report.batches, report.rows_lost
    );
  }
  Ok(report)
}

/// Profile the staging table and log how it compares with the source.
pub async fn verify<S: StagingStore>(store: &S, expected_rows: usize) -> Result<StagingProfile> {
  let profile = store.staging_profile().await.map_err(Error::store)?;

  if profile.row_count == expected_rows as i64 {
    info!("✅ row count matches: {}", profile.row_count);
  } else {
    warn!("⚠️ row count mismatch: expected {expected_rows}, found {}", profile.row_count);
  }

  let mut clean = true;
  for column in CRITICAL_COLUMNS {
    let nulls = profile.nulls_in(column);
    if nulls > 0 {
      clean = false;
      warn!("⚠️ {}: {nulls} NULL values", column.header());
    }
  }
  if clean {
    info!("✅ no NULL values in critical columns");
  }

  for (gender, count) in &profile.by_gender {
    info!("gender {gender}: {count}");
  }
  match (profile.earliest, profile.latest) {
    (Some(lo), Some(hi)) => info!("timestamps from {lo} to {hi}"),
    _ => warn!("⚠️ no parseable timestamps in staging"),
  }
  for (country, count) in &profile.top_countries {
    info!("country {country}: {count}");
  }

  Ok(profile)
}
