//! Stage 1: raw CSV → cleaned CSV.

use std::path::Path;

use salud_core::clean::{CleanReport, QualityProfile, clean, profile};
use tracing::{info, warn};

use crate::{Result, io};

pub fn run(input: &Path, output: &Path) -> Result<CleanReport> {
  info!(path = %input.display(), "loading raw data");
  let records = io::read_records(input)?;
  info!("✅ {} rows loaded", records.len());

  log_profile(&profile(&records));

  let (cleaned, report) = clean(records);
  log_report(&report);

  io::write_records(output, &cleaned)?;
  info!(path = %output.display(), "✅ cleaned data written ({} rows)", cleaned.len());
  Ok(report)
}

fn log_profile(profile: &QualityProfile) {
  info!("data quality before cleaning: {} rows", profile.total_rows);
  if profile.missing.is_empty() {
    info!("✅ no missing values");
  }
  for (column, count) in &profile.missing {
    warn!(
      "⚠️ {}: {count} missing ({:.2}%)",
      column.header(),
      profile.missing_pct(*count)
    );
  }
  if profile.duplicates > 0 {
    warn!("⚠️ {} duplicate rows", profile.duplicates);
  }
}

fn log_report(report: &CleanReport) {
  info!("removed {} exact duplicates", report.duplicates_removed);
  if report.normalized_duplicates > 0 {
    info!("removed {} duplicates after normalisation", report.normalized_duplicates);
  }
  for (column, count) in &report.missing_removed {
    info!("removed {count} rows missing {}", column.header());
  }
  info!("removed {} rows with invalid Gender", report.invalid_gender);
  info!("removed {} rows with invalid Days_Indoors", report.invalid_days_indoors);

  info!(
    initial = report.initial_rows,
    removed = report.removed(),
    final_rows = report.final_rows,
    "✅ cleaning complete: {} of {} rows removed ({:.2}%)",
    report.removed(),
    report.initial_rows,
    report.removed_pct(),
  );
}
