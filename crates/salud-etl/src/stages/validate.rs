//! Stage 5: read-only checks over the loaded warehouse.
//!
//! Findings are logged and collected in a [`ValidationReport`]; none of them
//! is an error. Only a failing store call aborts validation.

use std::path::Path;

use salud_core::{
  dimension::Dimension,
  fact::{COUNT_COLUMNS, PERCENT_COLUMNS},
  store::{SymptomRuleCheck, Table, Warehouse, WarehouseStats},
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{Error, Result};

/// Minimum rows expected in each table of a complete load.
pub const VOLUME_THRESHOLDS: [(Table, i64); 10] = [
  (Table::Staging, 10_000),
  (Table::Dimension(Dimension::Time), 24),
  (Table::Dimension(Dimension::Gender), 2),
  (Table::Dimension(Dimension::History), 2),
  (Table::Dimension(Dimension::Occupation), 5),
  (Table::Dimension(Dimension::Country), 36),
  (Table::Dimension(Dimension::Isolation), 5),
  (Table::Dimension(Dimension::Symptoms), 10),
  (Table::Dimension(Dimension::Access), 8),
  (Table::Facts, 100),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Pass,
  Warning,
  Fail,
}

impl Status {
  pub fn marker(self) -> &'static str {
    match self {
      Status::Pass => "✅",
      Status::Warning => "⚠️",
      Status::Fail => "❌",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
  Structure,
  Volume,
  Integrity,
  Indicators,
  Derived,
  Export,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
  pub section: Section,
  pub status:  Status,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
  pub table: &'static str,
  /// `None` when the table does not exist.
  pub rows:  Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
  pub findings: Vec<Finding>,
  pub tables:   Vec<TableSummary>,
  pub symptoms: Option<SymptomRuleCheck>,
  pub stats:    Option<WarehouseStats>,
}

impl ValidationReport {
  fn record(&mut self, section: Section, status: Status, message: impl Into<String>) {
    let message = message.into();
    match status {
      Status::Pass => info!("{} {message}", status.marker()),
      Status::Warning => warn!("{} {message}", status.marker()),
      Status::Fail => error!("{} {message}", status.marker()),
    }
    self.findings.push(Finding { section, status, message });
  }

  pub fn count(&self, status: Status) -> usize {
    self.findings.iter().filter(|f| f.status == status).count()
  }

  /// Findings of `section` with `status`.
  pub fn in_section(&self, section: Section, status: Status) -> impl Iterator<Item = &Finding> {
    self.findings.iter().filter(move |f| f.section == section && f.status == status)
  }

  pub fn rows(&self, table: Table) -> Option<i64> {
    self.tables.iter().find(|t| t.table == table.name()).and_then(|t| t.rows)
  }

  fn exists(&self, table: Table) -> bool { self.rows(table).is_some() }

  /// Write the report as pretty-printed JSON.
  pub fn write_json(&self, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
      std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
    Ok(())
  }
}

pub async fn run<W: Warehouse>(warehouse: &W) -> Result<ValidationReport> {
  let mut report = ValidationReport::default();

  check_structure(warehouse, &mut report).await?;
  check_volume(&mut report);
  check_integrity(warehouse, &mut report).await?;
  check_indicators(warehouse, &mut report).await?;
  check_derived(warehouse, &mut report).await?;
  collect_stats(warehouse, &mut report).await?;
  check_export(warehouse, &mut report).await?;
  log_summary(&report);

  Ok(report)
}

async fn check_structure<W: Warehouse>(w: &W, report: &mut ValidationReport) -> Result<()> {
  info!("1. structure");
  for table in Table::ALL {
    let rows = if w.table_exists(table).await.map_err(Error::store)? {
      let n = w.row_count(table).await.map_err(Error::store)?;
      report.record(Section::Structure, Status::Pass, format!("{}: {n} rows", table.name()));
      Some(n)
    } else {
      report.record(Section::Structure, Status::Fail, format!("{}: does not exist", table.name()));
      None
    };
    report.tables.push(TableSummary { table: table.name(), rows });
  }
  Ok(())
}

fn check_volume(report: &mut ValidationReport) {
  info!("2. volume");
  let mut all_met = true;
  for (table, minimum) in VOLUME_THRESHOLDS {
    let Some(n) = report.rows(table) else { continue };
    if n >= minimum {
      report.record(
        Section::Volume,
        Status::Pass,
        format!("{}: {n} rows (minimum {minimum})", table.name()),
      );
    } else {
      all_met = false;
      report.record(
        Section::Volume,
        Status::Fail,
        format!("{}: {n} rows (expected at least {minimum})", table.name()),
      );
    }
  }
  if !all_met {
    report.record(Section::Volume, Status::Warning, "some tables are below their minimum volume");
  }
}

async fn check_integrity<W: Warehouse>(w: &W, report: &mut ValidationReport) -> Result<()> {
  info!("3. referential integrity");
  if !report.exists(Table::Facts) {
    return Ok(());
  }
  for dimension in Dimension::ALL {
    if !report.exists(Table::Dimension(dimension)) {
      continue;
    }
    let orphans = w.orphan_count(dimension).await.map_err(Error::store)?;
    let link = format!("{} → {}", dimension.key_column(), dimension.table());
    if orphans == 0 {
      report.record(Section::Integrity, Status::Pass, format!("{link}: no orphan rows"));
    } else {
      report.record(Section::Integrity, Status::Fail, format!("{link}: {orphans} orphan rows"));
    }
  }
  Ok(())
}

async fn check_indicators<W: Warehouse>(w: &W, report: &mut ValidationReport) -> Result<()> {
  info!("4. indicators");
  if !report.exists(Table::Facts) {
    return Ok(());
  }

  let mut in_range = true;
  for column in PERCENT_COLUMNS {
    let n = w.percent_out_of_range(column).await.map_err(Error::store)?;
    if n > 0 {
      in_range = false;
      report.record(Section::Indicators, Status::Fail, format!("{column}: {n} values outside [0, 100]"));
    }
  }
  if in_range {
    report.record(Section::Indicators, Status::Pass, "all percentages within [0, 100]");
  }

  let mut non_negative = true;
  for column in COUNT_COLUMNS {
    let n = w.negative_counts(column).await.map_err(Error::store)?;
    if n > 0 {
      non_negative = false;
      report.record(Section::Indicators, Status::Fail, format!("{column}: {n} negative values"));
    }
  }
  if non_negative {
    report.record(Section::Indicators, Status::Pass, "all counts are non-negative");
  }

  let inconsistent = w.treatment_inconsistencies().await.map_err(Error::store)?;
  if inconsistent == 0 {
    report.record(Section::Indicators, Status::Pass, "treatment percentages are consistent");
  } else {
    report.record(
      Section::Indicators,
      Status::Warning,
      format!("{inconsistent} rows where treatment % and non-treatment % do not add up to 100"),
    );
  }
  Ok(())
}

async fn check_derived<W: Warehouse>(w: &W, report: &mut ValidationReport) -> Result<()> {
  info!("5. inferred stress indicator");
  if !report.exists(Table::Dimension(Dimension::Symptoms)) {
    return Ok(());
  }
  let check = w.symptom_rule_check().await.map_err(Error::store)?;

  if check.reported_not_flagged == 0 {
    report.record(Section::Derived, Status::Pass, "reported stress is always flagged");
  } else {
    report.record(
      Section::Derived,
      Status::Fail,
      format!("{} rows with Growing_Stress=Yes are not flagged", check.reported_not_flagged),
    );
  }

  if check.inferred_only > 0 {
    report.record(
      Section::Derived,
      Status::Pass,
      format!("isolation path in use: {} profiles flagged by inference", check.inferred_only),
    );
  } else {
    report.record(Section::Derived, Status::Warning, "no profiles flagged by inference alone");
  }

  let total = check.flagged + check.not_flagged;
  for (label, n) in [("flagged", check.flagged), ("not flagged", check.not_flagged)] {
    let pct = salud_core::fact::percent(n, total).unwrap_or(0.0);
    info!("  {label}: {n} profiles ({pct}%)");
  }
  report.symptoms = Some(check);
  Ok(())
}

async fn collect_stats<W: Warehouse>(w: &W, report: &mut ValidationReport) -> Result<()> {
  let needed = [
    Table::Facts,
    Table::Dimension(Dimension::Time),
    Table::Dimension(Dimension::Gender),
    Table::Dimension(Dimension::Country),
  ];
  if !needed.iter().all(|t| report.exists(*t)) {
    return Ok(());
  }

  info!("6. warehouse statistics");
  let stats = w.warehouse_stats().await.map_err(Error::store)?;
  if let (Some(first), Some(last)) = (stats.first_year, stats.last_year) {
    info!("period analysed: {first} - {last}");
  }
  for (gender, n) in &stats.facts_by_gender {
    info!("  {gender}: {n} facts");
  }
  for (country, n) in &stats.top_countries {
    info!("  {country}: {n} facts");
  }
  if let Some(pct) = stats.avg_stress_pct {
    info!("average stress: {pct}%");
  }
  if let Some(pct) = stats.avg_treatment_pct {
    info!("average in treatment: {pct}%");
  }
  report.stats = Some(stats);
  Ok(())
}

async fn check_export<W: Warehouse>(w: &W, report: &mut ValidationReport) -> Result<()> {
  if !Table::ALL.iter().filter(|t| **t != Table::Staging).all(|t| report.exists(*t)) {
    return Ok(());
  }
  let facts = report.rows(Table::Facts).unwrap_or_default();
  let exported = w.export_rows().await.map_err(Error::store)?.len() as i64;
  if exported == facts {
    report.record(Section::Export, Status::Pass, format!("export join returns all {facts} fact rows"));
  } else {
    report.record(
      Section::Export,
      Status::Fail,
      format!("export join returns {exported} rows for {facts} fact rows"),
    );
  }
  Ok(())
}

fn log_summary(report: &ValidationReport) {
  info!("{:<35} {:>12}", "table", "rows");
  let mut total = 0;
  for t in &report.tables {
    match t.rows {
      Some(n) => {
        total += n;
        info!("{:<35} {:>12}", t.table, n);
      }
      None => info!("{:<35} {:>12}", t.table, "-"),
    }
  }
  info!("{:<35} {:>12}", "TOTAL", total);

  let (fails, warnings) = (report.count(Status::Fail), report.count(Status::Warning));
  if fails == 0 && warnings == 0 {
    info!("✅ validation completed without findings");
  } else {
    warn!("⚠️ validation completed: {fails} failures, {warnings} warnings");
  }
}
