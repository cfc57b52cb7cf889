//! Stage 4: aggregate staging into `Hechos_Estres_SaludMental`.

use salud_core::{
  dimension::Dimension,
  fact::{Unmatched, aggregate},
  store::{FACT_TABLE, Table, Warehouse},
};
use tracing::{error, info, warn};

use super::require_table;
use crate::{Error, Result, config::DimensionMinimums};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactReport {
  pub facts:           i64,
  pub rows_aggregated: usize,
  pub unmatched:       Unmatched,
  /// Fact rows without a matching dimension row, per dimension.
  pub orphans:         Vec<(Dimension, i64)>,
}

pub async fn run<W: Warehouse>(warehouse: &W, minimums: &DimensionMinimums) -> Result<FactReport> {
  check_dimensions(warehouse, minimums).await?;
  require_table(warehouse, Table::Staging).await?;
  require_table(warehouse, Table::Facts).await?;

  let keys = warehouse.dimension_keys().await.map_err(Error::store)?;
  let staged = warehouse.staging_rows().await.map_err(Error::store)?;
  info!("aggregating {} staging rows", staged.len());

  let aggregation = aggregate(&staged, &keys);
  log_unmatched(&aggregation.unmatched);

  let mut report = FactReport {
    rows_aggregated: aggregation.rows_aggregated,
    unmatched: aggregation.unmatched,
    ..Default::default()
  };

  report.facts = warehouse.replace_facts(aggregation.facts).await.map_err(Error::store)?;
  if report.facts > 0 {
    info!(
      "✅ {} fact rows loaded from {} staging rows",
      report.facts, report.rows_aggregated
    );
  } else {
    warn!("⚠️ no fact rows were produced");
  }

  for dimension in Dimension::ALL {
    let orphans = warehouse.orphan_count(dimension).await.map_err(Error::store)?;
    if orphans == 0 {
      info!("✅ {} → {}: no orphans", dimension.key_column(), dimension.table());
    } else {
      error!("❌ {} → {}: {orphans} orphan rows", dimension.key_column(), dimension.table());
    }
    report.orphans.push((dimension, orphans));
  }
  Ok(report)
}

/// Every dimension must hold its configured minimum before any aggregation.
async fn check_dimensions<W: Warehouse>(warehouse: &W, minimums: &DimensionMinimums) -> Result<()> {
  let mut short = Vec::new();
  for dimension in Dimension::ALL {
    let table = Table::Dimension(dimension);
    require_table(warehouse, table).await?;
    let n = warehouse.row_count(table).await.map_err(Error::store)?;
    let required = minimums.for_dimension(dimension);
    if n < required {
      error!("❌ {}: {n} rows, at least {required} required", dimension.table());
      short.push(format!("{} ({n} < {required})", dimension.table()));
    } else {
      info!("✅ {}: {n} rows", dimension.table());
    }
  }
  if short.is_empty() {
    Ok(())
  } else {
    error!("❌ dimensions are not ready; {FACT_TABLE} left untouched");
    Err(Error::InsufficientDimensions(short))
  }
}

fn log_unmatched(unmatched: &Unmatched) {
  if unmatched.excluded_rows == 0 {
    info!("✅ every staging row resolved against all dimensions");
    return;
  }
  for (dimension, values) in &unmatched.values {
    for (value, rows) in values {
      warn!("⚠️ {}: no match for {value:?} ({rows} rows)", dimension.table());
    }
  }
  warn!("⚠️ {} staging rows excluded from the fact table", unmatched.excluded_rows);
}
