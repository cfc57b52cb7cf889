//! Stage 3: populate the eight dimension tables.
//!
//! The fact table is the only table that references a dimension, so it is
//! emptied first. Fixed lookups load next, then the dimensions derived from
//! staging. Each dimension is replaced in its own transaction with
//! referential checks left on.

use salud_core::{
  dimension::{Dimension, DimensionRows, derive_access, derive_symptoms, derive_time},
  store::{Table, Warehouse},
};
use tracing::{error, info, warn};

use super::require_table;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionReport {
  pub facts_cleared:          i64,
  /// Row count of every dimension after the load, in key order.
  pub counts:                 Vec<(Dimension, i64)>,
  pub unparseable_timestamps: usize,
  /// Symptom profiles whose staged rows disagree on the isolation path.
  pub ambiguous_symptoms:     usize,
}

impl DimensionReport {
  pub fn count(&self, dimension: Dimension) -> i64 {
    self.counts.iter().find(|(d, _)| *d == dimension).map_or(0, |(_, n)| *n)
  }
}

pub async fn run<W: Warehouse>(warehouse: &W) -> Result<DimensionReport> {
  for table in Table::ALL {
    require_table(warehouse, table).await?;
  }
  let mut report = DimensionReport::default();

  report.facts_cleared = warehouse.clear_facts().await.map_err(Error::store)?;
  if report.facts_cleared > 0 {
    info!("{} fact rows cleared before reloading dimensions", report.facts_cleared);
  }

  for dimension in Dimension::ALL.into_iter().filter(|d| d.is_static()) {
    if let Some(rows) = DimensionRows::fixed(dimension) {
      replace(warehouse, rows).await?;
    }
  }

  let staged = warehouse.staging_rows().await.map_err(Error::store)?;
  info!("{} staging rows read", staged.len());

  let time = derive_time(&staged);
  report.unparseable_timestamps = time.unparseable;
  if time.unparseable > 0 {
    warn!("⚠️ {} timestamps could not be parsed into a period", time.unparseable);
  }
  replace(warehouse, DimensionRows::Time(time.periods)).await?;

  let symptoms = derive_symptoms(&staged);
  report.ambiguous_symptoms = symptoms.ambiguous.len();
  for profile in &symptoms.ambiguous {
    warn!(
      "⚠️ symptom profile {} / {} / {} / {} qualifies through isolation on some rows only; \
       flagged as inferred stress",
      profile.growing_stress, profile.mood_swings, profile.coping_struggles, profile.social_weakness
    );
  }
  let flagged = symptoms.rows.iter().filter(|r| r.inferred_stress).count();
  info!(
    "inferred stress: {flagged} flagged, {} not flagged",
    symptoms.rows.len() - flagged
  );
  replace(warehouse, DimensionRows::Symptoms(symptoms.rows)).await?;

  replace(warehouse, DimensionRows::Access(derive_access(&staged))).await?;

  info!("dimension summary:");
  for dimension in Dimension::ALL {
    let n = warehouse.row_count(Table::Dimension(dimension)).await.map_err(Error::store)?;
    if n > 0 {
      info!("✅ {}: {n} rows", dimension.table());
    } else {
      error!("❌ {}: empty", dimension.table());
    }
    report.counts.push((dimension, n));
  }
  Ok(report)
}

async fn replace<W: Warehouse>(warehouse: &W, rows: DimensionRows) -> Result<i64> {
  let table = rows.dimension().table();
  let n = warehouse.replace_dimension(rows).await.map_err(Error::store)?;
  info!("✅ {table}: {n} rows loaded");
  Ok(n)
}
