//! The warehouse traits and the summaries they return.
//!
//! Traits are implemented by storage backends (e.g. `salud-store-sqlite`).
//! The pipeline stages depend on these abstractions, not on any concrete
//! backend.

use std::future::Future;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
  dimension::{Dimension, DimensionRows},
  fact::{DimensionKeys, FactRow},
  record::{Column, SurveyRecord},
};

// ─── Tables ──────────────────────────────────────────────────────────────────

pub const STAGING_TABLE: &str = "mental_health_staging";
pub const FACT_TABLE: &str = "Hechos_Estres_SaludMental";

/// Every table of the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  Staging,
  Dimension(Dimension),
  Facts,
}

impl Table {
  /// Load order: staging, the eight dimensions, facts.
  pub const ALL: [Table; 10] = [
    Table::Staging,
    Table::Dimension(Dimension::Time),
    Table::Dimension(Dimension::Gender),
    Table::Dimension(Dimension::History),
    Table::Dimension(Dimension::Occupation),
    Table::Dimension(Dimension::Country),
    Table::Dimension(Dimension::Isolation),
    Table::Dimension(Dimension::Symptoms),
    Table::Dimension(Dimension::Access),
    Table::Facts,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Table::Staging => STAGING_TABLE,
      Table::Dimension(d) => d.table(),
      Table::Facts => FACT_TABLE,
    }
  }
}

// ─── Summaries ───────────────────────────────────────────────────────────────

/// What the staging table holds after a load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StagingProfile {
  pub row_count:     i64,
  /// Null counts for every critical column, in check order.
  pub null_counts:   Vec<(String, i64)>,
  pub by_gender:     Vec<(String, i64)>,
  pub earliest:      Option<NaiveDateTime>,
  pub latest:        Option<NaiveDateTime>,
  /// Five most frequent countries, most frequent first.
  pub top_countries: Vec<(String, i64)>,
}

impl StagingProfile {
  pub fn nulls_in(&self, column: Column) -> i64 {
    self
      .null_counts
      .iter()
      .find(|(name, _)| name == column.header())
      .map_or(0, |(_, n)| *n)
  }
}

/// Consistency of the inferred-stress flag on `Dim_Sintomas`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymptomRuleCheck {
  /// Rows reporting growing stress whose flag is false. Expected zero.
  pub reported_not_flagged: i64,
  /// Rows flagged through the isolation path only.
  pub inferred_only:        i64,
  pub flagged:              i64,
  pub not_flagged:          i64,
}

/// Descriptive statistics over the loaded warehouse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarehouseStats {
  pub first_year:        Option<i64>,
  pub last_year:         Option<i64>,
  pub facts_by_gender:   Vec<(String, i64)>,
  /// Five countries with the most fact rows.
  pub top_countries:     Vec<(String, i64)>,
  pub avg_stress_pct:    Option<f64>,
  pub avg_treatment_pct: Option<f64>,
}

/// One denormalised fact row, as exported for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
  pub anio:                                      i64,
  pub mes:                                       i64,
  pub nombre_mes:                                String,
  pub periodo:                                   String,
  pub trimestre:                                 i64,
  pub semestre:                                  i64,
  pub genero:                                    String,
  pub family_history:                            String,
  pub occupation:                                String,
  pub country:                                   String,
  pub region:                                    String,
  pub days_indoors:                              String,
  pub aislamiento_categoria:                     String,
  pub aislamiento_orden:                         i64,
  pub growing_stress:                            String,
  pub mood_swings:                               String,
  pub coping_struggles:                          String,
  pub social_weakness:                           String,
  pub indicador_inferido_estres:                 bool,
  pub care_options:                              String,
  pub mental_health_interview:                   String,
  pub cantidad_estres:                           i64,
  pub porcentaje_estres:                         Option<f64>,
  pub cantidad_historial_estres:                 i64,
  pub porcentaje_historial_estres:               Option<f64>,
  pub cantidad_estres_afrontamiento:             i64,
  pub porcentaje_estres_afrontamiento_ocupacion: Option<f64>,
  pub porcentaje_tratamiento:                    Option<f64>,
  pub porcentaje_no_tratamiento:                 Option<f64>,
  pub cantidad_tratamiento:                      i64,
  pub porcentaje_deterioro_aislamiento:          Option<f64>,
  pub porcentaje_humor_aislamiento:              Option<f64>,
  pub porcentaje_debilidad_aislamiento:          Option<f64>,
  pub porcentaje_acceso_recursos:                Option<f64>,
  pub cantidad_estres_acceso:                    i64,
  pub porcentaje_sintomas_no_reconocidos:        Option<f64>,
  pub porcentaje_recursos_sin_tratamiento:       Option<f64>,
  pub porcentaje_postergacion:                   Option<f64>,
}

/// Number of columns in the export file.
pub const EXPORT_COLUMNS: usize = 38;

/// Export header, in [`ExportRow`] field order.
pub const EXPORT_HEADER: [&str; EXPORT_COLUMNS] = [
  "anio",
  "mes",
  "nombre_mes",
  "periodo",
  "trimestre",
  "semestre",
  "genero",
  "family_history",
  "occupation",
  "country",
  "region",
  "days_indoors",
  "aislamiento_categoria",
  "aislamiento_orden",
  "growing_stress",
  "mood_swings",
  "coping_struggles",
  "social_weakness",
  "indicador_inferido_estres",
  "care_options",
  "mental_health_interview",
  "cantidad_estres",
  "porcentaje_estres",
  "cantidad_historial_estres",
  "porcentaje_historial_estres",
  "cantidad_estres_afrontamiento",
  "porcentaje_estres_afrontamiento_ocupacion",
  "porcentaje_tratamiento",
  "porcentaje_no_tratamiento",
  "cantidad_tratamiento",
  "porcentaje_deterioro_aislamiento",
  "porcentaje_humor_aislamiento",
  "porcentaje_debilidad_aislamiento",
  "porcentaje_acceso_recursos",
  "cantidad_estres_acceso",
  "porcentaje_sintomas_no_reconocidos",
  "porcentaje_recursos_sin_tratamiento",
  "porcentaje_postergacion",
];

// ─── Traits ──────────────────────────────────────────────────────────────────

/// The staging side of the warehouse: the landing table for cleaned rows.
///
/// All methods return `Send` futures so implementations can be driven from a
/// multi-threaded runtime.
pub trait StagingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether the staging table exists at all.
  fn staging_exists(&self) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove every staged row.
  fn truncate_staging(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert `batch` atomically and return the number of rows written. On
  /// error nothing from the batch is kept.
  fn insert_staging_batch<'a>(
    &'a self,
    batch: &'a [SurveyRecord],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Summarise the staged rows.
  fn staging_profile(
    &self,
  ) -> impl Future<Output = Result<StagingProfile, Self::Error>> + Send + '_;
}

/// The full warehouse: staging, the eight dimensions and the fact table.
pub trait Warehouse: StagingStore {
  /// Whether `table` exists.
  fn table_exists(
    &self,
    table: Table,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn row_count(&self, table: Table) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Every staged row, in insertion order.
  fn staging_rows(
    &self,
  ) -> impl Future<Output = Result<Vec<SurveyRecord>, Self::Error>> + Send + '_;

  /// Empty the fact table. Returns the number of rows removed.
  fn clear_facts(&self) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Replace the contents of one dimension in a single transaction. Fails if
  /// fact rows still reference it. Returns the resulting row count.
  fn replace_dimension(
    &self,
    rows: DimensionRows,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Natural-key lookups for every dimension.
  fn dimension_keys(
    &self,
  ) -> impl Future<Output = Result<DimensionKeys, Self::Error>> + Send + '_;

  /// Replace the fact table in a single transaction. Returns the resulting
  /// row count; on error the previous contents are kept.
  fn replace_facts(
    &self,
    facts: Vec<FactRow>,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Fact rows whose `dimension` key has no matching dimension row.
  fn orphan_count(
    &self,
    dimension: Dimension,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Fact rows whose percentage `column` lies outside `[0, 100]`.
  fn percent_out_of_range(
    &self,
    column: &'static str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Fact rows whose count `column` is negative.
  fn negative_counts(
    &self,
    column: &'static str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Fact rows where treatment % and non-treatment % are both present and
  /// do not add up to within one point of 100.
  fn treatment_inconsistencies(
    &self,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  fn symptom_rule_check(
    &self,
  ) -> impl Future<Output = Result<SymptomRuleCheck, Self::Error>> + Send + '_;

  fn warehouse_stats(
    &self,
  ) -> impl Future<Output = Result<WarehouseStats, Self::Error>> + Send + '_;

  /// Facts joined with all eight dimensions, ordered by year, month, gender
  /// and country.
  fn export_rows(
    &self,
  ) -> impl Future<Output = Result<Vec<ExportRow>, Self::Error>> + Send + '_;
}
