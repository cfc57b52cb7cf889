//! Integration tests for `SqliteWarehouse` against an in-memory database.

use salud_core::{
  dimension::{
    Dimension, DimensionRows, derive_access, derive_symptoms, derive_time,
  },
  fact::{COUNT_COLUMNS, PERCENT_COLUMNS, aggregate},
  record::{Column, SurveyRecord},
  store::{EXPORT_COLUMNS, StagingStore, Table, Warehouse},
};

use crate::{Error, SqliteWarehouse};

async fn warehouse() -> SqliteWarehouse {
  SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory warehouse")
}

fn respondent() -> SurveyRecord {
  SurveyRecord {
    timestamp:               Some("1/5/2021 10:00".into()),
    gender:                  Some("Male".into()),
    country:                 Some("India".into()),
    occupation:              Some("Student".into()),
    self_employed:           Some("No".into()),
    family_history:          Some("Yes".into()),
    treatment:               Some("Yes".into()),
    days_indoors:            Some("15-30 days".into()),
    growing_stress:          Some("Yes".into()),
    changes_habits:          Some("Yes".into()),
    mental_health_history:   Some("No".into()),
    mood_swings:             Some("High".into()),
    coping_struggles:        Some("Yes".into()),
    work_interest:           Some("No".into()),
    social_weakness:         Some("No".into()),
    mental_health_interview: Some("Maybe".into()),
    care_options:            Some("Not sure".into()),
  }
}

/// Load every dimension from `rows`, then aggregate and load the facts.
async fn load_all(w: &SqliteWarehouse, rows: &[SurveyRecord]) -> i64 {
  w.insert_staging_batch(rows).await.unwrap();
  for d in Dimension::ALL.into_iter().filter(|d| d.is_static()) {
    w.replace_dimension(DimensionRows::fixed(d).unwrap()).await.unwrap();
  }
  w.replace_dimension(DimensionRows::Time(derive_time(rows).periods)).await.unwrap();
  w.replace_dimension(DimensionRows::Symptoms(derive_symptoms(rows).rows)).await.unwrap();
  w.replace_dimension(DimensionRows::Access(derive_access(rows))).await.unwrap();

  let keys = w.dimension_keys().await.unwrap();
  let staged = w.staging_rows().await.unwrap();
  let agg = aggregate(&staged, &keys);
  w.replace_facts(agg.facts).await.unwrap()
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn schema_creates_every_table() {
  let w = warehouse().await;
  for table in Table::ALL {
    assert!(w.table_exists(table).await.unwrap(), "{} missing", table.name());
    assert_eq!(w.row_count(table).await.unwrap(), 0);
  }
}

#[tokio::test]
async fn init_schema_is_idempotent() {
  let w = warehouse().await;
  w.insert_staging_batch(&[respondent()]).await.unwrap();
  w.init_schema().await.unwrap();
  assert_eq!(w.row_count(Table::Staging).await.unwrap(), 1);
}

#[tokio::test]
async fn missing_tables_are_reported() {
  let dir = tempfile::tempdir().unwrap();
  let w = SqliteWarehouse::open(dir.path().join("empty.sqlite3")).await.unwrap();

  assert!(!w.staging_exists().await.unwrap());
  assert!(matches!(
    w.row_count(Table::Facts).await,
    Err(Error::MissingTable("Hechos_Estres_SaludMental"))
  ));
  assert!(matches!(w.staging_profile().await, Err(Error::MissingTable(_))));
}

// ─── Staging ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn staged_rows_round_trip_with_nulls() {
  let w = warehouse().await;
  let mut sparse = respondent();
  sparse.self_employed = None;
  sparse.work_interest = None;

  let written = w.insert_staging_batch(&[respondent(), sparse.clone()]).await.unwrap();
  assert_eq!(written, 2);

  let rows = w.staging_rows().await.unwrap();
  assert_eq!(rows, vec![respondent(), sparse]);
}

#[tokio::test]
async fn truncate_empties_staging() {
  let w = warehouse().await;
  w.insert_staging_batch(&[respondent(), respondent()]).await.unwrap();
  w.truncate_staging().await.unwrap();
  assert_eq!(w.row_count(Table::Staging).await.unwrap(), 0);
}

#[tokio::test]
async fn staging_profile_summarises_rows() {
  let w = warehouse().await;
  let mut female = respondent();
  female.gender = Some("Female".into());
  female.country = Some("Canada".into());
  female.timestamp = Some("8/27/2014 11:29".into());
  let mut missing = respondent();
  missing.treatment = None;

  w.insert_staging_batch(&[respondent(), respondent(), female, missing]).await.unwrap();
  let profile = w.staging_profile().await.unwrap();

  assert_eq!(profile.row_count, 4);
  assert_eq!(profile.nulls_in(Column::Treatment), 1);
  assert_eq!(profile.nulls_in(Column::Gender), 0);
  assert_eq!(profile.by_gender[0], ("Male".to_owned(), 3));
  assert_eq!(profile.top_countries[0], ("India".to_owned(), 3));
  assert_eq!(profile.earliest.unwrap().to_string(), "2014-08-27 11:29:00");
  assert_eq!(profile.latest.unwrap().to_string(), "2021-01-05 10:00:00");
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn replacing_a_dimension_restarts_keys() {
  let w = warehouse().await;
  let rows = || DimensionRows::fixed(Dimension::Country).unwrap();
  assert_eq!(w.replace_dimension(rows()).await.unwrap(), 35);
  assert_eq!(w.replace_dimension(rows()).await.unwrap(), 35);

  let keys = w.dimension_keys().await.unwrap();
  assert_eq!(keys.country["United States"], 1);
  assert_eq!(keys.country.len(), 35);
}

#[tokio::test]
async fn dimension_in_use_cannot_be_replaced() {
  let w = warehouse().await;
  load_all(&w, &[respondent()]).await;

  let err = w.replace_dimension(DimensionRows::fixed(Dimension::Gender).unwrap()).await;
  assert!(matches!(err, Err(Error::Database(_))));
  // The failed replacement leaves the dimension as it was.
  assert_eq!(w.row_count(Table::Dimension(Dimension::Gender)).await.unwrap(), 2);

  w.clear_facts().await.unwrap();
  assert_eq!(
    w.replace_dimension(DimensionRows::fixed(Dimension::Gender).unwrap()).await.unwrap(),
    2
  );
}

#[tokio::test]
async fn dimension_keys_decode_time_and_flags() {
  let w = warehouse().await;
  let rows = [respondent()];
  w.replace_dimension(DimensionRows::Time(derive_time(&rows).periods)).await.unwrap();
  w.replace_dimension(DimensionRows::Symptoms(derive_symptoms(&rows).rows)).await.unwrap();

  let keys = w.dimension_keys().await.unwrap();
  assert_eq!(keys.time.len(), 1);
  let period = keys.time.keys().next().unwrap();
  assert_eq!((period.year, period.month), (2021, 1));
  assert!(keys.symptoms.values().all(|(_, flagged)| *flagged));
}

// ─── Facts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_respondent_loads_one_fact() {
  let w = warehouse().await;
  assert_eq!(load_all(&w, &[respondent()]).await, 1);

  for d in Dimension::ALL {
    assert_eq!(w.orphan_count(d).await.unwrap(), 0);
  }
  for column in PERCENT_COLUMNS {
    assert_eq!(w.percent_out_of_range(column).await.unwrap(), 0);
  }
  for column in COUNT_COLUMNS {
    assert_eq!(w.negative_counts(column).await.unwrap(), 0);
  }
  assert_eq!(w.treatment_inconsistencies().await.unwrap(), 0);

  let exported = w.export_rows().await.unwrap();
  assert_eq!(exported.len(), 1);
  let row = &exported[0];
  assert_eq!((row.anio, row.mes), (2021, 1));
  assert_eq!(row.nombre_mes, "Enero");
  assert_eq!(row.region, "Asia");
  assert_eq!(row.aislamiento_categoria, "Medio");
  assert_eq!(row.cantidad_estres, 1);
  assert_eq!(row.porcentaje_estres, Some(100.0));
  assert_eq!(row.porcentaje_tratamiento, Some(100.0));
  assert_eq!(row.porcentaje_no_tratamiento, Some(0.0));
  assert!(row.indicador_inferido_estres);
}

#[tokio::test]
async fn replacing_facts_is_idempotent() {
  let w = warehouse().await;
  let mut other = respondent();
  other.gender = Some("Female".into());
  let rows = [respondent(), other];

  assert_eq!(load_all(&w, &rows).await, 2);
  let keys = w.dimension_keys().await.unwrap();
  let again = aggregate(&rows, &keys);
  assert_eq!(w.replace_facts(again.facts).await.unwrap(), 2);
}

#[tokio::test]
async fn failed_fact_replace_keeps_previous_facts() {
  let w = warehouse().await;
  let mut other = respondent();
  other.gender = Some("Female".into());
  assert_eq!(load_all(&w, &[respondent(), other]).await, 2);

  let keys = w.dimension_keys().await.unwrap();
  let valid = aggregate(&[respondent()], &keys).facts;
  let mut dangling = valid[0].clone();
  dangling.key.country = 999;

  let result = w.replace_facts(vec![valid[0].clone(), dangling]).await;
  assert!(matches!(result, Err(Error::Database(_))));
  assert_eq!(w.row_count(Table::Facts).await.unwrap(), 2);
  for d in Dimension::ALL {
    assert_eq!(w.orphan_count(d).await.unwrap(), 0);
  }
}

#[tokio::test]
async fn unknown_indicator_columns_are_rejected() {
  let w = warehouse().await;
  assert!(matches!(
    w.percent_out_of_range("id_hecho").await,
    Err(Error::Core(salud_core::Error::UnknownColumn(_)))
  ));
  assert!(matches!(w.negative_counts("porcentaje_estres").await, Err(Error::Core(_))));
}

#[tokio::test]
async fn symptom_rule_check_counts_flags() {
  let w = warehouse().await;
  let mut inferred = respondent();
  inferred.growing_stress = Some("No".into());
  inferred.days_indoors = Some("31-60 days".into());
  let mut calm = respondent();
  calm.growing_stress = Some("Maybe".into());
  calm.mood_swings = Some("Low".into());

  let rows = [respondent(), inferred, calm];
  w.replace_dimension(DimensionRows::Symptoms(derive_symptoms(&rows).rows)).await.unwrap();

  let check = w.symptom_rule_check().await.unwrap();
  assert_eq!(check.reported_not_flagged, 0);
  assert_eq!(check.inferred_only, 1);
  assert_eq!(check.flagged, 2);
  assert_eq!(check.not_flagged, 1);
}

#[tokio::test]
async fn warehouse_stats_describe_loaded_facts() {
  let w = warehouse().await;
  let mut older = respondent();
  older.timestamp = Some("8/27/2014 11:29".into());
  older.gender = Some("Female".into());
  older.treatment = Some("No".into());
  load_all(&w, &[respondent(), older]).await;

  let stats = w.warehouse_stats().await.unwrap();
  assert_eq!((stats.first_year, stats.last_year), (Some(2014), Some(2021)));
  assert_eq!(
    stats.facts_by_gender,
    vec![("Female".to_owned(), 1), ("Male".to_owned(), 1)]
  );
  assert_eq!(stats.top_countries, vec![("India".to_owned(), 2)]);
  assert_eq!(stats.avg_stress_pct, Some(100.0));
  assert_eq!(stats.avg_treatment_pct, Some(50.0));
}

#[tokio::test]
async fn export_rows_are_ordered_and_complete() {
  let w = warehouse().await;
  let mut late = respondent();
  late.timestamp = Some("3/1/2021 10:00".into());
  let mut early_female = respondent();
  early_female.gender = Some("Female".into());
  let mut early_canada = respondent();
  early_canada.country = Some("Canada".into());

  let facts = load_all(&w, &[late, respondent(), early_female, early_canada]).await;
  let exported = w.export_rows().await.unwrap();
  assert_eq!(exported.len() as i64, facts);

  let order: Vec<_> = exported
    .iter()
    .map(|r| (r.mes, r.genero.as_str(), r.country.as_str()))
    .collect();
  assert_eq!(order, vec![
    (1, "Female", "India"),
    (1, "Male", "Canada"),
    (1, "Male", "India"),
    (3, "Male", "India"),
  ]);

  let header = csv_header_len(&exported[0]);
  assert_eq!(header, EXPORT_COLUMNS);
}

fn csv_header_len(row: &salud_core::store::ExportRow) -> usize {
  let mut writer = csv::Writer::from_writer(Vec::new());
  writer.serialize(row).unwrap();
  let bytes = writer.into_inner().unwrap();
  let text = String::from_utf8(bytes).unwrap();
  text.lines().next().unwrap().split(',').count()
}
