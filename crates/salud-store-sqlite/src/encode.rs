//! Conversions between domain types and the column values bound into or read
//! out of SQLite.
//!
//! Everything that crosses into a `Connection::call` closure must be owned,
//! so rows are flattened into `Vec<Value>` before the call and decoded from
//! plain tuples after it.

use rusqlite::{Row, types::Value};
use salud_core::{
  dimension::DimensionRows,
  fact::FactRow,
  record::{Column, SurveyRecord},
  store::ExportRow,
  time::TimePeriod,
};

use crate::{Error, Result};

// ─── Staging ─────────────────────────────────────────────────────────────────

/// A staging row as bound into [`INSERT_STAGING`](crate::schema::INSERT_STAGING).
pub type RawRecord = [Option<String>; 17];

pub fn encode_record(record: &SurveyRecord) -> RawRecord {
  record.values().map(|v| v.map(str::to_owned))
}

pub fn decode_record(row: &Row<'_>) -> rusqlite::Result<SurveyRecord> {
  let mut record = SurveyRecord::default();
  for (i, column) in Column::ALL.into_iter().enumerate() {
    record.set(column, row.get(i)?);
  }
  Ok(record)
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// The insert statement for one dimension and the rows to bind into it.
pub struct DimensionInsert {
  pub sql:  &'static str,
  pub rows: Vec<Vec<Value>>,
}

fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

fn int(n: impl Into<i64>) -> Value { Value::Integer(n.into()) }

pub fn encode_dimension(rows: DimensionRows) -> DimensionInsert {
  match rows {
    DimensionRows::Time(periods) => DimensionInsert {
      sql:  "INSERT INTO Dim_Tiempo (anio, mes, nombre_mes, periodo, trimestre, semestre)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rows: periods
        .iter()
        .map(|p| {
          vec![
            int(p.year),
            int(p.month),
            text(p.month_name()),
            text(p.period()),
            int(p.quarter()),
            int(p.half()),
          ]
        })
        .collect(),
    },
    DimensionRows::Gender(rows) => DimensionInsert {
      sql:  "INSERT INTO Dim_Genero (genero, descripcion) VALUES (?1, ?2)",
      rows: rows.iter().map(|d| vec![text(d.value), text(d.description)]).collect(),
    },
    DimensionRows::History(rows) => DimensionInsert {
      sql:  "INSERT INTO Dim_Historial (family_history, descripcion) VALUES (?1, ?2)",
      rows: rows.iter().map(|d| vec![text(d.value), text(d.description)]).collect(),
    },
    DimensionRows::Occupation(rows) => DimensionInsert {
      sql:  "INSERT INTO Dim_Ocupacion (occupation, descripcion) VALUES (?1, ?2)",
      rows: rows.iter().map(|d| vec![text(d.value), text(d.description)]).collect(),
    },
    DimensionRows::Country(rows) => DimensionInsert {
      sql:  "INSERT INTO Dim_Pais (country, region, codigo_iso) VALUES (?1, ?2, ?3)",
      rows: rows
        .iter()
        .map(|c| vec![text(c.name), text(c.region), text(c.iso_code)])
        .collect(),
    },
    DimensionRows::Isolation(rows) => DimensionInsert {
      sql:  "INSERT INTO Dim_Aislamiento (days_indoors, orden, categoria) VALUES (?1, ?2, ?3)",
      rows: rows
        .iter()
        .map(|l| vec![text(l.label), int(l.rank), text(l.severity.as_str())])
        .collect(),
    },
    DimensionRows::Symptoms(rows) => DimensionInsert {
      sql:  "INSERT INTO Dim_Sintomas (
               growing_stress, mood_swings, coping_struggles, social_weakness,
               indicador_inferido_estres
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
      rows: rows
        .into_iter()
        .map(|r| {
          vec![
            text(r.profile.growing_stress),
            text(r.profile.mood_swings),
            text(r.profile.coping_struggles),
            text(r.profile.social_weakness),
            int(r.inferred_stress),
          ]
        })
        .collect(),
    },
    DimensionRows::Access(rows) => DimensionInsert {
      sql:  "INSERT INTO Dim_Acceso (care_options, mental_health_interview) VALUES (?1, ?2)",
      rows: rows
        .into_iter()
        .map(|a| vec![text(a.care_options), text(a.mental_health_interview)])
        .collect(),
    },
  }
}

pub fn decode_period(year: i64, month: i64) -> Result<TimePeriod> {
  let year = u16::try_from(year).map_err(|_| Error::Decode(format!("year {year} out of range")))?;
  let month = u32::try_from(month)
    .map_err(|_| Error::Decode(format!("month {month} out of range")))?;
  Ok(TimePeriod::new(year, month)?)
}

// ─── Facts ───────────────────────────────────────────────────────────────────

/// Bind values for [`INSERT_FACT`](crate::schema::INSERT_FACT), in column
/// order.
pub fn encode_fact(fact: &FactRow) -> Vec<Value> {
  let real = |v: Option<f64>| v.map_or(Value::Null, Value::Real);
  let i = &fact.indicators;

  let mut values: Vec<Value> = fact.key.ids().into_iter().map(int).collect();
  values.extend([
    int(i.stress_count),
    real(i.stress_pct),
    int(i.history_stress_count),
    real(i.history_stress_pct),
    int(i.stress_coping_count),
    real(i.stress_coping_pct),
    real(i.treatment_pct),
    real(i.no_treatment_pct),
    int(i.treatment_count),
    real(i.deterioration_pct),
    real(i.mood_pct),
    real(i.social_weakness_pct),
    real(i.care_access_pct),
    int(i.stress_access_count),
    real(i.unrecognized_treatment_pct),
    real(i.access_without_treatment_pct),
    real(i.postponement_pct),
  ]);
  values
}

// ─── Export ──────────────────────────────────────────────────────────────────

/// Decode one row of [`SELECT_EXPORT`](crate::schema::SELECT_EXPORT).
pub fn decode_export(row: &Row<'_>) -> rusqlite::Result<ExportRow> {
  Ok(ExportRow {
    anio:                                      row.get(0)?,
    mes:                                       row.get(1)?,
    nombre_mes:                                row.get(2)?,
    periodo:                                   row.get(3)?,
    trimestre:                                 row.get(4)?,
    semestre:                                  row.get(5)?,
    genero:                                    row.get(6)?,
    family_history:                            row.get(7)?,
    occupation:                                row.get(8)?,
    country:                                   row.get(9)?,
    region:                                    row.get(10)?,
    days_indoors:                              row.get(11)?,
    aislamiento_categoria:                     row.get(12)?,
    aislamiento_orden:                         row.get(13)?,
    growing_stress:                            row.get(14)?,
    mood_swings:                               row.get(15)?,
    coping_struggles:                          row.get(16)?,
    social_weakness:                           row.get(17)?,
    indicador_inferido_estres:                 row.get(18)?,
    care_options:                              row.get(19)?,
    mental_health_interview:                   row.get(20)?,
    cantidad_estres:                           row.get(21)?,
    porcentaje_estres:                         row.get(22)?,
    cantidad_historial_estres:                 row.get(23)?,
    porcentaje_historial_estres:               row.get(24)?,
    cantidad_estres_afrontamiento:             row.get(25)?,
    porcentaje_estres_afrontamiento_ocupacion: row.get(26)?,
    porcentaje_tratamiento:                    row.get(27)?,
    porcentaje_no_tratamiento:                 row.get(28)?,
    cantidad_tratamiento:                      row.get(29)?,
    porcentaje_deterioro_aislamiento:          row.get(30)?,
    porcentaje_humor_aislamiento:              row.get(31)?,
    porcentaje_debilidad_aislamiento:          row.get(32)?,
    porcentaje_acceso_recursos:                row.get(33)?,
    cantidad_estres_acceso:                    row.get(34)?,
    porcentaje_sintomas_no_reconocidos:        row.get(35)?,
    porcentaje_recursos_sin_tratamiento:       row.get(36)?,
    porcentaje_postergacion:                   row.get(37)?,
  })
}
