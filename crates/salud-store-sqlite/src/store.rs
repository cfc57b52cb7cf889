//! [`SqliteWarehouse`], the SQLite implementation of [`Warehouse`].

use std::{collections::HashMap, path::Path};

use rusqlite::params_from_iter;
use salud_core::{
  dimension::{AccessProfile, Dimension, DimensionRows, SymptomProfile},
  fact::{COUNT_COLUMNS, DimensionKeys, FactRow, PERCENT_COLUMNS, round2},
  record::{CRITICAL_COLUMNS, Column, SurveyRecord},
  store::{
    ExportRow, FACT_TABLE, STAGING_TABLE, StagingProfile, StagingStore, SymptomRuleCheck, Table,
    Warehouse, WarehouseStats,
  },
  time::timestamp_range,
};

use crate::{
  Error, Result,
  encode::{decode_export, decode_period, decode_record, encode_dimension, encode_fact, encode_record},
  schema::{CONNECTION_PRAGMAS, INSERT_FACT, INSERT_STAGING, SCHEMA, SELECT_EXPORT, SELECT_STAGING},
};

// ─── Warehouse ───────────────────────────────────────────────────────────────

/// The survey warehouse backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) the database at `path`. The schema is not touched;
  /// call [`init_schema`](Self::init_schema) to create it.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let warehouse = Self { conn };
    warehouse.apply_pragmas().await?;
    Ok(warehouse)
  }

  /// Open an in-memory warehouse with the schema in place, for
  /// testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let warehouse = Self { conn };
    warehouse.apply_pragmas().await?;
    warehouse.init_schema().await?;
    Ok(warehouse)
  }

  /// Create every table that does not exist yet.
  pub async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn apply_pragmas(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn require(&self, table: Table) -> Result<()> {
    if self.table_exists(table).await? {
      Ok(())
    } else {
      Err(Error::MissingTable(table.name()))
    }
  }

  /// Run a single-value `COUNT(*)` style query.
  async fn scalar(&self, sql: String) -> Result<i64> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await?;
    Ok(n)
  }
}

/// `(label, count)` pairs from a two-column grouped query. `NULL` labels are
/// spelled out.
fn counted(conn: &rusqlite::Connection, sql: &str) -> rusqlite::Result<Vec<(String, i64)>> {
  let mut stmt = conn.prepare(sql)?;
  stmt
    .query_map([], |row| {
      let label: Option<String> = row.get(0)?;
      Ok((label.unwrap_or_else(|| "NULL".to_owned()), row.get(1)?))
    })?
    .collect()
}

/// Natural key → surrogate key for a single-column dimension.
fn text_keys(conn: &rusqlite::Connection, sql: &str) -> rusqlite::Result<HashMap<String, i64>> {
  let mut stmt = conn.prepare(sql)?;
  stmt.query_map([], |row| Ok((row.get(1)?, row.get(0)?)))?.collect()
}

// ─── StagingStore impl ───────────────────────────────────────────────────────

impl StagingStore for SqliteWarehouse {
  type Error = Error;

  async fn staging_exists(&self) -> Result<bool> { self.table_exists(Table::Staging).await }

  async fn truncate_staging(&self) -> Result<()> {
    self.require(Table::Staging).await?;
    self
      .conn
      .call(|conn| {
        conn.execute(&format!("DELETE FROM {STAGING_TABLE}"), [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_staging_batch<'a>(&'a self, batch: &'a [SurveyRecord]) -> Result<usize> {
    let raws: Vec<_> = batch.iter().map(encode_record).collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(INSERT_STAGING)?;
          for raw in &raws {
            stmt.execute(params_from_iter(raw.iter()))?;
          }
        }
        tx.commit()?;
        Ok(raws.len())
      })
      .await?;
    Ok(written)
  }

  async fn staging_profile(&self) -> Result<StagingProfile> {
    self.require(Table::Staging).await?;
    let critical = CRITICAL_COLUMNS.map(Column::header);

    let (row_count, null_counts, by_gender, timestamps, top_countries) = self
      .conn
      .call(move |conn| {
        let row_count: i64 =
          conn.query_row(&format!("SELECT COUNT(*) FROM {STAGING_TABLE}"), [], |r| r.get(0))?;

        let mut null_counts = Vec::with_capacity(critical.len());
        for column in critical {
          let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {STAGING_TABLE} WHERE {column} IS NULL"),
            [],
            |r| r.get(0),
          )?;
          null_counts.push((column.to_owned(), n));
        }

        let by_gender = counted(
          conn,
          &format!(
            "SELECT Gender, COUNT(*) AS n FROM {STAGING_TABLE} GROUP BY Gender ORDER BY n DESC"
          ),
        )?;

        let timestamps: Vec<String> = conn
          .prepare(&format!(
            "SELECT DISTINCT Timestamp FROM {STAGING_TABLE} WHERE Timestamp IS NOT NULL"
          ))?
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<_>>()?;

        let top_countries = counted(
          conn,
          &format!(
            "SELECT Country, COUNT(*) AS n FROM {STAGING_TABLE}
             WHERE Country IS NOT NULL
             GROUP BY Country ORDER BY n DESC, Country LIMIT 5"
          ),
        )?;

        Ok((row_count, null_counts, by_gender, timestamps, top_countries))
      })
      .await?;

    let range = timestamp_range(timestamps.iter().map(String::as_str));
    Ok(StagingProfile {
      row_count,
      null_counts,
      by_gender,
      earliest: range.map(|(lo, _)| lo),
      latest: range.map(|(_, hi)| hi),
      top_countries,
    })
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  async fn table_exists(&self, table: Table) -> Result<bool> {
    let name = table.name();
    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
          [name],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(exists)
  }

  async fn row_count(&self, table: Table) -> Result<i64> {
    self.require(table).await?;
    self.scalar(format!("SELECT COUNT(*) FROM {}", table.name())).await
  }

  async fn staging_rows(&self) -> Result<Vec<SurveyRecord>> {
    self.require(Table::Staging).await?;
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(SELECT_STAGING)?;
        let rows = stmt.query_map([], decode_record)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn clear_facts(&self) -> Result<i64> {
    self.require(Table::Facts).await?;
    let removed: usize = self
      .conn
      .call(|conn| Ok(conn.execute(&format!("DELETE FROM {FACT_TABLE}"), [])?))
      .await?;
    Ok(removed as i64)
  }

  async fn replace_dimension(&self, rows: DimensionRows) -> Result<i64> {
    let table = rows.dimension().table();
    self.require(Table::Dimension(rows.dimension())).await?;
    let insert = encode_dimension(rows);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        {
          let mut stmt = tx.prepare_cached(insert.sql)?;
          for row in &insert.rows {
            stmt.execute(params_from_iter(row.iter()))?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    self.scalar(format!("SELECT COUNT(*) FROM {table}")).await
  }

  async fn dimension_keys(&self) -> Result<DimensionKeys> {
    for dimension in Dimension::ALL {
      self.require(Table::Dimension(dimension)).await?;
    }

    let (periods, mut keys) = self
      .conn
      .call(|conn| {
        let periods: Vec<(i64, i64, i64)> = conn
          .prepare("SELECT id_tiempo, anio, mes FROM Dim_Tiempo")?
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<_>>()?;

        let symptoms = conn
          .prepare(
            "SELECT id_sintomas, growing_stress, mood_swings, coping_struggles,
                    social_weakness, indicador_inferido_estres
             FROM Dim_Sintomas",
          )?
          .query_map([], |r| {
            let profile = SymptomProfile {
              growing_stress:   r.get(1)?,
              mood_swings:      r.get(2)?,
              coping_struggles: r.get(3)?,
              social_weakness:  r.get(4)?,
            };
            Ok((profile, (r.get(0)?, r.get(5)?)))
          })?
          .collect::<rusqlite::Result<_>>()?;

        let access = conn
          .prepare("SELECT id_acceso, care_options, mental_health_interview FROM Dim_Acceso")?
          .query_map([], |r| {
            let profile = AccessProfile {
              care_options:            r.get(1)?,
              mental_health_interview: r.get(2)?,
            };
            Ok((profile, r.get(0)?))
          })?
          .collect::<rusqlite::Result<_>>()?;

        let keys = DimensionKeys {
          time: HashMap::new(),
          gender: text_keys(conn, "SELECT id_genero, genero FROM Dim_Genero")?,
          history: text_keys(conn, "SELECT id_historial, family_history FROM Dim_Historial")?,
          occupation: text_keys(conn, "SELECT id_ocupacion, occupation FROM Dim_Ocupacion")?,
          country: text_keys(conn, "SELECT id_pais, country FROM Dim_Pais")?,
          isolation: text_keys(conn, "SELECT id_aislamiento, days_indoors FROM Dim_Aislamiento")?,
          symptoms,
          access,
        };
        Ok((periods, keys))
      })
      .await?;

    for (id, year, month) in periods {
      keys.time.insert(decode_period(year, month)?, id);
    }
    Ok(keys)
  }

  async fn replace_facts(&self, facts: Vec<FactRow>) -> Result<i64> {
    self.require(Table::Facts).await?;
    let rows: Vec<_> = facts.iter().map(encode_fact).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {FACT_TABLE}"), [])?;
        {
          let mut stmt = tx.prepare_cached(INSERT_FACT)?;
          for row in &rows {
            stmt.execute(params_from_iter(row.iter()))?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    self.scalar(format!("SELECT COUNT(*) FROM {FACT_TABLE}")).await
  }

  async fn orphan_count(&self, dimension: Dimension) -> Result<i64> {
    self.require(Table::Facts).await?;
    self.require(Table::Dimension(dimension)).await?;
    let (table, key) = (dimension.table(), dimension.key_column());
    self
      .scalar(format!(
        "SELECT COUNT(*) FROM {FACT_TABLE} h
         LEFT JOIN {table} d ON h.{key} = d.{key}
         WHERE d.{key} IS NULL"
      ))
      .await
  }

  async fn percent_out_of_range(&self, column: &'static str) -> Result<i64> {
    if !PERCENT_COLUMNS.contains(&column) {
      return Err(salud_core::Error::UnknownColumn(column.to_owned()).into());
    }
    self.require(Table::Facts).await?;
    self
      .scalar(format!("SELECT COUNT(*) FROM {FACT_TABLE} WHERE {column} < 0 OR {column} > 100"))
      .await
  }

  async fn negative_counts(&self, column: &'static str) -> Result<i64> {
    if !COUNT_COLUMNS.contains(&column) {
      return Err(salud_core::Error::UnknownColumn(column.to_owned()).into());
    }
    self.require(Table::Facts).await?;
    self.scalar(format!("SELECT COUNT(*) FROM {FACT_TABLE} WHERE {column} < 0")).await
  }

  async fn treatment_inconsistencies(&self) -> Result<i64> {
    self.require(Table::Facts).await?;
    self
      .scalar(format!(
        "SELECT COUNT(*) FROM {FACT_TABLE}
         WHERE porcentaje_tratamiento IS NOT NULL
           AND porcentaje_no_tratamiento IS NOT NULL
           AND ABS(porcentaje_tratamiento + porcentaje_no_tratamiento - 100) > 1"
      ))
      .await
  }

  async fn symptom_rule_check(&self) -> Result<SymptomRuleCheck> {
    self.require(Table::Dimension(Dimension::Symptoms)).await?;
    let check = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             COALESCE(SUM(growing_stress =  'Yes' AND indicador_inferido_estres = 0), 0),
             COALESCE(SUM(growing_stress <> 'Yes' AND indicador_inferido_estres = 1), 0),
             COALESCE(SUM(indicador_inferido_estres = 1), 0),
             COALESCE(SUM(indicador_inferido_estres = 0), 0)
           FROM Dim_Sintomas",
          [],
          |r| {
            Ok(SymptomRuleCheck {
              reported_not_flagged: r.get(0)?,
              inferred_only:        r.get(1)?,
              flagged:              r.get(2)?,
              not_flagged:          r.get(3)?,
            })
          },
        )?)
      })
      .await?;
    Ok(check)
  }

  async fn warehouse_stats(&self) -> Result<WarehouseStats> {
    self.require(Table::Facts).await?;
    for dimension in [Dimension::Time, Dimension::Gender, Dimension::Country] {
      self.require(Table::Dimension(dimension)).await?;
    }

    let mut stats = self
      .conn
      .call(|conn| {
        let (first_year, last_year) = conn.query_row(
          &format!(
            "SELECT MIN(dt.anio), MAX(dt.anio)
             FROM {FACT_TABLE} h JOIN Dim_Tiempo dt ON h.id_tiempo = dt.id_tiempo"
          ),
          [],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        let facts_by_gender = counted(
          conn,
          &format!(
            "SELECT dg.genero, COUNT(*)
             FROM {FACT_TABLE} h JOIN Dim_Genero dg ON h.id_genero = dg.id_genero
             GROUP BY dg.genero ORDER BY dg.genero"
          ),
        )?;

        let top_countries = counted(
          conn,
          &format!(
            "SELECT dp.country, COUNT(*) AS n
             FROM {FACT_TABLE} h JOIN Dim_Pais dp ON h.id_pais = dp.id_pais
             GROUP BY dp.country ORDER BY n DESC, dp.country LIMIT 5"
          ),
        )?;

        let (avg_stress_pct, avg_treatment_pct) = conn.query_row(
          &format!(
            "SELECT AVG(porcentaje_estres), AVG(porcentaje_tratamiento) FROM {FACT_TABLE}"
          ),
          [],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        Ok(WarehouseStats {
          first_year,
          last_year,
          facts_by_gender,
          top_countries,
          avg_stress_pct,
          avg_treatment_pct,
        })
      })
      .await?;

    stats.avg_stress_pct = stats.avg_stress_pct.map(round2);
    stats.avg_treatment_pct = stats.avg_treatment_pct.map(round2);
    Ok(stats)
  }

  async fn export_rows(&self) -> Result<Vec<ExportRow>> {
    for table in Table::ALL.into_iter().filter(|t| *t != Table::Staging) {
      self.require(table).await?;
    }
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(SELECT_EXPORT)?;
        let rows = stmt.query_map([], decode_export)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}
