//! CSV files read and written by the pipeline.

use std::{fs, path::Path};

use salud_core::{
  record::{Column, SurveyRecord},
  store::{EXPORT_HEADER, ExportRow},
};

use crate::{Error, Result};

/// Read every survey record from `path`. Empty cells become `None`.
pub fn read_records(path: &Path) -> Result<Vec<SurveyRecord>> {
  if !path.is_file() {
    return Err(Error::MissingInput(path.to_path_buf()));
  }
  let mut reader = csv::Reader::from_path(path)?;
  let records = reader.deserialize().collect::<Result<Vec<SurveyRecord>, _>>()?;
  Ok(records)
}

/// Write `records` with the survey header, even when there are none.
pub fn write_records(path: &Path, records: &[SurveyRecord]) -> Result<()> {
  ensure_parent(path)?;
  let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
  writer.write_record(Column::ALL.map(Column::header))?;
  for record in records {
    writer.serialize(record)?;
  }
  writer.flush()?;
  Ok(())
}

/// Write the denormalised export with its header, even when there are no
/// rows.
pub fn write_export(path: &Path, rows: &[ExportRow]) -> Result<()> {
  ensure_parent(path)?;
  let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
  writer.write_record(EXPORT_HEADER)?;
  for row in rows {
    writer.serialize(row)?;
  }
  writer.flush()?;
  Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
  match path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => Ok(fs::create_dir_all(dir)?),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use salud_core::store::EXPORT_COLUMNS;

  use super::*;

  const RAW: &str = "\
Timestamp,Gender,Country,Occupation,self_employed,family_history,treatment,Days_Indoors,Growing_Stress,Changes_Habits,Mental_Health_History,Mood_Swings,Coping_Struggles,Work_Interest,Social_Weakness,mental_health_interview,care_options
8/27/2014 11:29,Female,United States,Corporate,,No,Yes,1-14 days,Yes,No,Yes,Medium,No,No,Yes,No,Not sure
8/27/2014 11:31,Female,United States,Corporate,,Yes,Yes,1-14 days,Yes,No,Yes,Medium,No,No,Yes,No,No
";

  #[test]
  fn empty_cells_read_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.csv");
    fs::write(&path, RAW).unwrap();

    let records = read_records(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].self_employed, None);
    assert_eq!(records[0].care_options.as_deref(), Some("Not sure"));
    assert_eq!(records[1].family_history.as_deref(), Some("Yes"));
  }

  #[test]
  fn written_records_read_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    fs::write(&raw, RAW).unwrap();
    let records = read_records(&raw).unwrap();

    let out = dir.path().join("nested/clean.csv");
    write_records(&out, &records).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().next(), RAW.lines().next());
    assert_eq!(read_records(&out).unwrap(), records);
  }

  #[test]
  fn empty_output_keeps_header() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("clean.csv");
    write_records(&out, &[]).unwrap();
    assert_eq!(read_records(&out).unwrap(), Vec::new());
    assert!(fs::read_to_string(&out).unwrap().starts_with("Timestamp,Gender,"));
  }

  #[test]
  fn empty_export_keeps_header() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("export/powerbi_export.csv");
    write_export(&out, &[]).unwrap();

    let mut reader = csv::Reader::from_path(&out).unwrap();
    let header = reader.headers().unwrap().clone();
    assert_eq!(header.len(), EXPORT_COLUMNS);
    assert_eq!(&header[0], "anio");
    assert_eq!(&header[EXPORT_COLUMNS - 1], "porcentaje_postergacion");
    assert_eq!(reader.records().count(), 0);
  }

  #[test]
  fn missing_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.csv");
    assert!(matches!(read_records(&path), Err(Error::MissingInput(p)) if p == path));
  }
}
