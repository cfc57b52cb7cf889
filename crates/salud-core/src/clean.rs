//! Cleaning rules for raw survey records.
//!
//! [`clean`] applies the passes in a fixed order and reports how many rows
//! each one removed. Running it over its own output removes nothing.

use std::collections::HashSet;

use crate::{
  category::{is_valid_days_indoors, is_valid_gender, title_case},
  record::{Column, CRITICAL_COLUMNS, SurveyRecord},
};

// ─── Quality profile ─────────────────────────────────────────────────────────

/// Missing values and duplicates observed before cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityProfile {
  pub total_rows: usize,
  /// Columns with at least one missing value, in file order.
  pub missing:    Vec<(Column, usize)>,
  pub duplicates: usize,
}

impl QualityProfile {
  pub fn missing_pct(&self, count: usize) -> f64 { pct(count, self.total_rows) }
}

pub fn profile(records: &[SurveyRecord]) -> QualityProfile {
  let missing = Column::ALL
    .into_iter()
    .map(|c| (c, records.iter().filter(|r| is_missing(r.get(c))).count()))
    .filter(|(_, n)| *n > 0)
    .collect();

  let mut seen = HashSet::with_capacity(records.len());
  let duplicates = records.iter().filter(|r| !seen.insert(*r)).count();

  QualityProfile { total_rows: records.len(), missing, duplicates }
}

// ─── Cleaning ────────────────────────────────────────────────────────────────

/// Rows removed by each cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
  pub initial_rows:          usize,
  pub duplicates_removed:    usize,
  /// Rows that only became identical once whitespace and case were
  /// normalised.
  pub normalized_duplicates: usize,
  /// Rows dropped for a missing critical value, per column, in check order.
  pub missing_removed:       Vec<(Column, usize)>,
  pub invalid_gender:        usize,
  pub invalid_days_indoors:  usize,
  pub final_rows:            usize,
}

impl CleanReport {
  pub fn removed(&self) -> usize { self.initial_rows - self.final_rows }

  pub fn removed_pct(&self) -> f64 { pct(self.removed(), self.initial_rows) }
}

/// Clean `records`, preserving the order of the rows that survive.
///
/// 1. drop exact duplicates
/// 2. trim every text value; whitespace-only values become missing
/// 3. title-case `Gender`
/// 4. drop rows missing any critical column
/// 5. keep only `Male` / `Female`
/// 6. keep only the five `Days_Indoors` categories
pub fn clean(records: Vec<SurveyRecord>) -> (Vec<SurveyRecord>, CleanReport) {
  let mut report = CleanReport { initial_rows: records.len(), ..Default::default() };

  let mut rows = dedup(records);
  report.duplicates_removed = report.initial_rows - rows.len();

  for row in &mut rows {
    normalize(row);
  }
  let before = rows.len();
  rows = dedup(rows);
  report.normalized_duplicates = before - rows.len();

  for column in CRITICAL_COLUMNS {
    let before = rows.len();
    rows.retain(|r| r.get(column).is_some());
    let removed = before - rows.len();
    if removed > 0 {
      report.missing_removed.push((column, removed));
    }
  }

  let before = rows.len();
  rows.retain(|r| r.gender.as_deref().is_some_and(is_valid_gender));
  report.invalid_gender = before - rows.len();

  let before = rows.len();
  rows.retain(|r| r.days_indoors.as_deref().is_some_and(is_valid_days_indoors));
  report.invalid_days_indoors = before - rows.len();

  report.final_rows = rows.len();
  (rows, report)
}

fn normalize(row: &mut SurveyRecord) {
  row.map_values(|v| {
    let trimmed = v.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
  });
  if let Some(gender) = row.gender.take() {
    row.gender = Some(title_case(&gender));
  }
}

fn dedup(records: Vec<SurveyRecord>) -> Vec<SurveyRecord> {
  let mut seen = HashSet::with_capacity(records.len());
  records.into_iter().filter(|r| seen.insert(r.clone())).collect()
}

fn is_missing(value: Option<&str>) -> bool { value.is_none_or(|v| v.trim().is_empty()) }

fn pct(count: usize, total: usize) -> f64 {
  if total == 0 { 0.0 } else { count as f64 / total as f64 * 100.0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn valid_row(timestamp: &str) -> SurveyRecord {
    SurveyRecord {
      timestamp:               Some(timestamp.into()),
      gender:                  Some("Female".into()),
      country:                 Some("United States".into()),
      occupation:              Some("Corporate".into()),
      self_employed:           Some("No".into()),
      family_history:          Some("Yes".into()),
      treatment:               Some("Yes".into()),
      days_indoors:            Some("1-14 days".into()),
      growing_stress:          Some("Yes".into()),
      changes_habits:          Some("No".into()),
      mental_health_history:   Some("Yes".into()),
      mood_swings:             Some("Medium".into()),
      coping_struggles:        Some("No".into()),
      work_interest:           Some("No".into()),
      social_weakness:         Some("Yes".into()),
      mental_health_interview: Some("No".into()),
      care_options:            Some("Not sure".into()),
    }
  }

  #[test]
  fn exact_duplicates_are_removed_first() {
    let rows = vec![valid_row("8/27/2014 11:29"), valid_row("8/27/2014 11:29")];
    let (out, report) = clean(rows);
    assert_eq!(out.len(), 1);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.normalized_duplicates, 0);
  }

  #[test]
  fn whitespace_and_case_are_normalized() {
    let mut a = valid_row("8/27/2014 11:29");
    a.gender = Some("  female ".into());
    a.country = Some(" United States".into());
    let (out, report) = clean(vec![a, valid_row("8/27/2014 11:29")]);

    assert_eq!(report.duplicates_removed, 0);
    assert_eq!(report.normalized_duplicates, 1);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].gender.as_deref(), Some("Female"));
    assert_eq!(out[0].country.as_deref(), Some("United States"));
  }

  #[test]
  fn missing_critical_values_are_counted_per_column() {
    let mut no_country = valid_row("8/27/2014 11:29");
    no_country.country = None;
    let mut blank_care = valid_row("8/27/2014 11:30");
    blank_care.care_options = Some("   ".into());
    let mut no_optional = valid_row("8/27/2014 11:31");
    no_optional.self_employed = None;

    let (out, report) = clean(vec![no_country, blank_care, no_optional]);
    assert_eq!(out.len(), 1);
    assert_eq!(
      report.missing_removed,
      vec![(Column::Country, 1), (Column::CareOptions, 1)]
    );
  }

  #[test]
  fn invalid_categories_are_dropped() {
    let mut other_gender = valid_row("8/27/2014 11:29");
    other_gender.gender = Some("Other".into());
    let mut bad_days = valid_row("8/27/2014 11:30");
    bad_days.days_indoors = Some("Sometimes".into());

    let (out, report) =
      clean(vec![other_gender, bad_days, valid_row("8/27/2014 11:31")]);
    assert_eq!(out.len(), 1);
    assert_eq!(report.invalid_gender, 1);
    assert_eq!(report.invalid_days_indoors, 1);
    assert_eq!(report.removed(), 2);
    assert!((report.removed_pct() - 66.666).abs() < 0.01);
  }

  #[test]
  fn cleaning_is_idempotent() {
    let mut messy = valid_row("8/27/2014 11:29");
    messy.gender = Some("MALE ".into());
    let mut missing = valid_row("8/27/2014 11:30");
    missing.treatment = None;
    let rows = vec![messy, missing, valid_row("8/27/2014 11:31"), valid_row("8/27/2014 11:31")];

    let (once, _) = clean(rows);
    let (twice, report) = clean(once.clone());
    assert_eq!(once, twice);
    assert_eq!(report.removed(), 0);
  }

  #[test]
  fn cleaned_rows_satisfy_invariants() {
    let mut a = valid_row("8/27/2014 11:29");
    a.gender = Some("female".into());
    let mut b = valid_row("8/27/2014 11:30");
    b.mood_swings = None;
    let (out, _) = clean(vec![a, b]);

    for row in &out {
      assert!(CRITICAL_COLUMNS.iter().all(|c| row.get(*c).is_some()));
      assert!(is_valid_gender(row.gender.as_deref().unwrap()));
      assert!(is_valid_days_indoors(row.days_indoors.as_deref().unwrap()));
    }
  }

  #[test]
  fn profile_counts_missing_and_duplicates() {
    let mut blank = valid_row("8/27/2014 11:29");
    blank.work_interest = Some(" ".into());
    let rows = vec![blank.clone(), blank, valid_row("8/27/2014 11:30")];

    let p = profile(&rows);
    assert_eq!(p.total_rows, 3);
    assert_eq!(p.duplicates, 1);
    assert_eq!(p.missing, vec![(Column::WorkInterest, 2)]);
    assert!((p.missing_pct(2) - 66.666).abs() < 0.01);
  }
}
