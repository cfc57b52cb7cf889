//! Survey records: one row of the raw, cleaned, or staged dataset.
//!
//! Every field is optional text: the raw file may leave any cell empty, and
//! the staging table mirrors the file column-for-column. Cleaning guarantees
//! that the [`CRITICAL_COLUMNS`] are populated, nothing more.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Columns ─────────────────────────────────────────────────────────────────

/// A named column of the survey dataset, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
  Timestamp,
  Gender,
  Country,
  Occupation,
  SelfEmployed,
  FamilyHistory,
  Treatment,
  DaysIndoors,
  GrowingStress,
  ChangesHabits,
  MentalHealthHistory,
  MoodSwings,
  CopingStruggles,
  WorkInterest,
  SocialWeakness,
  MentalHealthInterview,
  CareOptions,
}

impl Column {
  /// All columns, in the order they appear in the file and staging table.
  pub const ALL: [Column; 17] = [
    Column::Timestamp,
    Column::Gender,
    Column::Country,
    Column::Occupation,
    Column::SelfEmployed,
    Column::FamilyHistory,
    Column::Treatment,
    Column::DaysIndoors,
    Column::GrowingStress,
    Column::ChangesHabits,
    Column::MentalHealthHistory,
    Column::MoodSwings,
    Column::CopingStruggles,
    Column::WorkInterest,
    Column::SocialWeakness,
    Column::MentalHealthInterview,
    Column::CareOptions,
  ];

  /// The header name used in the CSV files and as the staging column name.
  pub fn header(self) -> &'static str {
    match self {
      Column::Timestamp => "Timestamp",
      Column::Gender => "Gender",
      Column::Country => "Country",
      Column::Occupation => "Occupation",
      Column::SelfEmployed => "self_employed",
      Column::FamilyHistory => "family_history",
      Column::Treatment => "treatment",
      Column::DaysIndoors => "Days_Indoors",
      Column::GrowingStress => "Growing_Stress",
      Column::ChangesHabits => "Changes_Habits",
      Column::MentalHealthHistory => "Mental_Health_History",
      Column::MoodSwings => "Mood_Swings",
      Column::CopingStruggles => "Coping_Struggles",
      Column::WorkInterest => "Work_Interest",
      Column::SocialWeakness => "Social_Weakness",
      Column::MentalHealthInterview => "mental_health_interview",
      Column::CareOptions => "care_options",
    }
  }
}

impl FromStr for Column {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Column::ALL
      .into_iter()
      .find(|c| c.header() == s)
      .ok_or_else(|| Error::UnknownColumn(s.to_owned()))
  }
}

/// Columns that must be populated in every cleaned and staged row.
pub const CRITICAL_COLUMNS: [Column; 13] = [
  Column::Timestamp,
  Column::Gender,
  Column::Country,
  Column::Occupation,
  Column::FamilyHistory,
  Column::Treatment,
  Column::DaysIndoors,
  Column::GrowingStress,
  Column::MoodSwings,
  Column::CopingStruggles,
  Column::SocialWeakness,
  Column::CareOptions,
  Column::MentalHealthInterview,
];

// ─── Record ──────────────────────────────────────────────────────────────────

/// One survey response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyRecord {
  #[serde(rename = "Timestamp")]
  pub timestamp:               Option<String>,
  #[serde(rename = "Gender")]
  pub gender:                  Option<String>,
  #[serde(rename = "Country")]
  pub country:                 Option<String>,
  #[serde(rename = "Occupation")]
  pub occupation:              Option<String>,
  pub self_employed:           Option<String>,
  pub family_history:          Option<String>,
  pub treatment:               Option<String>,
  #[serde(rename = "Days_Indoors")]
  pub days_indoors:            Option<String>,
  #[serde(rename = "Growing_Stress")]
  pub growing_stress:          Option<String>,
  #[serde(rename = "Changes_Habits")]
  pub changes_habits:          Option<String>,
  #[serde(rename = "Mental_Health_History")]
  pub mental_health_history:   Option<String>,
  #[serde(rename = "Mood_Swings")]
  pub mood_swings:             Option<String>,
  #[serde(rename = "Coping_Struggles")]
  pub coping_struggles:        Option<String>,
  #[serde(rename = "Work_Interest")]
  pub work_interest:           Option<String>,
  #[serde(rename = "Social_Weakness")]
  pub social_weakness:         Option<String>,
  pub mental_health_interview: Option<String>,
  pub care_options:            Option<String>,
}

impl SurveyRecord {
  pub fn get(&self, column: Column) -> Option<&str> { self.slot(column).as_deref() }

  pub fn set(&mut self, column: Column, value: Option<String>) {
    *self.slot_mut(column) = value;
  }

  /// Apply `f` to every populated field.
  pub fn map_values(&mut self, mut f: impl FnMut(&str) -> Option<String>) {
    for column in Column::ALL {
      let slot = self.slot_mut(column);
      if let Some(value) = slot.as_deref() {
        *slot = f(value);
      }
    }
  }

  /// Values in [`Column::ALL`] order, as bound into the staging insert.
  pub fn values(&self) -> [Option<&str>; 17] { Column::ALL.map(|c| self.get(c)) }

  fn slot(&self, column: Column) -> &Option<String> {
    match column {
      Column::Timestamp => &self.timestamp,
      Column::Gender => &self.gender,
      Column::Country => &self.country,
      Column::Occupation => &self.occupation,
      Column::SelfEmployed => &self.self_employed,
      Column::FamilyHistory => &self.family_history,
      Column::Treatment => &self.treatment,
      Column::DaysIndoors => &self.days_indoors,
      Column::GrowingStress => &self.growing_stress,
      Column::ChangesHabits => &self.changes_habits,
      Column::MentalHealthHistory => &self.mental_health_history,
      Column::MoodSwings => &self.mood_swings,
      Column::CopingStruggles => &self.coping_struggles,
      Column::WorkInterest => &self.work_interest,
      Column::SocialWeakness => &self.social_weakness,
      Column::MentalHealthInterview => &self.mental_health_interview,
      Column::CareOptions => &self.care_options,
    }
  }

  fn slot_mut(&mut self, column: Column) -> &mut Option<String> {
    match column {
      Column::Timestamp => &mut self.timestamp,
      Column::Gender => &mut self.gender,
      Column::Country => &mut self.country,
      Column::Occupation => &mut self.occupation,
      Column::SelfEmployed => &mut self.self_employed,
      Column::FamilyHistory => &mut self.family_history,
      Column::Treatment => &mut self.treatment,
      Column::DaysIndoors => &mut self.days_indoors,
      Column::GrowingStress => &mut self.growing_stress,
      Column::ChangesHabits => &mut self.changes_habits,
      Column::MentalHealthHistory => &mut self.mental_health_history,
      Column::MoodSwings => &mut self.mood_swings,
      Column::CopingStruggles => &mut self.coping_struggles,
      Column::WorkInterest => &mut self.work_interest,
      Column::SocialWeakness => &mut self.social_weakness,
      Column::MentalHealthInterview => &mut self.mental_health_interview,
      Column::CareOptions => &mut self.care_options,
    }
  }
}
