//! Enumerated answer domains and the predicates built on them.

use serde::{Deserialize, Serialize};

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Accepted values for `Gender` after normalisation.
pub const GENDERS: [&str; 2] = ["Male", "Female"];

/// Severity bucket of an isolation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
  Bajo,
  Medio,
  Alto,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Severity::Bajo => "Bajo",
      Severity::Medio => "Medio",
      Severity::Alto => "Alto",
    }
  }
}

/// One accepted `Days_Indoors` answer with its rank and severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsolationLevel {
  pub label:    &'static str,
  pub rank:     u8,
  pub severity: Severity,
}

/// Accepted `Days_Indoors` answers, least to most isolated.
pub const ISOLATION_LEVELS: [IsolationLevel; 5] = [
  IsolationLevel { label: "Go out Every day",   rank: 1, severity: Severity::Bajo },
  IsolationLevel { label: "1-14 days",          rank: 2, severity: Severity::Bajo },
  IsolationLevel { label: "15-30 days",         rank: 3, severity: Severity::Medio },
  IsolationLevel { label: "31-60 days",         rank: 4, severity: Severity::Alto },
  IsolationLevel { label: "More than 2 months", rank: 5, severity: Severity::Alto },
];

pub fn is_valid_gender(value: &str) -> bool { GENDERS.contains(&value) }

pub fn is_valid_days_indoors(value: &str) -> bool {
  ISOLATION_LEVELS.iter().any(|l| l.label == value)
}

pub fn is_yes(value: Option<&str>) -> bool { value == Some(YES) }

pub fn is_no(value: Option<&str>) -> bool { value == Some(NO) }

/// Mood swings of `Medium` or `High`.
pub fn is_elevated_mood(value: Option<&str>) -> bool {
  matches!(value, Some("Medium" | "High"))
}

/// Isolation of fifteen days or more.
pub fn is_prolonged_isolation(value: Option<&str>) -> bool {
  matches!(value, Some("15-30 days" | "31-60 days" | "More than 2 months"))
}

/// Care options known or possibly available.
pub fn has_care_access(value: Option<&str>) -> bool {
  matches!(value, Some("Yes" | "Not sure"))
}

/// Willing, or possibly willing, to discuss mental health in an interview.
pub fn is_open_to_interview(value: Option<&str>) -> bool {
  matches!(value, Some("Yes" | "Maybe"))
}

/// Growing stress answered `No` or `Maybe`.
pub fn is_unreported_stress(value: Option<&str>) -> bool {
  matches!(value, Some("No" | "Maybe"))
}

/// The isolation path of the inferred-stress rule: elevated mood swings,
/// coping struggles, and at least fifteen days indoors.
pub fn has_isolation_symptoms(
  mood_swings: Option<&str>,
  coping_struggles: Option<&str>,
  days_indoors: Option<&str>,
) -> bool {
  is_elevated_mood(mood_swings)
    && is_yes(coping_struggles)
    && is_prolonged_isolation(days_indoors)
}

/// Inferred stress for a single response.
///
/// Reported growing stress always counts; otherwise the isolation path
/// decides.
pub fn infer_stress(
  growing_stress: Option<&str>,
  mood_swings: Option<&str>,
  coping_struggles: Option<&str>,
  days_indoors: Option<&str>,
) -> bool {
  is_yes(growing_stress)
    || has_isolation_symptoms(mood_swings, coping_struggles, days_indoors)
}

/// Title-case a value: first letter of each alphabetic run upper, rest lower.
pub fn title_case(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  let mut at_word_start = true;
  for ch in value.chars() {
    if ch.is_alphabetic() {
      if at_word_start {
        out.extend(ch.to_uppercase());
      } else {
        out.extend(ch.to_lowercase());
      }
      at_word_start = false;
    } else {
      out.push(ch);
      at_word_start = true;
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn title_case_matches_gender_spellings() {
    assert_eq!(title_case("male"), "Male");
    assert_eq!(title_case("FEMALE"), "Female");
    assert_eq!(title_case("fEmAlE"), "Female");
    assert_eq!(title_case("non-binary"), "Non-Binary");
    assert_eq!(title_case(""), "");
  }

  #[test]
  fn reported_stress_always_infers() {
    assert!(infer_stress(Some("Yes"), Some("Low"), Some("No"), Some("Go out Every day")));
  }

  #[test]
  fn isolation_path_needs_all_three_symptoms() {
    assert!(infer_stress(Some("No"), Some("High"), Some("Yes"), Some("31-60 days")));
    assert!(infer_stress(Some("Maybe"), Some("Medium"), Some("Yes"), Some("15-30 days")));
    assert!(!infer_stress(Some("No"), Some("Low"), Some("Yes"), Some("31-60 days")));
    assert!(!infer_stress(Some("No"), Some("High"), Some("No"), Some("31-60 days")));
    assert!(!infer_stress(Some("No"), Some("High"), Some("Yes"), Some("1-14 days")));
    assert!(!infer_stress(None, None, None, None));
  }

  #[test]
  fn isolation_levels_are_ranked() {
    let ranks: Vec<u8> = ISOLATION_LEVELS.iter().map(|l| l.rank).collect();
    assert_eq!(ranks, [1, 2, 3, 4, 5]);
    assert!(is_valid_days_indoors("More than 2 months"));
    assert!(!is_valid_days_indoors("more than 2 months"));
  }
}
