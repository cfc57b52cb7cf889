//! The eight analytical dimensions and the rows that populate them.
//!
//! Five dimensions are fixed lookup lists. Time, symptoms and access are
//! derived from the staged survey rows.

use std::{collections::BTreeMap, str::FromStr};

use crate::{
  Error,
  category::{ISOLATION_LEVELS, IsolationLevel, has_isolation_symptoms, is_yes},
  record::SurveyRecord,
  time::{TimePeriod, parse_period},
};

// ─── Dimension identity ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
  Time,
  Gender,
  History,
  Occupation,
  Country,
  Isolation,
  Symptoms,
  Access,
}

impl Dimension {
  /// Fact-key order.
  pub const ALL: [Dimension; 8] = [
    Dimension::Time,
    Dimension::Gender,
    Dimension::History,
    Dimension::Occupation,
    Dimension::Country,
    Dimension::Isolation,
    Dimension::Symptoms,
    Dimension::Access,
  ];

  pub fn table(self) -> &'static str {
    match self {
      Dimension::Time => "Dim_Tiempo",
      Dimension::Gender => "Dim_Genero",
      Dimension::History => "Dim_Historial",
      Dimension::Occupation => "Dim_Ocupacion",
      Dimension::Country => "Dim_Pais",
      Dimension::Isolation => "Dim_Aislamiento",
      Dimension::Symptoms => "Dim_Sintomas",
      Dimension::Access => "Dim_Acceso",
    }
  }

  /// Identity column, shared by the dimension and the fact table.
  pub fn key_column(self) -> &'static str {
    match self {
      Dimension::Time => "id_tiempo",
      Dimension::Gender => "id_genero",
      Dimension::History => "id_historial",
      Dimension::Occupation => "id_ocupacion",
      Dimension::Country => "id_pais",
      Dimension::Isolation => "id_aislamiento",
      Dimension::Symptoms => "id_sintomas",
      Dimension::Access => "id_acceso",
    }
  }

  /// Fixed lists carry no dependency on staged data.
  pub fn is_static(self) -> bool {
    !matches!(self, Dimension::Time | Dimension::Symptoms | Dimension::Access)
  }
}

impl FromStr for Dimension {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Dimension::ALL
      .into_iter()
      .find(|d| d.table() == s)
      .ok_or_else(|| Error::UnknownDimension(s.to_owned()))
  }
}

// ─── Static lookups ──────────────────────────────────────────────────────────

/// A categorical value with a human description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Described {
  pub value:       &'static str,
  pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
  pub name:     &'static str,
  pub region:   &'static str,
  pub iso_code: &'static str,
}

pub const GENDER_ROWS: [Described; 2] = [
  Described { value: "Male",   description: "Masculino" },
  Described { value: "Female", description: "Femenino" },
];

pub const HISTORY_ROWS: [Described; 2] = [
  Described {
    value:       "Yes",
    description: "Con antecedentes familiares de problemas de salud mental",
  },
  Described {
    value:       "No",
    description: "Sin antecedentes familiares de problemas de salud mental",
  },
];

pub const OCCUPATION_ROWS: [Described; 5] = [
  Described { value: "Corporate", description: "Empleado en sector corporativo" },
  Described { value: "Student",   description: "Estudiante" },
  Described { value: "Business",  description: "Empresario o negocio propio" },
  Described { value: "Housewife", description: "Ama de casa" },
  Described { value: "Others",    description: "Otras ocupaciones" },
];

const fn country(name: &'static str, region: &'static str, iso_code: &'static str) -> Country {
  Country { name, region, iso_code }
}

const NORTH_AMERICA: &str = "América del Norte";
const EUROPE: &str = "Europa";
const ASIA: &str = "Asia";
const OCEANIA: &str = "Oceanía";
const AFRICA: &str = "África";
const LATIN_AMERICA: &str = "América Latina";

pub const COUNTRY_ROWS: [Country; 35] = [
  country("United States", NORTH_AMERICA, "USA"),
  country("Canada", NORTH_AMERICA, "CAN"),
  country("Mexico", NORTH_AMERICA, "MEX"),
  country("United Kingdom", EUROPE, "GBR"),
  country("Germany", EUROPE, "DEU"),
  country("France", EUROPE, "FRA"),
  country("Netherlands", EUROPE, "NLD"),
  country("Sweden", EUROPE, "SWE"),
  country("Denmark", EUROPE, "DNK"),
  country("Finland", EUROPE, "FIN"),
  country("Switzerland", EUROPE, "CHE"),
  country("Belgium", EUROPE, "BEL"),
  country("Ireland", EUROPE, "IRL"),
  country("Poland", EUROPE, "POL"),
  country("Portugal", EUROPE, "PRT"),
  country("Greece", EUROPE, "GRC"),
  country("Italy", EUROPE, "ITA"),
  country("Czech Republic", EUROPE, "CZE"),
  country("Croatia", EUROPE, "HRV"),
  country("Bosnia and Herzegovina", EUROPE, "BIH"),
  country("Russia", EUROPE, "RUS"),
  country("Moldova", EUROPE, "MDA"),
  country("Georgia", EUROPE, "GEO"),
  country("India", ASIA, "IND"),
  country("Philippines", ASIA, "PHL"),
  country("Thailand", ASIA, "THA"),
  country("Singapore", ASIA, "SGP"),
  country("Israel", ASIA, "ISR"),
  country("Australia", OCEANIA, "AUS"),
  country("New Zealand", OCEANIA, "NZL"),
  country("Nigeria", AFRICA, "NGA"),
  country("South Africa", AFRICA, "ZAF"),
  country("Brazil", LATIN_AMERICA, "BRA"),
  country("Colombia", LATIN_AMERICA, "COL"),
  country("Costa Rica", LATIN_AMERICA, "CRI"),
];

// ─── Derived rows ────────────────────────────────────────────────────────────

/// The four symptom answers that identify a `Dim_Sintomas` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymptomProfile {
  pub growing_stress:   String,
  pub mood_swings:      String,
  pub coping_struggles: String,
  pub social_weakness:  String,
}

impl SymptomProfile {
  /// `None` if any of the four answers is missing.
  pub fn of(row: &SurveyRecord) -> Option<Self> {
    Some(Self {
      growing_stress:   row.growing_stress.clone()?,
      mood_swings:      row.mood_swings.clone()?,
      coping_struggles: row.coping_struggles.clone()?,
      social_weakness:  row.social_weakness.clone()?,
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomRow {
  pub profile:         SymptomProfile,
  pub inferred_stress: bool,
}

/// The two access answers that identify a `Dim_Acceso` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessProfile {
  pub care_options:            String,
  pub mental_health_interview: String,
}

impl AccessProfile {
  pub fn of(row: &SurveyRecord) -> Option<Self> {
    Some(Self {
      care_options:            row.care_options.clone()?,
      mental_health_interview: row.mental_health_interview.clone()?,
    })
  }
}

/// The full contents of one dimension table, ready to replace it.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionRows {
  Time(Vec<TimePeriod>),
  Gender(Vec<Described>),
  History(Vec<Described>),
  Occupation(Vec<Described>),
  Country(Vec<Country>),
  Isolation(Vec<IsolationLevel>),
  Symptoms(Vec<SymptomRow>),
  Access(Vec<AccessProfile>),
}

impl DimensionRows {
  /// Rows of a fixed lookup dimension; `None` for data-derived ones.
  pub fn fixed(dimension: Dimension) -> Option<Self> {
    match dimension {
      Dimension::Gender => Some(Self::Gender(GENDER_ROWS.to_vec())),
      Dimension::History => Some(Self::History(HISTORY_ROWS.to_vec())),
      Dimension::Occupation => Some(Self::Occupation(OCCUPATION_ROWS.to_vec())),
      Dimension::Country => Some(Self::Country(COUNTRY_ROWS.to_vec())),
      Dimension::Isolation => Some(Self::Isolation(ISOLATION_LEVELS.to_vec())),
      Dimension::Time | Dimension::Symptoms | Dimension::Access => None,
    }
  }

  pub fn dimension(&self) -> Dimension {
    match self {
      Self::Time(_) => Dimension::Time,
      Self::Gender(_) => Dimension::Gender,
      Self::History(_) => Dimension::History,
      Self::Occupation(_) => Dimension::Occupation,
      Self::Country(_) => Dimension::Country,
      Self::Isolation(_) => Dimension::Isolation,
      Self::Symptoms(_) => Dimension::Symptoms,
      Self::Access(_) => Dimension::Access,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Self::Time(r) => r.len(),
      Self::Gender(r) | Self::History(r) | Self::Occupation(r) => r.len(),
      Self::Country(r) => r.len(),
      Self::Isolation(r) => r.len(),
      Self::Symptoms(r) => r.len(),
      Self::Access(r) => r.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Derivation from staging ─────────────────────────────────────────────────

/// Distinct periods found in staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDerivation {
  /// Ascending by `(year, month)`.
  pub periods:     Vec<TimePeriod>,
  /// Populated timestamps the positional parse rejected.
  pub unparseable: usize,
}

pub fn derive_time(rows: &[SurveyRecord]) -> TimeDerivation {
  let mut periods = std::collections::BTreeSet::new();
  let mut unparseable = 0;
  for ts in rows.iter().filter_map(|r| r.timestamp.as_deref()) {
    if ts.is_empty() {
      continue;
    }
    match parse_period(ts) {
      Some(p) => {
        periods.insert(p);
      }
      None => unparseable += 1,
    }
  }
  TimeDerivation { periods: periods.into_iter().collect(), unparseable }
}

/// Distinct symptom profiles with their inferred-stress flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomDerivation {
  pub rows:      Vec<SymptomRow>,
  /// Profiles without reported stress whose staged rows disagree on the
  /// isolation path (some rows qualify, some do not). Their flag is `true`.
  pub ambiguous: Vec<SymptomProfile>,
}

/// One row per distinct symptom profile.
///
/// The isolation path reads `Days_Indoors`, which is not part of the profile.
/// A profile is flagged when stress is reported, or when any staged row with
/// that profile meets the isolation path.
pub fn derive_symptoms(rows: &[SurveyRecord]) -> SymptomDerivation {
  #[derive(Default)]
  struct Seen {
    qualifying:     bool,
    non_qualifying: bool,
  }

  let mut profiles: BTreeMap<SymptomProfile, Seen> = BTreeMap::new();
  for row in rows.iter().filter(|r| r.days_indoors.is_some()) {
    let Some(profile) = SymptomProfile::of(row) else { continue };
    let qualifies = has_isolation_symptoms(
      row.mood_swings.as_deref(),
      row.coping_struggles.as_deref(),
      row.days_indoors.as_deref(),
    );
    let seen = profiles.entry(profile).or_default();
    if qualifies {
      seen.qualifying = true;
    } else {
      seen.non_qualifying = true;
    }
  }

  let mut ambiguous = Vec::new();
  let rows = profiles
    .into_iter()
    .map(|(profile, seen)| {
      let reported = is_yes(Some(&profile.growing_stress));
      if !reported && seen.qualifying && seen.non_qualifying {
        ambiguous.push(profile.clone());
      }
      SymptomRow { inferred_stress: reported || seen.qualifying, profile }
    })
    .collect();

  SymptomDerivation { rows, ambiguous }
}

/// Distinct access profiles, ascending.
pub fn derive_access(rows: &[SurveyRecord]) -> Vec<AccessProfile> {
  let set: std::collections::BTreeSet<_> = rows.iter().filter_map(AccessProfile::of).collect();
  set.into_iter().collect()
}
