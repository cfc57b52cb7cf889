//! Fact rows and the grouped aggregation that produces them.
//!
//! Each staged row is resolved against all eight dimensions. Rows that
//! resolve are grouped by their eight keys and tallied; rows that do not are
//! excluded and reported per dimension and value.

use std::collections::{BTreeMap, HashMap};

use crate::{
  category::{
    has_care_access, has_isolation_symptoms, is_elevated_mood, is_no,
    is_open_to_interview, is_unreported_stress, is_yes,
  },
  dimension::{AccessProfile, Dimension, SymptomProfile},
  record::SurveyRecord,
  time::{TimePeriod, parse_period},
};

/// Surrogate key of a dimension row.
pub type DimensionId = i64;

/// Percentage columns of `Hechos_Estres_SaludMental`, bounded to `[0, 100]`.
pub const PERCENT_COLUMNS: [&str; 12] = [
  "porcentaje_estres",
  "porcentaje_historial_estres",
  "porcentaje_estres_afrontamiento_ocupacion",
  "porcentaje_tratamiento",
  "porcentaje_no_tratamiento",
  "porcentaje_deterioro_aislamiento",
  "porcentaje_humor_aislamiento",
  "porcentaje_debilidad_aislamiento",
  "porcentaje_acceso_recursos",
  "porcentaje_sintomas_no_reconocidos",
  "porcentaje_recursos_sin_tratamiento",
  "porcentaje_postergacion",
];

/// Count columns of `Hechos_Estres_SaludMental`, never negative.
pub const COUNT_COLUMNS: [&str; 5] = [
  "cantidad_estres",
  "cantidad_historial_estres",
  "cantidad_estres_afrontamiento",
  "cantidad_tratamiento",
  "cantidad_estres_acceso",
];

// ─── Fact rows ───────────────────────────────────────────────────────────────

/// The eight dimension references of a fact row, in [`Dimension::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactKey {
  pub time:       DimensionId,
  pub gender:     DimensionId,
  pub history:    DimensionId,
  pub occupation: DimensionId,
  pub country:    DimensionId,
  pub isolation:  DimensionId,
  pub symptoms:   DimensionId,
  pub access:     DimensionId,
}

impl FactKey {
  pub fn ids(&self) -> [DimensionId; 8] {
    [
      self.time,
      self.gender,
      self.history,
      self.occupation,
      self.country,
      self.isolation,
      self.symptoms,
      self.access,
    ]
  }
}

/// The indicator values of one fact row. Percentages are rounded to two
/// decimals and are `None` when their denominator is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicators {
  /// 1. rows reporting growing stress
  pub stress_count:                 i64,
  /// 2. % of the group reporting growing stress
  pub stress_pct:                   Option<f64>,
  /// 3. rows with family history and growing stress
  pub history_stress_count:         i64,
  /// 4. % of the family-history rows reporting growing stress
  pub history_stress_pct:           Option<f64>,
  /// 5. rows with growing stress and coping struggles
  pub stress_coping_count:          i64,
  /// 6. % of the group with growing stress and coping struggles
  pub stress_coping_pct:            Option<f64>,
  /// 7a. % in treatment
  pub treatment_pct:                Option<f64>,
  /// 7b. % not in treatment
  pub no_treatment_pct:             Option<f64>,
  /// 8. rows in treatment
  pub treatment_count:              i64,
  /// 9. % with emotional deterioration; same measure as `stress_pct`
  pub deterioration_pct:            Option<f64>,
  /// 10. % with medium or high mood swings
  pub mood_pct:                     Option<f64>,
  /// 11. % with social weakness
  pub social_weakness_pct:          Option<f64>,
  /// 12. % of stressed rows with access to care
  pub care_access_pct:              Option<f64>,
  /// 13. stressed rows with access to care
  pub stress_access_count:          i64,
  /// 14. % in treatment among rows with unreported but symptomatic stress
  pub unrecognized_treatment_pct:   Option<f64>,
  /// 15. % untreated among inferred-stress rows with access to care
  pub access_without_treatment_pct: Option<f64>,
  /// 16. % untreated among inferred-stress rows with access to care and
  ///     openness to an interview
  pub postponement_pct:             Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
  pub key:        FactKey,
  /// Staged rows aggregated into this fact.
  pub group_size: i64,
  pub indicators: Indicators,
}

// ─── Tally ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct Tally {
  rows:                      i64,
  stress:                    i64,
  history:                   i64,
  history_stress:            i64,
  stress_coping:             i64,
  treated:                   i64,
  untreated:                 i64,
  elevated_mood:             i64,
  social_weakness:           i64,
  stress_access:             i64,
  unrecognized:              i64,
  unrecognized_treated:      i64,
  inferred_access:           i64,
  inferred_access_untreated: i64,
  postponing:                i64,
  postponing_untreated:      i64,
}

impl Tally {
  fn add(&mut self, row: &SurveyRecord, inferred_stress: bool) {
    let stress = is_yes(row.growing_stress.as_deref());
    let history = is_yes(row.family_history.as_deref());
    let treated = is_yes(row.treatment.as_deref());
    let untreated = is_no(row.treatment.as_deref());
    let care = has_care_access(row.care_options.as_deref());

    self.rows += 1;
    self.stress += i64::from(stress);
    self.history += i64::from(history);
    self.history_stress += i64::from(history && stress);
    self.stress_coping += i64::from(stress && is_yes(row.coping_struggles.as_deref()));
    self.treated += i64::from(treated);
    self.untreated += i64::from(untreated);
    self.elevated_mood += i64::from(is_elevated_mood(row.mood_swings.as_deref()));
    self.social_weakness += i64::from(is_yes(row.social_weakness.as_deref()));
    self.stress_access += i64::from(stress && care);

    let unrecognized = is_unreported_stress(row.growing_stress.as_deref())
      && has_isolation_symptoms(
        row.mood_swings.as_deref(),
        row.coping_struggles.as_deref(),
        row.days_indoors.as_deref(),
      );
    self.unrecognized += i64::from(unrecognized);
    self.unrecognized_treated += i64::from(unrecognized && treated);

    let inferred_access = inferred_stress && care;
    self.inferred_access += i64::from(inferred_access);
    self.inferred_access_untreated += i64::from(inferred_access && untreated);

    let postponing =
      inferred_access && is_open_to_interview(row.mental_health_interview.as_deref());
    self.postponing += i64::from(postponing);
    self.postponing_untreated += i64::from(postponing && untreated);
  }

  fn indicators(&self) -> Indicators {
    let of_group = |n| percent(n, self.rows);
    Indicators {
      stress_count:                 self.stress,
      stress_pct:                   of_group(self.stress),
      history_stress_count:         self.history_stress,
      history_stress_pct:           percent(self.history_stress, self.history),
      stress_coping_count:          self.stress_coping,
      stress_coping_pct:            of_group(self.stress_coping),
      treatment_pct:                of_group(self.treated),
      no_treatment_pct:             of_group(self.untreated),
      treatment_count:              self.treated,
      deterioration_pct:            of_group(self.stress),
      mood_pct:                     of_group(self.elevated_mood),
      social_weakness_pct:          of_group(self.social_weakness),
      care_access_pct:              percent(self.stress_access, self.stress),
      stress_access_count:          self.stress_access,
      unrecognized_treatment_pct:   percent(self.unrecognized_treated, self.unrecognized),
      access_without_treatment_pct: percent(
        self.inferred_access_untreated,
        self.inferred_access,
      ),
      postponement_pct:             percent(self.postponing_untreated, self.postponing),
    }
  }
}

/// `numerator / denominator * 100`, two decimals with ties rounded up,
/// `None` on a zero denominator. Both arguments are non-negative counts.
///
/// Rounding happens on the exact ratio in integers: `23 / 160` is `14.375`,
/// which as an `f64` sits just below the tie.
pub fn percent(numerator: i64, denominator: i64) -> Option<f64> {
  (denominator != 0).then(|| {
    let hundredths = (numerator * 20_000 + denominator) / (2 * denominator);
    hundredths as f64 / 100.0
  })
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }

// ─── Dimension lookups ───────────────────────────────────────────────────────

/// Natural key → surrogate key maps for every dimension, as loaded.
#[derive(Debug, Clone, Default)]
pub struct DimensionKeys {
  pub time:       HashMap<TimePeriod, DimensionId>,
  pub gender:     HashMap<String, DimensionId>,
  pub history:    HashMap<String, DimensionId>,
  pub occupation: HashMap<String, DimensionId>,
  pub country:    HashMap<String, DimensionId>,
  pub isolation:  HashMap<String, DimensionId>,
  /// Surrogate key and inferred-stress flag.
  pub symptoms:   HashMap<SymptomProfile, (DimensionId, bool)>,
  pub access:     HashMap<AccessProfile, DimensionId>,
}

/// Staged rows that failed to resolve against one or more dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unmatched {
  pub excluded_rows: usize,
  /// Row counts per unresolved value, per dimension.
  pub values:        BTreeMap<Dimension, BTreeMap<String, usize>>,
}

impl Unmatched {
  fn record(&mut self, dimension: Dimension, value: String) {
    *self.values.entry(dimension).or_default().entry(value).or_default() += 1;
  }
}

const NULL_LABEL: &str = "NULL";

/// Single label under which every timestamp the period parse rejects is
/// counted.
pub const UNPARSEABLE_TIMESTAMP: &str = "unparseable timestamp";

fn label(value: Option<&str>) -> String { value.unwrap_or(NULL_LABEL).to_owned() }

impl DimensionKeys {
  /// Resolve one staged row, recording every dimension that fails.
  fn resolve(&self, row: &SurveyRecord, unmatched: &mut Unmatched) -> Option<(FactKey, bool)> {
    let mut lookup = |dimension: Dimension, id: Option<DimensionId>, value: &dyn Fn() -> String| {
      if id.is_none() {
        unmatched.record(dimension, value());
      }
      id
    };
    let by_text = |map: &HashMap<String, DimensionId>, v: Option<&str>| {
      v.and_then(|v| map.get(v).copied())
    };

    let period = row.timestamp.as_deref().and_then(parse_period);
    let time = lookup(
      Dimension::Time,
      period.as_ref().and_then(|p| self.time.get(p).copied()),
      &|| match &period {
        Some(p) => p.period(),
        None => UNPARSEABLE_TIMESTAMP.to_owned(),
      },
    );
    let gender = lookup(
      Dimension::Gender,
      by_text(&self.gender, row.gender.as_deref()),
      &|| label(row.gender.as_deref()),
    );
    let history = lookup(
      Dimension::History,
      by_text(&self.history, row.family_history.as_deref()),
      &|| label(row.family_history.as_deref()),
    );
    let occupation = lookup(
      Dimension::Occupation,
      by_text(&self.occupation, row.occupation.as_deref()),
      &|| label(row.occupation.as_deref()),
    );
    let country = lookup(
      Dimension::Country,
      by_text(&self.country, row.country.as_deref()),
      &|| label(row.country.as_deref()),
    );
    let isolation = lookup(
      Dimension::Isolation,
      by_text(&self.isolation, row.days_indoors.as_deref()),
      &|| label(row.days_indoors.as_deref()),
    );
    let symptom = SymptomProfile::of(row).and_then(|p| self.symptoms.get(&p).copied());
    let symptoms = lookup(Dimension::Symptoms, symptom.map(|(id, _)| id), &|| {
      [&row.growing_stress, &row.mood_swings, &row.coping_struggles, &row.social_weakness]
        .map(|v| label(v.as_deref()))
        .join(" / ")
    });
    let access = lookup(
      Dimension::Access,
      AccessProfile::of(row).and_then(|p| self.access.get(&p).copied()),
      &|| {
        [&row.care_options, &row.mental_health_interview]
          .map(|v| label(v.as_deref()))
          .join(" / ")
      },
    );

    let key = FactKey {
      time:       time?,
      gender:     gender?,
      history:    history?,
      occupation: occupation?,
      country:    country?,
      isolation:  isolation?,
      symptoms:   symptoms?,
      access:     access?,
    };
    Some((key, symptom.is_some_and(|(_, inferred)| inferred)))
  }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
  /// Ascending by key.
  pub facts:           Vec<FactRow>,
  pub rows_aggregated: usize,
  pub unmatched:       Unmatched,
}

/// Group staged rows by their resolved dimension keys and compute the
/// indicators of every group.
pub fn aggregate<'a>(
  rows: impl IntoIterator<Item = &'a SurveyRecord>,
  keys: &DimensionKeys,
) -> Aggregation {
  let mut groups: BTreeMap<FactKey, Tally> = BTreeMap::new();
  let mut unmatched = Unmatched::default();
  let mut rows_aggregated = 0;

  for row in rows {
    match keys.resolve(row, &mut unmatched) {
      Some((key, inferred_stress)) => {
        groups.entry(key).or_default().add(row, inferred_stress);
        rows_aggregated += 1;
      }
      None => unmatched.excluded_rows += 1,
    }
  }

  let facts = groups
    .into_iter()
    .map(|(key, tally)| FactRow {
      key,
      group_size: tally.rows,
      indicators: tally.indicators(),
    })
    .collect();

  Aggregation { facts, rows_aggregated, unmatched }
}

#[cfg(test)]
mod tests {
  use super::*;

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

  fn keys_for(rows: &[SurveyRecord]) -> DimensionKeys {
    let mut keys = DimensionKeys::default();
    for (i, r) in rows.iter().enumerate() {
      let id = i as i64 + 1;
      if let Some(p) = r.timestamp.as_deref().and_then(parse_period) {
        keys.time.entry(p).or_insert(id);
      }
      let mut text = |map: &mut HashMap<String, i64>, v: &Option<String>| {
        if let Some(v) = v {
          map.entry(v.clone()).or_insert(id);
        }
      };
      text(&mut keys.gender, &r.gender);
      text(&mut keys.history, &r.family_history);
      text(&mut keys.occupation, &r.occupation);
      text(&mut keys.country, &r.country);
      text(&mut keys.isolation, &r.days_indoors);
      if let Some(p) = SymptomProfile::of(r) {
        let inferred = is_yes(r.growing_stress.as_deref());
        keys.symptoms.entry(p).or_insert((id, inferred));
      }
      if let Some(p) = AccessProfile::of(r) {
        keys.access.entry(p).or_insert(id);
      }
    }
    keys
  }

  #[test]
  fn single_respondent_scenario() {
    let rows = [respondent()];
    let agg = aggregate(&rows, &keys_for(&rows));

    assert_eq!(agg.facts.len(), 1);
    assert_eq!(agg.rows_aggregated, 1);
    let ind = &agg.facts[0].indicators;
    assert_eq!(ind.stress_count, 1);
    assert_eq!(ind.stress_pct, Some(100.0));
    assert_eq!(ind.treatment_count, 1);
    assert_eq!(ind.treatment_pct, Some(100.0));
    assert_eq!(ind.no_treatment_pct, Some(0.0));
    assert_eq!(ind.history_stress_pct, Some(100.0));
    assert_eq!(ind.deterioration_pct, ind.stress_pct);
    assert_eq!(ind.unrecognized_treatment_pct, None);
    assert_eq!(ind.access_without_treatment_pct, Some(0.0));
    assert_eq!(ind.postponement_pct, Some(0.0));
  }

  #[test]
  fn zero_denominators_yield_none() {
    let mut r = respondent();
    r.family_history = Some("No".into());
    r.growing_stress = Some("No".into());
    r.mood_swings = Some("Low".into());
    let rows = [r];
    let ind = aggregate(&rows, &keys_for(&rows)).facts.remove(0).indicators;

    assert_eq!(ind.history_stress_pct, None);
    assert_eq!(ind.care_access_pct, None);
    assert_eq!(ind.unrecognized_treatment_pct, None);
    assert_eq!(ind.access_without_treatment_pct, None);
    assert_eq!(ind.postponement_pct, None);
    assert_eq!(ind.stress_pct, Some(0.0));
  }

  #[test]
  fn rows_with_same_keys_share_a_group() {
    let mut untreated = respondent();
    untreated.treatment = Some("No".into());
    untreated.changes_habits = Some("No".into());
    let mut calm = respondent();
    calm.treatment = Some("No".into());
    calm.growing_stress = Some("No".into());
    calm.self_employed = Some("Yes".into());

    let rows = [respondent(), untreated, calm];
    let keys = keys_for(&rows);
    let agg = aggregate(&rows, &keys);

    // `calm` has its own symptom profile, so two groups.
    assert_eq!(agg.facts.len(), 2);
    let stressed = agg
      .facts
      .iter()
      .find(|f| f.group_size == 2)
      .expect("stressed group");
    let ind = &stressed.indicators;
    assert_eq!(ind.stress_count, 2);
    assert_eq!(ind.treatment_count, 1);
    assert_eq!(ind.treatment_pct, Some(50.0));
    assert_eq!(ind.no_treatment_pct, Some(50.0));
    assert_eq!(ind.access_without_treatment_pct, Some(50.0));
  }

  #[test]
  fn unrecognized_symptoms_are_measured_per_row() {
    let mut hidden = respondent();
    hidden.growing_stress = Some("Maybe".into());
    let mut hidden_untreated = hidden.clone();
    hidden_untreated.treatment = Some("No".into());
    hidden_untreated.work_interest = Some("Yes".into());
    let mut outdoors = hidden.clone();
    outdoors.days_indoors = Some("1-14 days".into());

    let rows = [hidden, hidden_untreated, outdoors];
    let mut keys = keys_for(&rows);
    keys.isolation.insert("1-14 days".into(), 99);
    let agg = aggregate(&rows, &keys);

    let isolated = agg.facts.iter().find(|f| f.key.isolation != 99).unwrap();
    assert_eq!(isolated.indicators.unrecognized_treatment_pct, Some(50.0));
    let out = agg.facts.iter().find(|f| f.key.isolation == 99).unwrap();
    assert_eq!(out.indicators.unrecognized_treatment_pct, None);
  }

  #[test]
  fn percentages_round_to_two_decimals() {
    assert_eq!(percent(1, 3), Some(33.33));
    assert_eq!(percent(2, 3), Some(66.67));
    assert_eq!(percent(1, 8), Some(12.5));
    assert_eq!(percent(0, 0), None);
  }

  #[test]
  fn exact_ties_round_up() {
    assert_eq!(percent(23, 160), Some(14.38));
    assert_eq!(percent(41, 160), Some(25.63));
    assert_eq!(percent(46, 320), Some(14.38));
    assert_eq!(percent(1, 1), Some(100.0));
  }

  #[test]
  fn unmatched_countries_are_reported() {
    let mut abroad = respondent();
    abroad.country = Some("Atlantis".into());
    let rows = [respondent()];
    let keys = keys_for(&rows);

    let agg = aggregate([&rows[0], &abroad, &abroad], &keys);
    assert_eq!(agg.facts.len(), 1);
    assert_eq!(agg.rows_aggregated, 1);
    assert_eq!(agg.unmatched.excluded_rows, 2);
    assert_eq!(agg.unmatched.values[&Dimension::Country]["Atlantis"], 2);
    assert_eq!(agg.unmatched.values.len(), 1);
  }

  #[test]
  fn unparseable_timestamps_share_one_label() {
    let mut yesterday = respondent();
    yesterday.timestamp = Some("yesterday".into());
    let mut garbled = respondent();
    garbled.timestamp = Some("2021-01-05".into());
    let rows = [respondent()];
    let agg = aggregate([&yesterday, &garbled], &keys_for(&rows));
    let times = &agg.unmatched.values[&Dimension::Time];
    assert_eq!(times.len(), 1);
    assert_eq!(times[UNPARSEABLE_TIMESTAMP], 2);
  }

  #[test]
  fn indicators_stay_in_range() {
    let mut rows = Vec::new();
    for (i, (stress, treatment)) in
      [("Yes", "Yes"), ("No", "No"), ("Maybe", "Yes"), ("Yes", "No")].iter().enumerate()
    {
      let mut r = respondent();
      r.growing_stress = Some((*stress).into());
      r.treatment = Some((*treatment).into());
      r.timestamp = Some(format!("{}/5/2021 10:00", i + 1));
      rows.push(r);
    }
    let agg = aggregate(&rows, &keys_for(&rows));
    for fact in &agg.facts {
      let i = &fact.indicators;
      for pct in [
        i.stress_pct,
        i.history_stress_pct,
        i.stress_coping_pct,
        i.treatment_pct,
        i.no_treatment_pct,
        i.deterioration_pct,
        i.mood_pct,
        i.social_weakness_pct,
        i.care_access_pct,
        i.unrecognized_treatment_pct,
        i.access_without_treatment_pct,
        i.postponement_pct,
      ]
      .into_iter()
      .flatten()
      {
        assert!((0.0..=100.0).contains(&pct));
      }
      let total = i.treatment_pct.unwrap() + i.no_treatment_pct.unwrap();
      assert!((total - 100.0).abs() <= 1.0);
    }
  }
}
