//! Survey timestamps and the `(year, month)` periods derived from them.
//!
//! Timestamps arrive as `M/D/YYYY H:MM`. Periods are read positionally: the
//! month is the token before the first `/`, the year is the token after the
//! last `/` of the date part. Anything else is rejected rather than guessed.

use chrono::NaiveDateTime;

use crate::{Error, Result};

const MONTH_NAMES: [&str; 12] = [
  "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto",
  "Septiembre", "Octubre", "Noviembre", "Diciembre",
];

pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M";

/// One row of `Dim_Tiempo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimePeriod {
  pub year:  u16,
  pub month: u8,
}

impl TimePeriod {
  pub fn new(year: u16, month: u32) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(Error::MonthOutOfRange(month));
    }
    Ok(Self { year, month: month as u8 })
  }

  pub fn month_name(&self) -> &'static str { MONTH_NAMES[usize::from(self.month - 1)] }

  /// `YYYY-MM`.
  pub fn period(&self) -> String { format!("{}-{:02}", self.year, self.month) }

  pub fn quarter(&self) -> u8 { (self.month - 1) / 3 + 1 }

  pub fn half(&self) -> u8 { if self.month <= 6 { 1 } else { 2 } }
}

/// Positional `(year, month)` parse of a survey timestamp.
pub fn parse_period(timestamp: &str) -> Option<TimePeriod> {
  let month = timestamp.split('/').next()?.trim().parse::<u32>().ok()?;
  let date = timestamp.trim().split(' ').next()?;
  let (_, year) = date.rsplit_once('/')?;
  let year = year.trim().parse::<u16>().ok()?;
  TimePeriod::new(year, month).ok()
}

/// Full parse of a survey timestamp, minute precision.
pub fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
  NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT).ok()
}

/// Earliest and latest parseable timestamps, if any.
pub fn timestamp_range<'a>(
  timestamps: impl IntoIterator<Item = &'a str>,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
  timestamps
    .into_iter()
    .filter_map(parse_timestamp)
    .fold(None, |acc, t| match acc {
      None => Some((t, t)),
      Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn january_period_attributes() {
    let p = parse_period("1/5/2021 10:00").unwrap();
    assert_eq!(p, TimePeriod { year: 2021, month: 1 });
    assert_eq!(p.month_name(), "Enero");
    assert_eq!(p.period(), "2021-01");
    assert_eq!(p.quarter(), 1);
    assert_eq!(p.half(), 1);
  }

  #[test]
  fn quarter_and_half_boundaries() {
    let q = |m| TimePeriod::new(2014, m).unwrap();
    assert_eq!([3, 4, 6, 7, 9, 10, 12].map(|m| q(m).quarter()), [1, 2, 2, 3, 3, 4, 4]);
    assert_eq!(q(6).half(), 1);
    assert_eq!(q(7).half(), 2);
    assert_eq!(q(12).month_name(), "Diciembre");
  }

  #[test]
  fn malformed_timestamps_are_rejected() {
    assert_eq!(parse_period("2014-08-27 11:29"), None);
    assert_eq!(parse_period("13/1/2014 10:00"), None);
    assert_eq!(parse_period("0/1/2014 10:00"), None);
    assert_eq!(parse_period(""), None);
    assert!(matches!(TimePeriod::new(2014, 13), Err(Error::MonthOutOfRange(13))));
  }

  #[test]
  fn year_comes_from_date_part_only() {
    assert_eq!(parse_period("12/31/2015 23:59"), Some(TimePeriod { year: 2015, month: 12 }));
    assert_eq!(parse_period("8/27/2014"), Some(TimePeriod { year: 2014, month: 8 }));
  }

  #[test]
  fn range_skips_unparseable() {
    let (lo, hi) =
      timestamp_range(["8/27/2014 11:29", "garbage", "2/1/2016 9:05", "12/3/2015 0:00"])
        .unwrap();
    assert_eq!(lo.to_string(), "2014-08-27 11:29:00");
    assert_eq!(hi.to_string(), "2016-02-01 09:05:00");
    assert!(timestamp_range(["nope"]).is_none());
  }
}
