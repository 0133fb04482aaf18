use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AdvisorError;

/// Meteorological season, grouped the way utilities bill: winter is
/// Dec/Jan/Feb, then three-month blocks from March.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Fall,
        }
    }

    /// Fixed iteration order so derived collections stay deterministic.
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];
}

/// One billing month of consumption. The month is normalized to the first of
/// the month; a negative or non-finite reading fails at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMonthlyUsage")]
pub struct MonthlyUsage {
    month: NaiveDate,
    kwh: f64,
}

#[derive(Deserialize)]
struct RawMonthlyUsage {
    month: NaiveDate,
    kwh: f64,
}

impl TryFrom<RawMonthlyUsage> for MonthlyUsage {
    type Error = AdvisorError;

    fn try_from(raw: RawMonthlyUsage) -> Result<Self, Self::Error> {
        MonthlyUsage::new(raw.month, raw.kwh)
    }
}

impl MonthlyUsage {
    pub fn new(month: NaiveDate, kwh: f64) -> Result<Self, AdvisorError> {
        if !kwh.is_finite() {
            return Err(AdvisorError::NonFiniteKwh { month });
        }
        if kwh < 0.0 {
            return Err(AdvisorError::NegativeKwh { month, kwh });
        }
        Ok(Self::from_parts(month, kwh))
    }

    /// Internal constructor for values already known to be valid
    /// (gap interpolation, projections).
    pub(crate) fn from_parts(month: NaiveDate, kwh: f64) -> Self {
        let month = month.with_day(1).unwrap_or(month);
        Self { month, kwh }
    }

    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn kwh(&self) -> f64 {
        self.kwh
    }

    pub fn season(&self) -> Season {
        Season::from_month(self.month.month())
    }
}

/// First day of the month following `date`.
pub fn next_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first.checked_add_months(Months::new(1)).unwrap_or(first)
}

/// Whole months from `from` to `to`, ignoring days.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    i64::from(to.year() - from.year()) * 12 + i64::from(to.month() as i32 - from.month() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_negative_kwh_rejected() {
        let err = MonthlyUsage::new(date(2025, 3), -10.0);
        assert!(matches!(err, Err(AdvisorError::NegativeKwh { .. })));
    }

    #[test]
    fn test_non_finite_kwh_rejected() {
        assert!(MonthlyUsage::new(date(2025, 3), f64::NAN).is_err());
        assert!(MonthlyUsage::new(date(2025, 3), f64::INFINITY).is_err());
    }

    #[test]
    fn test_month_normalized_to_first() {
        let usage = MonthlyUsage::new(NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(), 500.0).unwrap();
        assert_eq!(usage.month(), date(2025, 3));
    }

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(4), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(10), Season::Fall);
    }

    #[test]
    fn test_next_month_rolls_year() {
        assert_eq!(next_month(date(2024, 12)), date(2025, 1));
        assert_eq!(next_month(date(2025, 1)), date(2025, 2));
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(date(2024, 11), date(2025, 2)), 3);
        assert_eq!(months_between(date(2025, 2), date(2025, 2)), 0);
    }

    #[test]
    fn test_deserialization_enforces_invariant() {
        let ok: Result<MonthlyUsage, _> =
            serde_json::from_str(r#"{"month":"2025-03-01","kwh":420.5}"#);
        assert!((ok.unwrap().kwh() - 420.5).abs() < f64::EPSILON);

        let bad: Result<MonthlyUsage, _> =
            serde_json::from_str(r#"{"month":"2025-03-01","kwh":-1.0}"#);
        assert!(bad.is_err());
    }
}
