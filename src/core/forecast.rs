//! Twelve-month forecast table produced by the model selector.

use crate::core::time_series::add_months;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Number of months forecast by every call.
pub const FORECAST_HORIZON: usize = 12;

/// One forecast step, not yet tied to a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    /// Months after the last observation (1-based).
    pub step: usize,
    /// Point forecast.
    pub predicted: f64,
    /// Lower bound of the confidence interval.
    pub lower: f64,
    /// Upper bound of the confidence interval.
    pub upper: f64,
}

/// A forecast row placed on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnchoredForecastRow {
    pub month: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Exactly [`FORECAST_HORIZON`] rows in chronological order.
///
/// The table is unanchored: row `k` is the forecast for `k` months after
/// the last observed month, and [`ForecastTable::anchor`] assigns dates once
/// the caller knows that month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
    level: f64,
}

impl ForecastTable {
    /// Build a table from point forecasts and interval bounds.
    pub fn from_vectors(
        predicted: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Result<Self> {
        for (name, len) in [
            ("predicted", predicted.len()),
            ("lower", lower.len()),
            ("upper", upper.len()),
        ] {
            if len != FORECAST_HORIZON {
                return Err(ForecastError::InvalidParameter(format!(
                    "{name} must have {FORECAST_HORIZON} values, got {len}"
                )));
            }
        }
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }

        let rows = predicted
            .into_iter()
            .zip(lower)
            .zip(upper)
            .enumerate()
            .map(|(i, ((predicted, lower), upper))| ForecastRow {
                step: i + 1,
                predicted,
                lower,
                upper,
            })
            .collect();

        Ok(Self { rows, level })
    }

    /// Rows in chronological order.
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Number of rows, always [`FORECAST_HORIZON`].
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Confidence level of the interval bounds.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Point forecasts.
    pub fn predicted(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.predicted).collect()
    }

    /// Lower interval bounds.
    pub fn lower(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.lower).collect()
    }

    /// Upper interval bounds.
    pub fn upper(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.upper).collect()
    }

    /// Assign calendar months, starting the month after `last_observed`.
    pub fn anchor(&self, last_observed: NaiveDate) -> Result<Vec<AnchoredForecastRow>> {
        self.rows
            .iter()
            .map(|row| {
                let month = u32::try_from(row.step)
                    .ok()
                    .and_then(|k| add_months(last_observed, k))
                    .ok_or_else(|| {
                        ForecastError::TimestampError(format!(
                            "cannot place step {} after {last_observed}",
                            row.step
                        ))
                    })?;
                Ok(AnchoredForecastRow {
                    month,
                    predicted: row.predicted,
                    lower: row.lower,
                    upper: row.upper,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ForecastTable {
        let predicted: Vec<f64> = (1..=12).map(|i| 100.0 + i as f64).collect();
        let lower = predicted.iter().map(|p| p - 5.0).collect();
        let upper = predicted.iter().map(|p| p + 5.0).collect();
        ForecastTable::from_vectors(predicted, lower, upper, 0.95).unwrap()
    }

    #[test]
    fn rows_are_numbered_chronologically() {
        let t = table();
        assert_eq!(t.len(), FORECAST_HORIZON);
        let steps: Vec<usize> = t.rows().iter().map(|r| r.step).collect();
        assert_eq!(steps, (1..=12).collect::<Vec<_>>());
        assert_eq!(t.predicted()[0], 101.0);
        assert_eq!(t.lower()[11], 107.0);
        assert_eq!(t.upper()[11], 117.0);
        assert_eq!(t.level(), 0.95);
    }

    #[test]
    fn wrong_row_count_is_rejected() {
        let err = ForecastTable::from_vectors(vec![1.0; 11], vec![0.0; 11], vec![2.0; 11], 0.95);
        assert!(matches!(err, Err(ForecastError::InvalidParameter(_))));

        let err = ForecastTable::from_vectors(vec![1.0; 12], vec![0.0; 12], vec![2.0; 13], 0.95);
        assert!(matches!(err, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn level_must_be_a_probability() {
        let err = ForecastTable::from_vectors(vec![1.0; 12], vec![0.0; 12], vec![2.0; 12], 1.0);
        assert!(matches!(err, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn anchor_starts_month_after_last_observation() {
        let last = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let anchored = table().anchor(last).unwrap();

        assert_eq!(anchored.len(), 12);
        assert_eq!(anchored[0].month, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(anchored[11].month, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(anchored[0].predicted, 101.0);
    }
}
