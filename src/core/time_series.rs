//! Monthly time series with an explicit, gap-free calendar index.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};

/// Normalise a date to the first day of its month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift a month by `k` calendar months.
pub fn add_months(month: NaiveDate, k: u32) -> Option<NaiveDate> {
    first_of_month(month).checked_add_months(Months::new(k))
}

/// Number of months since year 0, used to check spacing.
fn month_ordinal(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// A univariate series with one value per calendar month.
///
/// The index is implied by the first month and is always evenly spaced.
/// Missing months are stored as `NaN` rather than dropped, so position `i`
/// always corresponds to `start + i` months.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Create a series starting at `start` (any day of the month).
    ///
    /// Infinite values are rejected; `NaN` marks a missing month.
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if let Some(i) = values.iter().position(|v| v.is_infinite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "value at position {i} is infinite"
            )));
        }
        Ok(Self {
            start: first_of_month(start),
            values,
        })
    }

    /// Create a series from explicit `(month, value)` observations.
    ///
    /// Months must be strictly increasing with no gaps; a skipped month is an
    /// error instead of being silently closed up.
    pub fn from_observations(observations: Vec<(NaiveDate, f64)>) -> Result<Self> {
        let start = observations
            .first()
            .map(|(month, _)| *month)
            .ok_or(ForecastError::EmptyData)?;

        for pair in observations.windows(2) {
            let (prev, next) = (pair[0].0, pair[1].0);
            let step = month_ordinal(next) - month_ordinal(prev);
            if step <= 0 {
                return Err(ForecastError::TimestampError(format!(
                    "months must be strictly increasing: {} is followed by {}",
                    first_of_month(prev),
                    first_of_month(next)
                )));
            }
            if step > 1 {
                return Err(ForecastError::TimestampError(format!(
                    "gap of {} months after {}; missing months must be given as NaN",
                    step - 1,
                    first_of_month(prev)
                )));
            }
        }

        Self::new(start, observations.into_iter().map(|(_, v)| v).collect())
    }

    /// Number of months covered, including missing ones.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// A series is never empty once constructed, kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observed values in chronological order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First month of the series.
    pub fn start_month(&self) -> NaiveDate {
        self.start
    }

    /// Month of the `index`-th value.
    pub fn month_at(&self, index: usize) -> Option<NaiveDate> {
        if index >= self.values.len() {
            return None;
        }
        add_months(self.start, u32::try_from(index).ok()?)
    }

    /// Last month of the series, used to anchor forecasts.
    pub fn last_month(&self) -> NaiveDate {
        self.month_at(self.values.len() - 1).unwrap_or(self.start)
    }

    /// Iterate over `(month, value)` pairs.
    pub fn observations(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| self.month_at(i).map(|m| (m, v)))
    }

    /// Number of missing (`NaN`) months.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}
