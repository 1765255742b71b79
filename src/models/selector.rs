//! Seasonal policy selection and the twelve-month forecast entry point.

use crate::core::{ForecastTable, MonthlySeries};
use crate::error::Result;
use crate::models::arima::{ARIMASpec, FitConfig, SeasonalSpec, SARIMA};
use serde::Serialize;
use tracing::{debug, warn};

/// Months per seasonal cycle.
pub const SEASONAL_PERIOD: usize = 12;
/// Shortest series accepted by the planning workflow.
pub const MIN_SERIES_LEN: usize = 12;
/// Shortest series that keeps seasonal differencing.
pub const SEASONAL_DIFFERENCING_MIN_LEN: usize = 24;
/// Shortest series that gets the full seasonal component.
pub const FULL_SEASONAL_MIN_LEN: usize = 36;

/// Which seasonal component accompanies the user's (p, d, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SeasonalPolicy {
    /// Seasonal order (1, 1, 1, 12).
    Full,
    /// Seasonal order (0, 1, 0, 12).
    DifferencingOnly,
    /// No seasonal component.
    Disabled,
}

impl SeasonalPolicy {
    /// Choose the policy for a series of `n` months.
    pub fn select(n: usize, seasonal_enabled: bool) -> Self {
        match (seasonal_enabled, n) {
            (false, _) => Self::Disabled,
            (true, n) if n >= FULL_SEASONAL_MIN_LEN => Self::Full,
            (true, n) if n >= SEASONAL_DIFFERENCING_MIN_LEN => Self::DifferencingOnly,
            (true, _) => Self::Disabled,
        }
    }

    /// Seasonal orders implied by the policy.
    pub fn seasonal_spec(self) -> SeasonalSpec {
        match self {
            Self::Full => SeasonalSpec::new(1, 1, 1, SEASONAL_PERIOD),
            Self::DifferencingOnly => SeasonalSpec::new(0, 1, 0, SEASONAL_PERIOD),
            Self::Disabled => SeasonalSpec::none(),
        }
    }

    /// Message for the user when the requested seasonal component was cut
    /// back because of short data.
    pub fn warning(self, seasonal_enabled: bool) -> Option<&'static str> {
        match (self, seasonal_enabled) {
            (Self::DifferencingOnly, _) => Some(
                "only seasonal differencing is used because fewer than 36 months of data are available",
            ),
            (Self::Disabled, true) => Some(
                "the seasonal component is disabled because fewer than 24 months of data are available",
            ),
            _ => None,
        }
    }
}

/// Forecast the next twelve months with the default [`FitConfig`].
///
/// The caller is expected to pass at least [`MIN_SERIES_LEN`] months. Any
/// estimation problem comes back as
/// [`ForecastError::ModelFitError`](crate::ForecastError::ModelFitError).
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use supply_forecast::core::MonthlySeries;
/// use supply_forecast::models::{forecast, SeasonalPolicy};
///
/// let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
/// let values: Vec<f64> = (0..30)
///     .map(|i| 100.0 + 10.0 * (i as f64 * std::f64::consts::PI / 6.0).sin() + (i % 5) as f64)
///     .collect();
/// let series = MonthlySeries::new(start, values).unwrap();
///
/// let (table, policy) = forecast(&series, 0, 0, 0, true).unwrap();
/// assert_eq!(policy, SeasonalPolicy::DifferencingOnly);
/// assert_eq!(table.len(), 12);
/// ```
pub fn forecast(
    series: &MonthlySeries,
    p: usize,
    d: usize,
    q: usize,
    seasonal_enabled: bool,
) -> Result<(ForecastTable, SeasonalPolicy)> {
    forecast_with_config(
        series,
        ARIMASpec::new(p, d, q),
        seasonal_enabled,
        &FitConfig::default(),
    )
}

/// Forecast the next twelve months with explicit estimation settings.
pub fn forecast_with_config(
    series: &MonthlySeries,
    order: ARIMASpec,
    seasonal_enabled: bool,
    config: &FitConfig,
) -> Result<(ForecastTable, SeasonalPolicy)> {
    let n = series.len();
    let policy = SeasonalPolicy::select(n, seasonal_enabled);
    debug!(n, ?policy, ?order, "selected seasonal policy");
    if let Some(message) = policy.warning(seasonal_enabled) {
        warn!(n, ?policy, "{message}");
    }

    let model = SARIMA::new(order, policy.seasonal_spec());
    let table = model
        .fit(series.values(), config)
        .and_then(|fit| fit.forecast_table(config.confidence_level))
        .inspect_err(|err| warn!(%err, ?order, ?policy, "forecast failed"))?;

    Ok((table, policy))
}
