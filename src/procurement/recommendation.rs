//! End-to-end recommendation for one item: forecast, anchor, plan.

use crate::core::MonthlySeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ARIMASpec, FitConfig};
use crate::models::{forecast_with_config, SeasonalPolicy, MIN_SERIES_LEN};
use crate::procurement::plan::{plan_with_config, AnchoredPlanRow, PlanConfig, ProcurementPlan};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

/// Settings for [`recommend`].
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    /// Non-seasonal (p, d, q).
    pub order: ARIMASpec,
    /// Whether a seasonal component is requested.
    pub seasonal: bool,
    pub fit: FitConfig,
    pub plan: PlanConfig,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            order: ARIMASpec::default(),
            seasonal: true,
            fit: FitConfig::default(),
            plan: PlanConfig::default(),
        }
    }
}

impl RecommendationConfig {
    pub fn with_order(mut self, p: usize, d: usize, q: usize) -> Self {
        self.order = ARIMASpec::new(p, d, q);
        self
    }

    pub fn with_seasonal(mut self, seasonal: bool) -> Self {
        self.seasonal = seasonal;
        self
    }

    pub fn with_fit_config(mut self, fit: FitConfig) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_plan_config(mut self, plan: PlanConfig) -> Self {
        self.plan = plan;
        self
    }
}

/// Forecast and procurement plan for one item, placed on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Seasonal component actually fitted.
    pub policy: SeasonalPolicy,
    /// Downgrade notice for the user, if any.
    pub warning: Option<String>,
    /// Last observed month of the input series.
    pub last_observed: NaiveDate,
    /// Monthly rows starting the month after `last_observed`.
    pub schedule: Vec<AnchoredPlanRow>,
    pub plan: ProcurementPlan,
}

/// Produce a twelve-month procurement recommendation.
///
/// Series shorter than twelve months are rejected with
/// [`ForecastError::InsufficientData`] before any fitting.
pub fn recommend(series: &MonthlySeries, config: &RecommendationConfig) -> Result<Recommendation> {
    if series.len() < MIN_SERIES_LEN {
        return Err(ForecastError::InsufficientData {
            needed: MIN_SERIES_LEN,
            got: series.len(),
        });
    }
    config.plan.validate()?;

    let (table, policy) = forecast_with_config(series, config.order, config.seasonal, &config.fit)?;
    let plan = plan_with_config(&table, &config.plan)?;

    let last_observed = series.last_month();
    let schedule = plan.anchored(last_observed)?;

    info!(
        n = series.len(),
        ?policy,
        %last_observed,
        total_order_quantity = plan.total_order_quantity(),
        total_cost = plan.total_cost(),
        "procurement recommendation ready"
    );

    Ok(Recommendation {
        policy,
        warning: policy.warning(config.seasonal).map(str::to_string),
        last_observed,
        schedule,
        plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: Vec<f64>) -> MonthlySeries {
        MonthlySeries::new(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn short_series_is_insufficient() {
        let err = recommend(&series(vec![1.0; 11]), &RecommendationConfig::default()).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 12, got: 11 });
    }

    #[test]
    fn plan_parameters_are_checked_before_fitting() {
        let config = RecommendationConfig::default().with_plan_config(PlanConfig::new(-0.1, 5000.0));
        // A constant series would fail to fit; the parameter error wins.
        let err = recommend(&series(vec![3.0; 24]), &config).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn schedule_starts_after_last_observation() {
        let values: Vec<f64> = (0..18)
            .map(|i| 40.0 + i as f64 + [2.0, -1.0, 0.5][i % 3])
            .collect();
        let config = RecommendationConfig::default().with_order(0, 1, 0);
        let rec = recommend(&series(values), &config).unwrap();

        assert_eq!(rec.policy, SeasonalPolicy::Disabled);
        assert!(rec.warning.is_some());
        assert_eq!(rec.last_observed, NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());
        assert_eq!(rec.schedule.len(), 12);
        assert_eq!(rec.schedule[0].month, NaiveDate::from_ymd_opt(2022, 7, 1).unwrap());
        assert_eq!(rec.schedule[11].month, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    }

    #[test]
    fn no_warning_when_seasonality_is_switched_off() {
        let values: Vec<f64> = (0..18)
            .map(|i| 40.0 + i as f64 + [2.0, -1.0, 0.5][i % 3])
            .collect();
        let config = RecommendationConfig::default()
            .with_order(0, 1, 0)
            .with_seasonal(false);
        let rec = recommend(&series(values), &config).unwrap();
        assert_eq!(rec.policy, SeasonalPolicy::Disabled);
        assert!(rec.warning.is_none());
    }
}
