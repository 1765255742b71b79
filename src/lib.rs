//! # supply-forecast
//!
//! Monthly consumption forecasting and procurement planning for office
//! supplies.
//!
//! A [`MonthlySeries`](core::MonthlySeries) is fitted with a seasonal ARIMA
//! model whose seasonal component depends on how much history is available
//! (see [`SeasonalPolicy`](models::SeasonalPolicy)). The resulting
//! twelve-month [`ForecastTable`](core::ForecastTable) feeds the
//! [`procurement`] planner, which adds a buffer and prices the orders.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod models;
pub mod procurement;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{ForecastTable, MonthlySeries, FORECAST_HORIZON};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::arima::{ARIMASpec, FitConfig};
    pub use crate::models::{forecast, SeasonalPolicy};
    pub use crate::procurement::{plan, recommend, PlanConfig, RecommendationConfig};
}
