//! Forecasting models.

pub mod arima;
mod selector;

pub use selector::{
    forecast, forecast_with_config, SeasonalPolicy, FULL_SEASONAL_MIN_LEN, MIN_SERIES_LEN,
    SEASONAL_DIFFERENCING_MIN_LEN, SEASONAL_PERIOD,
};
