//! Core data structures: the monthly input series and the forecast table.

mod forecast;
mod time_series;

pub use forecast::{AnchoredForecastRow, ForecastRow, ForecastTable, FORECAST_HORIZON};
pub use time_series::{add_months, first_of_month, MonthlySeries};
