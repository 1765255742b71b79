//! Seasonal ARIMA (Autoregressive Integrated Moving Average) estimation.
//!
//! This module provides:
//! - Regular and seasonal differencing and their inverse
//! - Lag polynomial arithmetic and ψ-weights
//! - The stationarity/invertibility reparameterisation
//! - The state-space likelihood and the SARIMA model itself

mod diff;
mod model;
mod polynomial;
mod state_space;
mod transform;

pub use diff::{difference, integrate, seasonal_difference};
pub use model::{ARIMASpec, Coefficients, FitConfig, SARIMAFit, SeasonalSpec, SARIMA};
pub use polynomial::{differencing_polynomial, psi_weights};
pub use transform::{is_invertible, is_stationary};
