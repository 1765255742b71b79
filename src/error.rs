//! Error types for the supply-forecast library.

use thiserror::Error;

/// Result type alias for forecast and planning operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while forecasting or planning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The seasonal ARIMA model could not be fitted or forecast.
    #[error("model fit failed: {reason}")]
    ModelFitError { reason: String },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The monthly index is not strictly increasing and gap free.
    #[error("timestamp error: {0}")]
    TimestampError(String),
}

impl ForecastError {
    /// Build a [`ForecastError::ModelFitError`] from any displayable reason.
    pub fn fit(reason: impl Into<String>) -> Self {
        Self::ModelFitError {
            reason: reason.into(),
        }
    }
}
