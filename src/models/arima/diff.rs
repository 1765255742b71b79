//! Differencing utilities for seasonal ARIMA models.

use crate::error::{ForecastError, Result};

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series. Missing values propagate as `NaN`.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return vec![];
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Seasonal differencing order
/// * `period` - Seasonal period
///
/// # Returns
/// The seasonally differenced series.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return vec![];
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Undo differencing for a block of forecasts.
///
/// `delta` is the differencing polynomial `(1 - B)^d (1 - B^s)^D` and
/// `history` the observed series on the original scale. Each forecast is
/// rebuilt as `y[t] = w[t] - Σ delta[i] y[t - i]`, feeding earlier forecasts
/// back in for later steps.
pub fn integrate(differenced: &[f64], history: &[f64], delta: &[f64]) -> Result<Vec<f64>> {
    let order = delta.len().saturating_sub(1);
    if order == 0 {
        return Ok(differenced.to_vec());
    }
    if history.len() < order {
        return Err(ForecastError::fit(format!(
            "need {order} observations to undo differencing, got {}",
            history.len()
        )));
    }

    let tail = &history[history.len() - order..];
    if tail.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::fit(format!(
            "the last {order} observations must be present to undo differencing"
        )));
    }

    let mut levels = tail.to_vec();
    let mut out = Vec::with_capacity(differenced.len());
    for &w in differenced {
        let t = levels.len();
        let carried: f64 = (1..=order).map(|i| delta[i] * levels[t - i]).sum();
        let y = w - carried;
        levels.push(y);
        out.push(y);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::polynomial::differencing_polynomial;
    use approx::assert_relative_eq;

    #[test]
    fn difference_order_0() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = difference(&series, 0);
        assert_eq!(result, series);
    }

    #[test]
    fn difference_order_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        let result = difference(&series, 2);
        assert_eq!(result, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn difference_propagates_missing_values() {
        let series = vec![1.0, f64::NAN, 4.0, 8.0];
        let result = difference(&series, 1);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_eq!(result[2], 4.0);
    }

    #[test]
    fn difference_too_short_is_empty() {
        assert!(difference(&[1.0], 1).is_empty());
        assert!(difference(&[1.0, 2.0], 2).is_empty());
    }

    #[test]
    fn seasonal_difference_basic() {
        let series = vec![
            100.0, 120.0, 80.0, 90.0, // Year 1
            110.0, 130.0, 90.0, 100.0, // Year 2
        ];
        let result = seasonal_difference(&series, 1, 4);
        assert_eq!(result, vec![10.0, 10.0, 10.0, 10.0]);
    }

    #[test]
    fn seasonal_difference_shorter_than_period_is_empty() {
        assert!(seasonal_difference(&[1.0, 2.0, 3.0], 1, 12).is_empty());
        assert_eq!(seasonal_difference(&[1.0, 2.0], 0, 12), vec![1.0, 2.0]);
    }

    #[test]
    fn integrate_reverses_first_difference() {
        let original = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let delta = differencing_polynomial(1, 0, 0);
        let integrated = integrate(&[6.0, 7.0], &original, &delta).unwrap();

        assert_relative_eq!(integrated[0], 30.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 37.0, epsilon = 1e-10);
    }

    #[test]
    fn integrate_reverses_regular_and_seasonal_differences() {
        let series: Vec<f64> = (0..30)
            .map(|i| 50.0 + 0.7 * i as f64 + [3.0, -1.0, 4.0, -6.0][i % 4] + (i * i) as f64 * 0.01)
            .collect();
        let w = seasonal_difference(&difference(&series, 1), 1, 4);
        let delta = differencing_polynomial(1, 1, 4);

        // Rebuild the last 6 values from the first 24 and the differenced tail.
        let rebuilt = integrate(&w[w.len() - 6..], &series[..24], &delta).unwrap();
        for (a, b) in rebuilt.iter().zip(series[24..].iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn integrate_requires_observed_tail() {
        let delta = differencing_polynomial(1, 0, 0);
        let err = integrate(&[1.0], &[1.0, f64::NAN], &delta);
        assert!(matches!(err, Err(ForecastError::ModelFitError { .. })));

        let err = integrate(&[1.0], &[], &delta);
        assert!(matches!(err, Err(ForecastError::ModelFitError { .. })));
    }
}
