//! Exact Gaussian likelihood of an ARMA process via the Kalman filter.
//!
//! The process `ar(B) w_t = ma(B) ε_t` is written in Harvey's state-space
//! form with state dimension `r = max(deg ar, deg ma + 1)`:
//!
//! ```text
//! w_t     = [1 0 ... 0] α_t
//! α_{t+1} = T α_t + R ε_t
//! ```
//!
//! where `T` has the AR coefficients in its first column and an identity
//! superdiagonal, and `R = [1, θ1, ..., θ_{r-1}]`. The filter runs with unit
//! innovation variance so that the variance can be concentrated out of the
//! likelihood.

use crate::error::{ForecastError, Result};
use crate::models::arima::polynomial::{multiply, psi_weights};

type Matrix = Vec<Vec<f64>>;

const LYAPUNOV_MAX_ITER: usize = 64;
const LYAPUNOV_TOLERANCE: f64 = 1e-13;

/// ARMA model in state-space form.
#[derive(Debug, Clone)]
pub struct ArmaStateSpace {
    /// First column of the transition matrix.
    phi: Vec<f64>,
    /// Noise loading vector.
    loading: Vec<f64>,
}

/// Filter output used for likelihood evaluation and forecasting.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    /// Sum of squared standardised innovations `Σ v_t² / F_t`.
    pub weighted_ssr: f64,
    /// Sum of `ln F_t`.
    pub log_det: f64,
    /// Number of non-missing observations.
    pub n_obs: usize,
    /// One-step-ahead predicted state after the last observation.
    pub state: Vec<f64>,
    /// Covariance of `state`, in units of the innovation variance.
    pub state_covariance: Vec<Vec<f64>>,
}

impl FilterOutput {
    /// Maximum likelihood estimate of the innovation variance.
    pub fn sigma2(&self) -> f64 {
        self.weighted_ssr / self.n_obs as f64
    }

    /// Log-likelihood with the innovation variance concentrated out.
    pub fn concentrated_loglik(&self) -> f64 {
        let n = self.n_obs as f64;
        -0.5 * (n * ((2.0 * std::f64::consts::PI).ln() + 1.0 + self.sigma2().ln()) + self.log_det)
    }
}

impl ArmaStateSpace {
    /// Build from full lag polynomials with unit leading coefficients.
    ///
    /// `ar` is `1 + a1 B + ...` and `ma` is `1 + m1 B + ...`.
    pub fn new(ar: &[f64], ma: &[f64]) -> Self {
        let ar_degree = ar.len().saturating_sub(1);
        let ma_degree = ma.len().saturating_sub(1);
        let r = ar_degree.max(ma_degree + 1).max(1);

        let phi = (0..r)
            .map(|i| ar.get(i + 1).map(|a| -a).unwrap_or(0.0))
            .collect();
        let loading = (0..r)
            .map(|i| if i == 0 { 1.0 } else { ma.get(i).copied().unwrap_or(0.0) })
            .collect();

        Self { phi, loading }
    }

    /// State dimension.
    pub fn dimension(&self) -> usize {
        self.phi.len()
    }

    /// `T M`, exploiting the companion structure of `T`.
    fn transition_left(&self, m: &Matrix) -> Matrix {
        let r = self.dimension();
        (0..r)
            .map(|i| {
                (0..r)
                    .map(|j| {
                        let shifted = if i + 1 < r { m[i + 1][j] } else { 0.0 };
                        self.phi[i] * m[0][j] + shifted
                    })
                    .collect()
            })
            .collect()
    }

    /// `M T'`.
    fn transition_right(&self, m: &Matrix) -> Matrix {
        let r = self.dimension();
        (0..r)
            .map(|i| {
                (0..r)
                    .map(|j| {
                        let shifted = if j + 1 < r { m[i][j + 1] } else { 0.0 };
                        m[i][0] * self.phi[j] + shifted
                    })
                    .collect()
            })
            .collect()
    }

    fn transition_matrix(&self) -> Matrix {
        let r = self.dimension();
        let mut t = vec![vec![0.0; r]; r];
        for i in 0..r {
            t[i][0] = self.phi[i];
            if i + 1 < r {
                t[i][i + 1] = 1.0;
            }
        }
        t
    }

    fn noise_covariance(&self) -> Matrix {
        self.loading
            .iter()
            .map(|&a| self.loading.iter().map(|&b| a * b).collect())
            .collect()
    }

    /// `T a`.
    fn advance_state(&self, a: &[f64]) -> Vec<f64> {
        let r = self.dimension();
        (0..r)
            .map(|i| {
                let shifted = if i + 1 < r { a[i + 1] } else { 0.0 };
                self.phi[i] * a[0] + shifted
            })
            .collect()
    }

    /// `T P T' + R R'`.
    fn advance_covariance(&self, p: &Matrix) -> Matrix {
        let mut next = self.transition_right(&self.transition_left(p));
        for (i, row) in next.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value += self.loading[i] * self.loading[j];
            }
        }
        next
    }

    /// Unconditional state covariance, solving `P = T P T' + R R'`.
    ///
    /// Uses the doubling recursion `P ← P + A P A'`, `A ← A²`, which converges
    /// only when the AR part is stationary.
    pub fn stationary_covariance(&self) -> Result<Matrix> {
        let mut p = self.noise_covariance();
        let mut a = self.transition_matrix();

        for _ in 0..LYAPUNOV_MAX_ITER {
            let increment = matmul(&matmul(&a, &p), &transpose(&a));
            let scale = max_abs(&p).max(1.0);
            let change = max_abs(&increment);
            add_assign(&mut p, &increment);

            if !change.is_finite() || !scale.is_finite() {
                break;
            }
            if change <= LYAPUNOV_TOLERANCE * scale {
                return Ok(p);
            }
            a = matmul(&a, &a);
        }

        Err(ForecastError::fit(
            "initial state covariance is singular: the autoregressive part is not stationary",
        ))
    }

    /// Run the Kalman filter over `series`, skipping `NaN` observations.
    pub fn filter(&self, series: &[f64]) -> Result<FilterOutput> {
        let r = self.dimension();
        let mut a = vec![0.0; r];
        let mut p = self.stationary_covariance()?;

        let mut weighted_ssr = 0.0;
        let mut log_det = 0.0;
        let mut n_obs = 0usize;

        for &y in series {
            if y.is_finite() {
                let f = p[0][0];
                if !(f.is_finite() && f > f64::EPSILON) {
                    return Err(ForecastError::fit(format!(
                        "singular innovation variance ({f:e}) in likelihood evaluation"
                    )));
                }
                let v = y - a[0];
                let gain: Vec<f64> = (0..r).map(|i| p[i][0] / f).collect();
                for i in 0..r {
                    a[i] += gain[i] * v;
                }
                let first_row = p[0].clone();
                for i in 0..r {
                    for j in 0..r {
                        p[i][j] -= gain[i] * first_row[j];
                    }
                }

                weighted_ssr += v * v / f;
                log_det += f.ln();
                n_obs += 1;
            }

            a = self.advance_state(&a);
            p = self.advance_covariance(&p);
        }

        if n_obs == 0 {
            return Err(ForecastError::fit("no observations left after differencing"));
        }
        if !(weighted_ssr.is_finite() && log_det.is_finite()) {
            return Err(ForecastError::fit("likelihood is not finite"));
        }

        Ok(FilterOutput {
            weighted_ssr,
            log_det,
            n_obs,
            state: a,
            state_covariance: p,
        })
    }

    /// Mean forecasts for `horizon` steps from a one-step-ahead state.
    pub fn forecast_means(&self, state: &[f64], horizon: usize) -> Vec<f64> {
        let mut a = state.to_vec();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            out.push(a[0]);
            a = self.advance_state(&a);
        }
        out
    }

    /// `z T` for a row vector `z`.
    fn row_times_transition(&self, z: &[f64]) -> Vec<f64> {
        let r = self.dimension();
        (0..r)
            .map(|j| {
                if j == 0 {
                    z.iter().zip(&self.phi).map(|(a, b)| a * b).sum()
                } else {
                    z[j - 1]
                }
            })
            .collect()
    }

    /// Forecast error variances, in units of the innovation variance, of the
    /// series whose `delta`-differences follow this model.
    ///
    /// `covariance` is the one-step-ahead state covariance after the last
    /// observation. The error at step `h` splits into the propagated
    /// end-of-sample state error, weighted by the integration coefficients
    /// of `1 / delta(B)`, and the shocks after step one, weighted by the
    /// ψ-weights of the integrated model.
    pub fn forecast_variances(
        &self,
        covariance: &[Vec<f64>],
        delta: &[f64],
        horizon: usize,
    ) -> Vec<f64> {
        let r = self.dimension();
        let ar: Vec<f64> = std::iter::once(1.0)
            .chain(self.phi.iter().map(|c| -c))
            .collect();
        let integrated = psi_weights(&multiply(&ar, delta), &self.loading, horizon);
        let integration = psi_weights(delta, &[1.0], horizon);

        // observation[j] = Z T^j
        let mut observation: Vec<Vec<f64>> = Vec::with_capacity(horizon);
        let mut z = vec![0.0; r];
        z[0] = 1.0;
        for _ in 0..horizon {
            let next = self.row_times_transition(&z);
            observation.push(z);
            z = next;
        }

        (1..=horizon)
            .map(|h| {
                let g: Vec<f64> = (0..r)
                    .map(|k| {
                        (1..=h)
                            .map(|i| integration[h - i] * observation[i - 1][k])
                            .sum()
                    })
                    .collect();
                let state_term: f64 = (0..r)
                    .map(|i| (0..r).map(|j| g[i] * covariance[i][j] * g[j]).sum::<f64>())
                    .sum();
                let shock_term: f64 = integrated[..h - 1].iter().map(|w| w * w).sum();
                (state_term + shock_term).max(0.0)
            })
            .collect()
    }
}

fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
    let n = a.len();
    let m = b.first().map(|row| row.len()).unwrap_or(0);
    let mut out = vec![vec![0.0; m]; n];
    for i in 0..n {
        for (k, &aik) in a[i].iter().enumerate() {
            if aik == 0.0 {
                continue;
            }
            for j in 0..m {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    out
}

fn transpose(a: &Matrix) -> Matrix {
    let n = a.len();
    let m = a.first().map(|row| row.len()).unwrap_or(0);
    (0..m).map(|j| (0..n).map(|i| a[i][j]).collect()).collect()
}

fn add_assign(a: &mut Matrix, b: &Matrix) {
    for (row_a, row_b) in a.iter_mut().zip(b.iter()) {
        for (x, y) in row_a.iter_mut().zip(row_b.iter()) {
            *x += y;
        }
    }
}

fn max_abs(a: &Matrix) -> f64 {
    a.iter()
        .flat_map(|row| row.iter())
        .fold(0.0, |acc: f64, x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::polynomial::{ar_polynomial, ma_polynomial};
    use approx::assert_relative_eq;

    #[test]
    fn dimension_covers_ar_and_ma_orders() {
        let model = ArmaStateSpace::new(&ar_polynomial(&[0.5], 1), &[1.0]);
        assert_eq!(model.dimension(), 1);

        let model = ArmaStateSpace::new(&[1.0], &ma_polynomial(&[0.3, 0.2], 1));
        assert_eq!(model.dimension(), 3);

        let model = ArmaStateSpace::new(&[1.0], &[1.0]);
        assert_eq!(model.dimension(), 1);
    }

    #[test]
    fn ar1_stationary_variance() {
        let phi = 0.6;
        let model = ArmaStateSpace::new(&ar_polynomial(&[phi], 1), &[1.0]);
        let p = model.stationary_covariance().unwrap();
        assert_relative_eq!(p[0][0], 1.0 / (1.0 - phi * phi), epsilon = 1e-10);
    }

    #[test]
    fn ma1_stationary_variance() {
        let theta = 0.4;
        let model = ArmaStateSpace::new(&[1.0], &ma_polynomial(&[theta], 1));
        let p = model.stationary_covariance().unwrap();
        assert_relative_eq!(p[0][0], 1.0 + theta * theta, epsilon = 1e-10);
    }

    #[test]
    fn unit_root_has_no_stationary_covariance() {
        let model = ArmaStateSpace::new(&ar_polynomial(&[1.0], 1), &[1.0]);
        assert!(matches!(
            model.stationary_covariance(),
            Err(ForecastError::ModelFitError { .. })
        ));
    }

    #[test]
    fn white_noise_likelihood_matches_closed_form() {
        let series = [1.0, -2.0, 0.5, 1.5, -1.0];
        let model = ArmaStateSpace::new(&[1.0], &[1.0]);
        let out = model.filter(&series).unwrap();

        let n = series.len() as f64;
        let sigma2 = series.iter().map(|x| x * x).sum::<f64>() / n;
        let expected = -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + 1.0 + sigma2.ln());

        assert_eq!(out.n_obs, 5);
        assert_relative_eq!(out.sigma2(), sigma2, epsilon = 1e-12);
        assert_relative_eq!(out.concentrated_loglik(), expected, epsilon = 1e-10);
    }

    #[test]
    fn ar1_filter_predicts_phi_times_last_value() {
        let phi = 0.5;
        let model = ArmaStateSpace::new(&ar_polynomial(&[phi], 1), &[1.0]);
        let out = model.filter(&[1.0, 2.0, 4.0]).unwrap();
        assert_relative_eq!(out.state[0], phi * 4.0, epsilon = 1e-12);

        let means = model.forecast_means(&out.state, 3);
        assert_relative_eq!(means[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(means[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(means[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn random_walk_variances_grow_linearly() {
        let model = ArmaStateSpace::new(&[1.0], &[1.0]);
        let out = model.filter(&[0.3, -0.2, 0.5, 0.1]).unwrap();
        let variances = model.forecast_variances(&out.state_covariance, &[1.0, -1.0], 4);
        for (h, v) in variances.iter().enumerate() {
            assert_relative_eq!(*v, (h + 1) as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn observed_tail_leaves_only_shock_variance() {
        let theta = 0.5;
        let model = ArmaStateSpace::new(&[1.0], &ma_polynomial(&[theta], 1));
        let series: Vec<f64> = (0..200).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();
        let out = model.filter(&series).unwrap();

        let variances = model.forecast_variances(&out.state_covariance, &[1.0], 3);
        assert_relative_eq!(variances[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(variances[1], 1.0 + theta * theta, epsilon = 1e-8);
        assert_relative_eq!(variances[2], 1.0 + theta * theta, epsilon = 1e-8);
    }

    #[test]
    fn missing_last_value_widens_first_step() {
        let theta = 0.5;
        let model = ArmaStateSpace::new(&[1.0], &ma_polynomial(&[theta], 1));
        let mut series: Vec<f64> = (0..200).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();
        series.push(f64::NAN);
        let out = model.filter(&series).unwrap();

        // The unseen shock of the missing month still loads on the next one.
        let variances = model.forecast_variances(&out.state_covariance, &[1.0], 2);
        assert_relative_eq!(variances[0], 1.0 + theta * theta, epsilon = 1e-8);
        assert_relative_eq!(variances[1], 1.0 + theta * theta, epsilon = 1e-8);
    }

    #[test]
    fn missing_observations_are_skipped() {
        let model = ArmaStateSpace::new(&ar_polynomial(&[0.5], 1), &[1.0]);
        let out = model.filter(&[1.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(out.n_obs, 2);
        assert!(out.concentrated_loglik().is_finite());

        assert!(model.filter(&[f64::NAN, f64::NAN]).is_err());
    }
}
