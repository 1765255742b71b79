//! Seasonal ARIMA estimated by exact maximum likelihood.

use crate::core::{ForecastTable, FORECAST_HORIZON};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate, seasonal_difference};
use crate::models::arima::polynomial::{
    ar_polynomial, differencing_polynomial, ma_polynomial, multiply,
};
use crate::models::arima::state_space::{ArmaStateSpace, FilterOutput};
use crate::models::arima::transform::{
    constrain_invertible, constrain_stationary, is_invertible, is_stationary,
    unconstrain_stationary,
};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{autocorrelation, quantile_normal};
use tracing::debug;

/// Relative spread below which the working series counts as constant.
const CONSTANT_TOLERANCE: f64 = 1e-10;

/// Bound on unconstrained parameters. Partial autocorrelations stay within
/// about 2e-4 of the unit circle, so near-unit-root optima are reached in
/// finite steps instead of drifting off to infinity.
const MAX_UNCONSTRAINED: f64 = 50.0;

/// Largest partial autocorrelation used for starting values.
const MAX_START_PACF: f64 = 0.9;

/// Non-seasonal ARIMA orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Seasonal orders (P, D, Q) at lag `period`.
///
/// A period of zero disables the seasonal component entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeasonalSpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalSpec {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// No seasonal component, `(0, 0, 0, 0)`.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether the seasonal part contributes any term.
    pub fn is_active(&self) -> bool {
        self.period > 0 && (self.p + self.d + self.q) > 0
    }

    fn effective(&self) -> Self {
        if self.period == 0 {
            Self::none()
        } else {
            *self
        }
    }
}

/// Estimation and interval settings.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Simplex iterations allowed per estimated coefficient.
    pub max_iter: usize,
    /// Relative tolerance on the negative log-likelihood per observation.
    pub tolerance: f64,
    /// Two-sided confidence level of the forecast intervals.
    pub confidence_level: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tolerance: 1e-6,
            confidence_level: 0.95,
        }
    }
}

impl FitConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_iter must be positive".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

/// Fitted AR and MA coefficients, non-seasonal and seasonal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Coefficients {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Map an unconstrained parameter vector `[ar | ma | sar | sma]`.
    fn from_unconstrained(params: &[f64], order: ARIMASpec, seasonal: SeasonalSpec) -> Self {
        let params: Vec<f64> = params
            .iter()
            .map(|u| u.clamp(-MAX_UNCONSTRAINED, MAX_UNCONSTRAINED))
            .collect();
        let (ar, rest) = params.split_at(order.p);
        let (ma, rest) = rest.split_at(order.q);
        let (sar, sma) = rest.split_at(seasonal.p);
        debug_assert_eq!(sma.len(), seasonal.q);

        Self {
            ar: constrain_stationary(ar),
            ma: constrain_invertible(ma),
            seasonal_ar: constrain_stationary(sar),
            seasonal_ma: constrain_invertible(sma),
        }
    }

    /// `φ(B) Φ(B^s)`.
    pub fn ar_polynomial(&self, period: usize) -> Vec<f64> {
        multiply(
            &ar_polynomial(&self.ar, 1),
            &ar_polynomial(&self.seasonal_ar, period.max(1)),
        )
    }

    /// `θ(B) Θ(B^s)`.
    pub fn ma_polynomial(&self, period: usize) -> Vec<f64> {
        multiply(
            &ma_polynomial(&self.ma, 1),
            &ma_polynomial(&self.seasonal_ma, period.max(1)),
        )
    }

    /// Verify stationarity of both AR factors and invertibility of both MA
    /// factors.
    pub fn check_constraints(&self) -> Result<()> {
        if !is_stationary(&self.ar) {
            return Err(ForecastError::fit(format!(
                "AR coefficients {:?} are not stationary",
                self.ar
            )));
        }
        if !is_stationary(&self.seasonal_ar) {
            return Err(ForecastError::fit(format!(
                "seasonal AR coefficients {:?} are not stationary",
                self.seasonal_ar
            )));
        }
        if !is_invertible(&self.ma) {
            return Err(ForecastError::fit(format!(
                "MA coefficients {:?} are not invertible",
                self.ma
            )));
        }
        if !is_invertible(&self.seasonal_ma) {
            return Err(ForecastError::fit(format!(
                "seasonal MA coefficients {:?} are not invertible",
                self.seasonal_ma
            )));
        }
        Ok(())
    }
}

/// SARIMA(p, d, q)(P, D, Q)\[s\] without intercept.
///
/// The series is differenced to a working series, whose ARMA likelihood is
/// evaluated exactly by a Kalman filter and maximised with Nelder-Mead over
/// a parameterisation that only admits stationary and invertible models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SARIMA {
    order: ARIMASpec,
    seasonal: SeasonalSpec,
}

impl SARIMA {
    pub fn new(order: ARIMASpec, seasonal: SeasonalSpec) -> Self {
        Self {
            order,
            seasonal: seasonal.effective(),
        }
    }

    pub fn order(&self) -> ARIMASpec {
        self.order
    }

    pub fn seasonal(&self) -> SeasonalSpec {
        self.seasonal
    }

    /// Number of estimated AR and MA coefficients.
    pub fn num_params(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// The series after regular and seasonal differencing.
    pub fn working_series(&self, values: &[f64]) -> Vec<f64> {
        seasonal_difference(
            &difference(values, self.order.d),
            self.seasonal.d,
            self.seasonal.period,
        )
    }

    fn state_space(&self, coefficients: &Coefficients) -> ArmaStateSpace {
        ArmaStateSpace::new(
            &coefficients.ar_polynomial(self.seasonal.period),
            &coefficients.ma_polynomial(self.seasonal.period),
        )
    }

    fn evaluate(&self, working: &[f64], coefficients: &Coefficients) -> Result<FilterOutput> {
        self.state_space(coefficients).filter(working)
    }

    /// Starting point of the search, in the unconstrained space.
    ///
    /// MA factors start from the first-order moment match
    /// `ρ = θ / (1 + θ²)`. AR factors start from Yule-Walker estimates when
    /// no MA factor shares their lag, and at zero otherwise.
    fn starting_values(&self, working: &[f64]) -> Vec<f64> {
        let (order, seasonal) = (self.order, self.seasonal);
        let period = seasonal.period.max(1);
        let acf_at = |lag: usize| {
            let r = autocorrelation(working, lag);
            if r.is_finite() {
                r
            } else {
                0.0
            }
        };

        let ar_start = |lags: Vec<usize>, competing_ma: bool| {
            if competing_ma {
                return vec![0.0; lags.len()];
            }
            let phi = yule_walker(&lags.into_iter().map(&acf_at).collect::<Vec<_>>());
            unconstrain_stationary(&phi).unwrap_or_else(|| vec![0.0; phi.len()])
        };
        let ma_start = |count: usize, lag: usize| {
            let mut theta = vec![0.0; count];
            if let Some(first) = theta.first_mut() {
                *first = ma_from_autocorrelation(acf_at(lag));
            }
            let negated: Vec<f64> = theta.iter().map(|t| -t).collect();
            unconstrain_stationary(&negated).unwrap_or_else(|| vec![0.0; count])
        };

        let mut start = ar_start((1..=order.p).collect(), order.q > 0);
        start.extend(ma_start(order.q, 1));
        start.extend(ar_start(
            (1..=seasonal.p).map(|k| k * period).collect(),
            seasonal.q > 0,
        ));
        start.extend(ma_start(seasonal.q, period));
        start
    }

    /// Reject working series the likelihood cannot identify.
    fn check_identifiable(&self, values: &[f64], working: &[f64]) -> Result<()> {
        let finite: Vec<f64> = working.iter().copied().filter(|v| v.is_finite()).collect();
        let needed = self.num_params() + 2;
        if finite.len() < needed {
            return Err(ForecastError::fit(format!(
                "{} observations after differencing are too few to estimate {} coefficients \
                 (need at least {needed})",
                finite.len(),
                self.num_params()
            )));
        }

        let scale = values
            .iter()
            .filter(|v| v.is_finite())
            .fold(1.0_f64, |acc, v| acc.max(v.abs()));
        let (lo, hi) = finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if hi - lo <= CONSTANT_TOLERANCE * scale {
            return Err(ForecastError::fit(
                "series has zero variance after differencing; the likelihood is degenerate",
            ));
        }
        Ok(())
    }

    /// Estimate the model on `values`.
    pub fn fit(&self, values: &[f64], config: &FitConfig) -> Result<SARIMAFit> {
        config.validate()?;

        let working = self.working_series(values);
        self.check_identifiable(values, &working)?;

        let (order, seasonal) = (self.order, self.seasonal);
        let objective = |params: &[f64]| {
            let coefficients = Coefficients::from_unconstrained(params, order, seasonal);
            match self.evaluate(&working, &coefficients) {
                Ok(out) => -out.concentrated_loglik() / out.n_obs as f64,
                Err(_) => f64::INFINITY,
            }
        };

        let mut initial = self.starting_values(&working);
        if !objective(initial.as_slice()).is_finite() {
            initial = vec![0.0; self.num_params()];
        }

        let budget = config.max_iter.saturating_mul(self.num_params().max(1));
        let result = nelder_mead(
            objective,
            &initial,
            NelderMeadConfig {
                max_iter: budget,
                tolerance: config.tolerance,
                ..Default::default()
            },
        );

        let coefficients = Coefficients::from_unconstrained(&result.optimal_point, order, seasonal);
        let output = self.evaluate(&working, &coefficients)?;

        if !result.converged {
            return Err(ForecastError::fit(format!(
                "optimizer did not converge within {budget} iterations"
            )));
        }
        coefficients.check_constraints()?;

        let sigma2 = output.sigma2();
        if !(sigma2.is_finite() && sigma2 > 0.0) {
            return Err(ForecastError::fit(format!(
                "innovation variance {sigma2} is not positive"
            )));
        }
        let loglik = output.concentrated_loglik();

        debug!(
            iterations = result.iterations,
            evaluations = result.evaluations,
            n_obs = output.n_obs,
            loglik,
            sigma2,
            "fitted SARIMA{:?}{:?}",
            (order.p, order.d, order.q),
            (seasonal.p, seasonal.d, seasonal.q, seasonal.period)
        );

        Ok(SARIMAFit {
            model: *self,
            coefficients,
            sigma2,
            loglik,
            n_obs: output.n_obs,
            iterations: result.iterations,
            state: output.state,
            state_covariance: output.state_covariance,
            history: values.to_vec(),
        })
    }
}

/// AR coefficients solving the Yule-Walker equations for autocorrelations
/// `acf[k]` at the model's lags `k + 1`, via Levinson-Durbin.
///
/// Partial autocorrelations are capped so the result is always stationary.
fn yule_walker(acf: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(acf.len());
    let mut error = 1.0;
    for k in 0..acf.len() {
        let fitted: f64 = (0..k).map(|j| phi[j] * acf[k - 1 - j]).sum();
        let r = if error > 0.0 {
            ((acf[k] - fitted) / error).clamp(-MAX_START_PACF, MAX_START_PACF)
        } else {
            0.0
        };
        let mut next: Vec<f64> = (0..k).map(|j| phi[j] - r * phi[k - 1 - j]).collect();
        next.push(r);
        phi = next;
        error *= 1.0 - r * r;
    }
    phi
}

/// Invertible MA(1) coefficient with lag-one autocorrelation `rho`.
fn ma_from_autocorrelation(rho: f64) -> f64 {
    if rho.abs() < 1e-8 {
        0.0
    } else if rho.abs() < 0.49 {
        (1.0 - (1.0 - 4.0 * rho * rho).sqrt()) / (2.0 * rho)
    } else {
        MAX_START_PACF.copysign(rho)
    }
}

/// State of a fitted model, sufficient to forecast.
#[derive(Debug, Clone)]
pub struct SARIMAFit {
    model: SARIMA,
    coefficients: Coefficients,
    sigma2: f64,
    loglik: f64,
    n_obs: usize,
    iterations: usize,
    state: Vec<f64>,
    state_covariance: Vec<Vec<f64>>,
    history: Vec<f64>,
}

impl SARIMAFit {
    pub fn model(&self) -> SARIMA {
        self.model
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Maximised log-likelihood.
    pub fn loglik(&self) -> f64 {
        self.loglik
    }

    /// Observations entering the likelihood.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Optimizer iterations used.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Akaike information criterion, counting the innovation variance.
    pub fn aic(&self) -> f64 {
        let k = (self.model.num_params() + 1) as f64;
        -2.0 * self.loglik + 2.0 * k
    }

    fn differencing(&self) -> Vec<f64> {
        let seasonal = self.model.seasonal();
        differencing_polynomial(self.model.order().d, seasonal.d, seasonal.period)
    }

    /// Point forecasts on the original scale.
    pub fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let working = self
            .model
            .state_space(&self.coefficients)
            .forecast_means(&self.state, horizon);
        integrate(&working, &self.history, &self.differencing())
    }

    /// Forecast standard errors, including the uncertainty of the state at
    /// the end of the sample.
    pub fn standard_errors(&self, horizon: usize) -> Vec<f64> {
        self.model
            .state_space(&self.coefficients)
            .forecast_variances(&self.state_covariance, &self.differencing(), horizon)
            .into_iter()
            .map(|v| (self.sigma2 * v).sqrt())
            .collect()
    }

    /// Twelve-month forecast with symmetric intervals at `level`.
    pub fn forecast_table(&self, level: f64) -> Result<ForecastTable> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }
        let predicted = self.predict(FORECAST_HORIZON)?;
        let se = self.standard_errors(FORECAST_HORIZON);
        let z = quantile_normal((1.0 + level) / 2.0);

        if predicted.iter().chain(se.iter()).any(|v| !v.is_finite()) {
            return Err(ForecastError::fit("forecast contains non-finite values"));
        }

        let lower = predicted.iter().zip(&se).map(|(m, s)| m - z * s).collect();
        let upper = predicted.iter().zip(&se).map(|(m, s)| m + z * s).collect();
        ForecastTable::from_vectors(predicted, lower, upper, level)
    }
}
