//! Reparameterisation enforcing stationarity and invertibility.
//!
//! Unconstrained values map to partial autocorrelations in (-1, 1), which the
//! Durbin-Levinson recursion turns into AR coefficients. Every point of the
//! unconstrained space is therefore a stationary AR polynomial, and the same
//! map with a sign flip gives invertible MA polynomials.

/// Map unconstrained values to coefficients of a stationary AR polynomial
/// `1 - φ1 B - ... - φk B^k`.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(unconstrained.len());
    for (k, &u) in unconstrained.iter().enumerate() {
        let r = u / (1.0 + u * u).sqrt();
        let next: Vec<f64> = (0..k).map(|i| phi[i] - r * phi[k - 1 - i]).collect();
        phi = next;
        phi.push(r);
    }
    phi
}

/// Partial autocorrelations of an AR polynomial, via the step-down recursion.
///
/// Returns `None` when the polynomial has a root on or inside the unit circle.
pub fn partial_autocorrelations(phi: &[f64]) -> Option<Vec<f64>> {
    let mut current = phi.to_vec();
    let mut pacf = vec![0.0; phi.len()];
    for k in (1..=phi.len()).rev() {
        let r = current[k - 1];
        if !r.is_finite() || r.abs() >= 1.0 {
            return None;
        }
        pacf[k - 1] = r;
        let denom = 1.0 - r * r;
        current = (0..k - 1)
            .map(|i| (current[i] + r * current[k - 2 - i]) / denom)
            .collect();
    }
    Some(pacf)
}

/// Inverse of [`constrain_stationary`].
pub fn unconstrain_stationary(phi: &[f64]) -> Option<Vec<f64>> {
    partial_autocorrelations(phi).map(|pacf| {
        pacf.iter()
            .map(|&r| r / (1.0 - r * r).sqrt())
            .collect()
    })
}

/// Whether `1 - φ1 B - ... - φk B^k` has all roots outside the unit circle.
pub fn is_stationary(phi: &[f64]) -> bool {
    partial_autocorrelations(phi).is_some()
}

/// Map unconstrained values to coefficients of an invertible MA polynomial
/// `1 + θ1 B + ... + θk B^k`.
pub fn constrain_invertible(unconstrained: &[f64]) -> Vec<f64> {
    constrain_stationary(unconstrained)
        .into_iter()
        .map(|c| -c)
        .collect()
}

/// Whether `1 + θ1 B + ... + θk B^k` has all roots outside the unit circle.
pub fn is_invertible(theta: &[f64]) -> bool {
    let negated: Vec<f64> = theta.iter().map(|c| -c).collect();
    is_stationary(&negated)
}
