//! Lag polynomial arithmetic.
//!
//! A polynomial is stored as its coefficients in ascending powers of the
//! backshift operator `B`, so `[1.0, -0.5]` is `1 - 0.5B`.

/// Multiply two lag polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// AR polynomial `1 - φ1 B^s - φ2 B^2s - ...`.
pub fn ar_polynomial(phi: &[f64], lag: usize) -> Vec<f64> {
    let mut poly = vec![0.0; phi.len() * lag + 1];
    poly[0] = 1.0;
    for (i, &c) in phi.iter().enumerate() {
        poly[(i + 1) * lag] = -c;
    }
    poly
}

/// MA polynomial `1 + θ1 B^s + θ2 B^2s + ...`.
pub fn ma_polynomial(theta: &[f64], lag: usize) -> Vec<f64> {
    let mut poly = vec![0.0; theta.len() * lag + 1];
    poly[0] = 1.0;
    for (i, &c) in theta.iter().enumerate() {
        poly[(i + 1) * lag] = c;
    }
    poly
}

/// Differencing polynomial `(1 - B)^d (1 - B^s)^D`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &ar_polynomial(&[1.0], period));
        }
    }
    poly
}

/// First `count` coefficients of the MA(∞) representation `ma(B) / ar(B)`.
///
/// Both polynomials must have a leading coefficient of one.
pub fn psi_weights(ar: &[f64], ma: &[f64], count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);
    for j in 0..count {
        let mut value = if j == 0 {
            1.0
        } else {
            ma.get(j).copied().unwrap_or(0.0)
        };
        for i in 1..=j.min(ar.len().saturating_sub(1)) {
            value -= ar[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}
