//! Numerical utilities shared by the model fitter.

pub mod optimization;
pub mod stats;

pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{autocorrelation, quantile_normal};
