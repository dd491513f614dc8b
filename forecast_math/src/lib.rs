//! # Forecast Math
//!
//! Numerical building blocks for the sales forecasting models.
//! This crate provides lag-polynomial algebra used by seasonal ARIMA models,
//! a derivative-free minimizer for fitting them, and a gradient-boosted
//! regression tree ensemble.

use thiserror::Error;

pub mod boosting;
pub mod optimize;
pub mod polynomial;

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Optimizer failed to converge: {0}")]
    ConvergenceFailure(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Arithmetic mean of a slice, `None` when empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
