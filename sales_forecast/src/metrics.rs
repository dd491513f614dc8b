//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "Actual ({}) and predicted ({}) values must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean absolute percentage error, in percent.
///
/// Months with zero actual sales are left out of the average. When every
/// actual is zero the metric is undefined and an error is returned.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let ratios: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &p)| (a - p).abs() / a.abs())
        .collect();

    if ratios.is_empty() {
        return Err(ForecastError::MetricUndefined(
            "MAPE is undefined when every actual value is zero".to_string(),
        ));
    }

    Ok(ratios.iter().sum::<f64>() / ratios.len() as f64 * 100.0)
}

/// Root mean squared error over every month, zero-sales months included
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;

    Ok(mse.sqrt())
}

/// Forecast accuracy over a held-out window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastAccuracy {
    /// Mean Absolute Percentage Error (0-100 scale)
    pub mape: f64,
    /// Root Mean Squared Error in sales units
    pub rmse: f64,
}

impl ForecastAccuracy {
    /// Score `predicted` against `actual`
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        Ok(Self {
            mape: mean_absolute_percentage_error(actual, predicted)?,
            rmse: root_mean_squared_error(actual, predicted)?,
        })
    }
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAPE:  {:.2}%", self.mape)?;
        writeln!(f, "  RMSE:  {:.2}", self.rmse)?;
        Ok(())
    }
}
