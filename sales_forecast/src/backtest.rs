//! Held-out backtesting of forecasting strategies

use crate::aggregate::MonthlySeries;
use crate::error::{ForecastError, Result};
use crate::metrics::ForecastAccuracy;
use crate::models::ForecastStrategy;
use serde::Serialize;
use tracing::debug;

/// Months held out by default
pub const DEFAULT_TEST_MONTHS: usize = 12;

/// Outcome of a backtest: `"Success"` with metrics, or a failure status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mape: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmse: Option<f64>,
}

impl BacktestReport {
    pub fn is_success(&self) -> bool {
        self.status == "Success"
    }
}

impl From<&Result<ForecastAccuracy>> for BacktestReport {
    fn from(result: &Result<ForecastAccuracy>) -> Self {
        match result {
            Ok(accuracy) => Self {
                status: "Success".to_string(),
                mape: Some(accuracy.mape),
                rmse: Some(accuracy.rmse),
            },
            Err(e) => Self {
                status: e.to_string(),
                mape: None,
                rmse: None,
            },
        }
    }
}

/// Refit `strategy` on all but the last `test_months` and score the held-out months
pub fn evaluate(
    series: &MonthlySeries,
    test_months: usize,
    strategy: &dyn ForecastStrategy,
) -> Result<ForecastAccuracy> {
    if test_months == 0 {
        return Err(ForecastError::InvalidParameter(
            "test_months must be positive".to_string(),
        ));
    }
    if series.len() <= test_months {
        return Err(ForecastError::InsufficientHistory {
            strategy: format!("{} backtest", strategy.kind()),
            required: test_months + 1,
            available: series.len(),
        });
    }

    let split = series.len() - test_months;
    let train = series.slice(0, split);
    let actual = &series.values()[split..];

    let forecast = strategy.forecast(&train, test_months)?;
    let predicted = forecast.values();
    let accuracy = ForecastAccuracy::evaluate(actual, &predicted)?;

    debug!(
        strategy = %strategy.kind(),
        train = train.len(),
        test = test_months,
        mape = accuracy.mape,
        rmse = accuracy.rmse,
        "Backtest complete"
    );
    Ok(accuracy)
}

/// Backtest as a status report; never fails
pub fn backtest(
    series: &MonthlySeries,
    test_months: usize,
    strategy: &dyn ForecastStrategy,
) -> BacktestReport {
    BacktestReport::from(&evaluate(series, test_months, strategy))
}
