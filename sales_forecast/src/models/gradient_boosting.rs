//! Gradient-boosted tree forecasting
//!
//! The regressor is trained on calendar features plus the 12-month lag and
//! forecasts recursively: each predicted month is appended to the series so
//! that later months can use it as their lag.

use crate::aggregate::MonthlySeries;
use crate::error::{ForecastError, Result};
use crate::features::{derive_features, FeatureRow, SEASONAL_LAG};
use crate::models::{ForecastPoint, ForecastResult, ForecastStrategy, StrategyKind};
use crate::utils::calendar::next_month_end;
use chrono::NaiveDate;
use forecast_math::boosting::{BoostingParams, GradientBoostedRegressor};
use tracing::debug;

/// Tree-based forecasting strategy
#[derive(Debug, Clone, Default)]
pub struct GradientBoostingStrategy {
    params: BoostingParams,
}

impl GradientBoostingStrategy {
    pub fn new(params: BoostingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    /// Train the regressor on the derived features of `series`
    pub fn fit(&self, series: &MonthlySeries) -> Result<GradientBoostedRegressor> {
        let (features, target) = derive_features(series)?;
        let rows: Vec<Vec<f64>> = features.iter().map(FeatureRow::to_vec).collect();
        let model = GradientBoostedRegressor::fit(&self.params, &rows, &target)?;
        debug!(
            rows = rows.len(),
            trees = model.trees().len(),
            base_score = model.base_score(),
            "Gradient boosting fit complete"
        );
        Ok(model)
    }
}

/// Forecast `steps` months past `history` by feeding predictions forward.
///
/// The extended buffer starts as the history; for each new month the lag is
/// read from 12 entries back in the buffer, which is an actual value while
/// that month is inside history and the strategy's own prediction after.
pub fn recursive_forecast<F>(
    history: &MonthlySeries,
    steps: usize,
    mut predict: F,
) -> Result<Vec<(NaiveDate, f64)>>
where
    F: FnMut(&FeatureRow) -> Result<f64>,
{
    if history.len() < SEASONAL_LAG {
        return Err(ForecastError::InsufficientHistory {
            strategy: "recursive forecast".to_string(),
            required: SEASONAL_LAG,
            available: history.len(),
        });
    }
    let mut last = history
        .last_date()
        .ok_or_else(|| ForecastError::DataError("Cannot forecast an empty series".to_string()))?;

    let mut extended: Vec<f64> = history.values().to_vec();
    let mut forecasts = Vec::with_capacity(steps);
    for _ in 0..steps {
        let date = next_month_end(last);
        let lag_12 = extended[extended.len() - SEASONAL_LAG];
        let prediction = predict(&FeatureRow::for_date(date, lag_12))?;
        extended.push(prediction);
        forecasts.push((date, prediction));
        last = date;
    }
    Ok(forecasts)
}

impl ForecastStrategy for GradientBoostingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Xgboost
    }

    fn min_history(&self) -> usize {
        SEASONAL_LAG + 1
    }

    fn forecast(&self, series: &MonthlySeries, steps: usize) -> Result<ForecastResult> {
        if steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "steps must be positive".to_string(),
            ));
        }
        self.check_history(series)?;

        let model = self.fit(series)?;
        let forecasts = recursive_forecast(series, steps, |row| {
            model.predict(&row.to_vec()).map_err(ForecastError::from)
        })?;

        let points = forecasts
            .into_iter()
            .map(|(date, value)| ForecastPoint {
                date,
                point_forecast: value,
                lower_bound: None,
                upper_bound: None,
            })
            .collect();
        ForecastResult::new(points)
    }
}
