//! Request-level entry points: forecast and backtest for a category/region slice

use crate::aggregate::{aggregate, HistoryPayload, MonthlySeries};
use crate::backtest;
use crate::config::PipelineConfig;
use crate::data::{DatasetContext, FilterOptions, FilterSelection};
use crate::error::{ForecastError, Result};
use crate::models::{build_strategy, ForecastRecord, ForecastResult, ForecastStrategy, StrategyKind};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Response of the forecast use case
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForecastResponse {
    Forecast {
        status: &'static str,
        model_used: StrategyKind,
        history: HistoryPayload,
        forecast: Vec<ForecastRecord>,
    },
    NoData {
        status: &'static str,
        message: String,
    },
}

/// Response of the backtest use case
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationResponse {
    Metrics {
        status: &'static str,
        mape: f64,
        rmse: f64,
        model_used: StrategyKind,
    },
    NoData {
        status: &'static str,
        message: String,
    },
}

fn no_data(selection: &FilterSelection) -> String {
    ForecastError::DataUnavailable {
        category: selection.category.clone(),
        region: selection.region.clone(),
    }
    .to_string()
}

/// Facade over aggregation, the two strategies and the backtest harness.
///
/// Holds the immutable dataset context; cloning is cheap and clones can be
/// used from several threads at once.
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    context: DatasetContext,
    config: Arc<PipelineConfig>,
}

impl ForecastPipeline {
    pub fn new(context: DatasetContext, config: PipelineConfig) -> Self {
        Self {
            context,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load status of the underlying dataset
    pub fn status(&self) -> &str {
        self.context.status()
    }

    /// Resolve a strategy identifier into a backend
    pub fn strategy(&self, strategy: &str) -> Result<Box<dyn ForecastStrategy>> {
        let kind: StrategyKind = strategy.parse()?;
        Ok(build_strategy(
            kind,
            &self.config.sarima,
            &self.config.gradient_boosting,
        ))
    }

    /// Category and region selector values
    pub fn filters(&self) -> Result<FilterOptions> {
        Ok(self.context.dataset()?.filter_options())
    }

    /// Monthly history for `selection`, `None` when nothing matches
    pub fn history(&self, selection: &FilterSelection) -> Result<Option<MonthlySeries>> {
        let dataset = self.context.dataset()?;
        let (series, has_data) = aggregate(dataset.rows(), selection);
        Ok(has_data.then_some(series))
    }

    /// Forecast `steps` months for `selection` with the named strategy
    pub fn forecast(
        &self,
        strategy: &str,
        selection: &FilterSelection,
        steps: usize,
    ) -> Result<ForecastResponse> {
        let backend = self.strategy(strategy)?;
        if steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "steps must be positive".to_string(),
            ));
        }

        let Some(series) = self.history(selection)? else {
            return Ok(ForecastResponse::NoData {
                status: "error",
                message: no_data(selection),
            });
        };

        info!(
            strategy = %backend.kind(),
            category = %selection.category,
            region = %selection.region,
            steps,
            months = series.len(),
            first = ?series.dates().first(),
            last = ?series.last_date(),
            "Forecasting"
        );

        let forecast: ForecastResult = backend.forecast(&series, steps)?;
        Ok(ForecastResponse::Forecast {
            status: "success",
            model_used: backend.kind(),
            history: series.to_history(),
            forecast: forecast.to_records(),
        })
    }

    /// Backtest the named strategy on the last `test_months` of `selection`
    pub fn evaluate(
        &self,
        strategy: &str,
        selection: &FilterSelection,
    ) -> Result<EvaluationResponse> {
        let backend = self.strategy(strategy)?;

        let Some(series) = self.history(selection)? else {
            return Ok(EvaluationResponse::NoData {
                status: "error",
                message: no_data(selection),
            });
        };

        info!(
            strategy = %backend.kind(),
            category = %selection.category,
            region = %selection.region,
            months = series.len(),
            test_months = self.config.test_months,
            "Backtesting"
        );

        let accuracy = backtest::evaluate(&series, self.config.test_months, backend.as_ref())?;
        Ok(EvaluationResponse::Metrics {
            status: "Success",
            mape: accuracy.mape,
            rmse: accuracy.rmse,
            model_used: backend.kind(),
        })
    }
}
