//! Forecasting strategies for monthly sales series

use crate::aggregate::MonthlySeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use forecast_math::boosting::BoostingParams;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;

pub mod gradient_boosting;
pub mod sarima;

pub use gradient_boosting::GradientBoostingStrategy;
pub use sarima::{SarimaConfig, SarimaStrategy};

/// One forecast month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_forecast: f64,
    /// Lower prediction bound, absent for strategies without intervals
    pub lower_bound: Option<f64>,
    /// Upper prediction bound, absent for strategies without intervals
    pub upper_bound: Option<f64>,
}

/// Forecast row in the wire format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Sales Forecast")]
    pub sales_forecast: f64,
    #[serde(rename = "Lower Bound")]
    pub lower_bound: Option<f64>,
    #[serde(rename = "Upper Bound")]
    pub upper_bound: Option<f64>,
}

impl From<&ForecastPoint> for ForecastRecord {
    fn from(point: &ForecastPoint) -> Self {
        Self {
            date: point.date.format("%Y-%m-%d").to_string(),
            sales_forecast: point.point_forecast,
            lower_bound: point.lower_bound,
            upper_bound: point.upper_bound,
        }
    }
}

/// Forecast for consecutive months following the end of history
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Create a forecast result, checking that dates are consecutive month ends
    /// and that any bounds bracket the point forecast
    pub fn new(points: Vec<ForecastPoint>) -> Result<Self> {
        for window in points.windows(2) {
            if crate::utils::calendar::next_month_end(window[0].date) != window[1].date {
                return Err(ForecastError::ValidationError(format!(
                    "Forecast dates are not contiguous between {} and {}",
                    window[0].date, window[1].date
                )));
            }
        }
        for point in &points {
            if let (Some(lower), Some(upper)) = (point.lower_bound, point.upper_bound) {
                if !(lower <= point.point_forecast && point.point_forecast <= upper) {
                    return Err(ForecastError::ValidationError(format!(
                        "Interval [{}, {}] does not contain forecast {} for {}",
                        lower, upper, point.point_forecast, point.date
                    )));
                }
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Point forecasts only
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.point_forecast).collect()
    }

    /// Number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.points.len()
    }

    /// Whether every point carries a prediction interval
    pub fn has_intervals(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.lower_bound.is_some() && p.upper_bound.is_some())
    }

    /// Render as wire-format records
    pub fn to_records(&self) -> Vec<ForecastRecord> {
        self.points.iter().map(ForecastRecord::from).collect()
    }
}

/// Identifier of a forecasting backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Sarima,
    Xgboost,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Sarima => "sarima",
            StrategyKind::Xgboost => "xgboost",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sarima" => Ok(StrategyKind::Sarima),
            "xgboost" => Ok(StrategyKind::Xgboost),
            other => Err(ForecastError::UnknownStrategy(other.to_string())),
        }
    }
}

/// A forecasting backend that refits on every call
pub trait ForecastStrategy: Debug + Send + Sync {
    /// Which backend this is
    fn kind(&self) -> StrategyKind;

    /// Shortest series the strategy will fit
    fn min_history(&self) -> usize;

    /// Fit on `series` and forecast `steps` months past its end
    fn forecast(&self, series: &MonthlySeries, steps: usize) -> Result<ForecastResult>;

    /// Reject series shorter than [`ForecastStrategy::min_history`]
    fn check_history(&self, series: &MonthlySeries) -> Result<()> {
        if series.len() < self.min_history() {
            return Err(ForecastError::InsufficientHistory {
                strategy: self.kind().to_string(),
                required: self.min_history(),
                available: series.len(),
            });
        }
        Ok(())
    }
}

/// Construct the backend for `kind`
pub fn build_strategy(
    kind: StrategyKind,
    sarima: &SarimaConfig,
    trees: &BoostingParams,
) -> Box<dyn ForecastStrategy> {
    match kind {
        StrategyKind::Sarima => Box::new(SarimaStrategy::new(sarima.clone())),
        StrategyKind::Xgboost => Box::new(GradientBoostingStrategy::new(trees.clone())),
    }
}
