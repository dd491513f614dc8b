//! # Sales Forecast
//!
//! Monthly retail sales forecasting sliced by product category and region.
//!
//! ## Features
//!
//! - Transaction loading from CSV with column-name normalization
//! - Month-end aggregation with zero-filled gaps
//! - Calendar and 12-month lag features for tree models
//! - Two interchangeable forecasting strategies:
//!   - `sarima`: seasonal ARIMA with prediction intervals
//!   - `xgboost`: gradient-boosted trees with recursive multi-step forecasts
//! - Backtesting on the last 12 months with MAPE and RMSE
//!
//! ## Quick Start
//!
//! ```no_run
//! use sales_forecast::{DatasetContext, FilterSelection, ForecastPipeline, PipelineConfig};
//!
//! // Load once at startup; a failed load is kept and reported on every request
//! let context = DatasetContext::load("data/superstore.csv");
//! let pipeline = ForecastPipeline::new(context, PipelineConfig::default());
//!
//! let selection = FilterSelection::new("Furniture", "West");
//! let forecast = pipeline.forecast("sarima", &selection, 12)?;
//! let metrics = pipeline.evaluate("xgboost", &selection)?;
//!
//! println!("{}", serde_json::to_string_pretty(&forecast).unwrap());
//! println!("{}", serde_json::to_string_pretty(&metrics).unwrap());
//! # Ok::<(), sales_forecast::ForecastError>(())
//! ```

pub mod aggregate;
pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use crate::aggregate::{aggregate, MonthlySeries};
pub use crate::backtest::{backtest, BacktestReport};
pub use crate::config::PipelineConfig;
pub use crate::data::{DatasetContext, FilterSelection, SalesDataset, TransactionRow};
pub use crate::error::ForecastError;
pub use crate::features::{derive_features, FeatureRow};
pub use crate::models::{ForecastResult, ForecastStrategy, StrategyKind};
pub use crate::pipeline::{EvaluationResponse, ForecastPipeline, ForecastResponse};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
