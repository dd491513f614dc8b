//! # Retail Forecast
//!
//! Workspace root re-exporting the forecasting pipeline and its numerical kernels.
//!
//! ## Example
//!
//! ```
//! use retail_forecast_workspace::sales_forecast::aggregate::aggregate;
//! use retail_forecast_workspace::sales_forecast::data::{FilterSelection, TransactionRow};
//! use chrono::NaiveDate;
//!
//! let rows = vec![
//!     TransactionRow::new(NaiveDate::from_ymd_opt(2015, 1, 3).unwrap(), 120.0, "Furniture", "West"),
//!     TransactionRow::new(NaiveDate::from_ymd_opt(2015, 3, 9).unwrap(), 80.0, "Furniture", "West"),
//! ];
//! let (series, has_data) = aggregate(&rows, &FilterSelection::default());
//! assert!(has_data);
//! assert_eq!(series.values(), &[120.0, 0.0, 80.0]);
//! ```

pub use forecast_math;
pub use sales_forecast;

/// Strategy identifiers accepted by the pipeline
///
/// ```
/// use retail_forecast_workspace::supported_strategies;
///
/// assert_eq!(supported_strategies(), ["sarima", "xgboost"]);
/// ```
pub fn supported_strategies() -> [&'static str; 2] {
    [
        sales_forecast::StrategyKind::Sarima.as_str(),
        sales_forecast::StrategyKind::Xgboost.as_str(),
    ]
}
