//! Supervised-learning features for the tree-based strategy

use crate::aggregate::MonthlySeries;
use crate::error::{ForecastError, Result};
use crate::utils::calendar::quarter;
use chrono::{Datelike, NaiveDate};

/// Seasonal lag used by the feature table
pub const SEASONAL_LAG: usize = 12;

/// Calendar features plus the seasonal lag for one month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub month: u32,
    pub year: i32,
    pub quarter: u32,
    pub lag_12: f64,
}

impl FeatureRow {
    /// Features for `date`, computed from the calendar alone, plus the given lag
    pub fn for_date(date: NaiveDate, lag_12: f64) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
            quarter: quarter(date),
            lag_12,
        }
    }

    /// Regressor input in column order `month, year, quarter, lag_12`
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.month as f64,
            self.year as f64,
            self.quarter as f64,
            self.lag_12,
        ]
    }
}

/// Feature rows aligned by position with the source series
pub type FeatureTable = Vec<FeatureRow>;

/// Expand a monthly series into `(features, target)`.
///
/// `lag_12[i]` is `sales[i - 12]`; the first twelve rows have no true lag and
/// take the next available lag value instead, which is `lag_12[12] = sales[0]`.
pub fn derive_features(series: &MonthlySeries) -> Result<(FeatureTable, Vec<f64>)> {
    let values = series.values();
    if values.len() <= SEASONAL_LAG {
        return Err(ForecastError::InsufficientHistory {
            strategy: "feature derivation".to_string(),
            required: SEASONAL_LAG + 1,
            available: values.len(),
        });
    }

    let back_fill = values[0];
    let features = series
        .dates()
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let lag = if i >= SEASONAL_LAG {
                values[i - SEASONAL_LAG]
            } else {
                back_fill
            };
            FeatureRow::for_date(date, lag)
        })
        .collect();

    Ok((features, values.to_vec()))
}
