//! Monthly aggregation of transactions

use crate::data::{FilterSelection, TransactionRow};
use crate::error::{ForecastError, Result};
use crate::utils::calendar::{month_end, next_month_end};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Gap-free monthly total-sales series indexed by month-end dates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

/// History payload in the wire format: calendar-string index plus values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPayload {
    pub index: Vec<String>,
    pub data: Vec<f64>,
}

impl MonthlySeries {
    /// Build a series from consecutive month-end dates and their totals
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }
        for (i, date) in dates.iter().enumerate() {
            if month_end(*date) != *date {
                return Err(ForecastError::ValidationError(format!(
                    "{} is not a month-end date",
                    date
                )));
            }
            if i > 0 && next_month_end(dates[i - 1]) != *date {
                return Err(ForecastError::ValidationError(format!(
                    "Series is not contiguous between {} and {}",
                    dates[i - 1],
                    date
                )));
            }
        }
        Ok(Self { dates, values })
    }

    /// Build a contiguous series of `values` starting at the month containing `start`
    pub fn from_values(start: NaiveDate, values: Vec<f64>) -> Self {
        let mut dates = Vec::with_capacity(values.len());
        let mut current = month_end(start);
        for i in 0..values.len() {
            if i > 0 {
                current = next_month_end(current);
            }
            dates.push(current);
        }
        Self { dates, values }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Month end of the last observation
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Sub-series `[start, end)`
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        Self {
            dates: self.dates[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }

    /// Render as the history payload with `YYYY-MM-DD` date strings
    pub fn to_history(&self) -> HistoryPayload {
        HistoryPayload {
            index: self
                .dates
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
            data: self.values.clone(),
        }
    }
}

/// Filter `rows` to `selection` and resample to month-end totals.
///
/// Returns the series and whether any transaction matched. An empty match is
/// a normal outcome and yields `(MonthlySeries::default(), false)`.
pub fn aggregate(rows: &[TransactionRow], selection: &FilterSelection) -> (MonthlySeries, bool) {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows.iter().filter(|r| selection.matches(r)) {
        *totals.entry(month_end(row.order_date)).or_insert(0.0) += row.sales;
    }

    let (Some(first), Some(last)) = (
        totals.keys().next().copied(),
        totals.keys().next_back().copied(),
    ) else {
        return (MonthlySeries::default(), false);
    };

    let mut dates = Vec::new();
    let mut values = Vec::new();
    let mut current = first;
    while current <= last {
        dates.push(current);
        values.push(totals.get(&current).copied().unwrap_or(0.0));
        current = next_month_end(current);
    }

    (MonthlySeries { dates, values }, true)
}
