//! Utility functions for the sales_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};

/// Calendar helpers for month-end indexed series
pub mod calendar {
    use super::*;

    /// Last day of the month containing `date`
    pub fn month_end(date: NaiveDate) -> NaiveDate {
        let first = date.with_day(1).unwrap_or(date);
        first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(date)
    }

    /// Month end following the month of `date`
    pub fn next_month_end(date: NaiveDate) -> NaiveDate {
        let first = date.with_day(1).unwrap_or(date);
        match first.checked_add_months(Months::new(1)) {
            Some(next) => month_end(next),
            None => date,
        }
    }

    /// `horizon` consecutive month ends after `last`
    pub fn future_month_ends(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(horizon);
        let mut current = last;
        for _ in 0..horizon {
            current = next_month_end(current);
            dates.push(current);
        }
        dates
    }

    /// Calendar quarter (1..=4) of `date`
    pub fn quarter(date: NaiveDate) -> u32 {
        (date.month() - 1) / 3 + 1
    }
}

/// Date parsing for raw order dates
pub mod date_parser {
    use super::*;

    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

    /// Parse a date written in any of the supported formats.
    ///
    /// Accepts ISO dates, US `month/day/year` dates, `year/month/day`,
    /// dotted European dates and RFC 3339 timestamps (the date part is kept).
    pub fn parse_date(value: &str) -> Result<NaiveDate> {
        let trimmed = value.trim();
        for format in FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Ok(date);
            }
        }
        if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(trimmed) {
            return Ok(timestamp.date_naive());
        }
        if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
            return Ok(datetime.date());
        }
        Err(ForecastError::DataError(format!(
            "Unrecognized date format: '{}'",
            value
        )))
    }
}
