//! Transaction data handling for sales forecasting

use crate::error::{ForecastError, Result};
use crate::utils::date_parser;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Sentinel category meaning "no category filter"
pub const ALL_CATEGORIES: &str = "All Categories";
/// Sentinel region meaning "no region filter"
pub const ALL_REGIONS: &str = "All Regions";

/// Normalized column names the loader requires
pub const ORDER_DATE_COLUMN: &str = "Order_Date";
pub const SALES_COLUMN: &str = "Sales";
pub const CATEGORY_COLUMN: &str = "Category";
pub const REGION_COLUMN: &str = "Region";

/// A single sales transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub order_date: NaiveDate,
    pub sales: f64,
    pub category: String,
    pub region: String,
}

impl TransactionRow {
    pub fn new(order_date: NaiveDate, sales: f64, category: &str, region: &str) -> Self {
        Self {
            order_date,
            sales,
            category: category.to_string(),
            region: region.to_string(),
        }
    }
}

/// Category/region slice requested by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub category: String,
    pub region: String,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORIES.to_string(),
            region: ALL_REGIONS.to_string(),
        }
    }
}

impl FilterSelection {
    pub fn new(category: &str, region: &str) -> Self {
        Self {
            category: category.to_string(),
            region: region.to_string(),
        }
    }

    /// Whether `row` belongs to this slice
    pub fn matches(&self, row: &TransactionRow) -> bool {
        (self.category == ALL_CATEGORIES || row.category == self.category)
            && (self.region == ALL_REGIONS || row.region == self.region)
    }
}

/// Values available for the category and region selectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub regions: Vec<String>,
}

/// Tidy table of sales transactions
#[derive(Debug, Clone, Default)]
pub struct SalesDataset {
    rows: Vec<TransactionRow>,
}

impl SalesDataset {
    /// Create a dataset from already-parsed rows
    pub fn from_rows(rows: Vec<TransactionRow>) -> Self {
        Self { rows }
    }

    /// Load transactions from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ForecastError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found at: {}", path.display()),
            )));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Create a dataset from an existing DataFrame.
    ///
    /// Column names are matched after normalization, so `Order Date` and
    /// `Order-Date` both resolve to `Order_Date`.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let dates = Self::string_column(df, ORDER_DATE_COLUMN)?;
        let categories = Self::string_column(df, CATEGORY_COLUMN)?;
        let regions = Self::string_column(df, REGION_COLUMN)?;
        let sales = Self::float_column(df, SALES_COLUMN)?;

        let mut rows = Vec::with_capacity(df.height());
        let mut skipped = 0usize;
        for (((date, sales), category), region) in dates
            .into_iter()
            .zip(sales)
            .zip(categories)
            .zip(regions)
        {
            let (Some(date), Some(sales), Some(category), Some(region)) =
                (date, sales, category, region)
            else {
                skipped += 1;
                continue;
            };
            rows.push(TransactionRow {
                order_date: date_parser::parse_date(&date)?,
                sales,
                category,
                region,
            });
        }

        if skipped > 0 {
            warn!(skipped, "Skipped rows with missing values");
        }

        Ok(Self { rows })
    }

    /// Normalize a raw column header: spaces and hyphens become underscores
    pub fn normalize_column_name(name: &str) -> String {
        name.trim().replace([' ', '-'], "_")
    }

    fn find_column<'a>(df: &'a DataFrame, normalized: &str) -> Result<&'a Column> {
        let original = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .find(|name| Self::normalize_column_name(name) == normalized)
            .ok_or_else(|| {
                ForecastError::DataError(format!("Column '{}' not found in data", normalized))
            })?;
        Ok(df.column(&original)?)
    }

    fn string_column(df: &DataFrame, normalized: &str) -> Result<Vec<Option<String>>> {
        let column = Self::find_column(df, normalized)?.cast(&DataType::String)?;
        let values = column.as_materialized_series().str()?;
        Ok(values
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect())
    }

    fn float_column(df: &DataFrame, normalized: &str) -> Result<Vec<Option<f64>>> {
        let column = Self::find_column(df, normalized)?.cast(&DataType::Float64)?;
        let values = column.as_materialized_series().f64()?;
        Ok(values.into_iter().collect())
    }

    /// All transactions
    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted distinct categories and regions, each list led by its "All" sentinel
    pub fn filter_options(&self) -> FilterOptions {
        let categories: BTreeSet<&str> = self.rows.iter().map(|r| r.category.as_str()).collect();
        let regions: BTreeSet<&str> = self.rows.iter().map(|r| r.region.as_str()).collect();

        FilterOptions {
            categories: std::iter::once(ALL_CATEGORIES)
                .chain(categories)
                .map(str::to_string)
                .collect(),
            regions: std::iter::once(ALL_REGIONS)
                .chain(regions)
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug)]
enum LoadState {
    Loaded(SalesDataset),
    Failed(String),
}

/// Process-wide dataset, loaded once and read by every request.
///
/// Loading never fails: a failed load is stored with its reason and every
/// later access returns [`ForecastError::UpstreamLoadFailure`].
#[derive(Debug, Clone)]
pub struct DatasetContext {
    state: Arc<LoadState>,
}

impl DatasetContext {
    /// Load the dataset from a CSV file, recording the failure reason if any
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path: PathBuf = path.as_ref().to_path_buf();
        let state = match SalesDataset::from_csv(&path) {
            Ok(dataset) => {
                info!(rows = dataset.len(), path = %path.display(), "Dataset loaded");
                LoadState::Loaded(dataset)
            }
            Err(ForecastError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let reason = format!("Error: file not found at: {}", path.display());
                warn!(%reason, "Dataset failed to load");
                LoadState::Failed(reason)
            }
            Err(e) => {
                let reason = format!("Error loading data: {}", e);
                warn!(%reason, "Dataset failed to load");
                LoadState::Failed(reason)
            }
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Wrap an already-loaded dataset
    pub fn from_dataset(dataset: SalesDataset) -> Self {
        Self {
            state: Arc::new(LoadState::Loaded(dataset)),
        }
    }

    /// Record a load that failed elsewhere
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: Arc::new(LoadState::Failed(reason.into())),
        }
    }

    /// Load status: `"Success"` or the failure reason
    pub fn status(&self) -> &str {
        match self.state.as_ref() {
            LoadState::Loaded(_) => "Success",
            LoadState::Failed(reason) => reason,
        }
    }

    /// The dataset, or the stored load failure
    pub fn dataset(&self) -> Result<&SalesDataset> {
        match self.state.as_ref() {
            LoadState::Loaded(dataset) => Ok(dataset),
            LoadState::Failed(reason) => Err(ForecastError::UpstreamLoadFailure(reason.clone())),
        }
    }
}
