//! Error types for the sales_forecast crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No transactions match the requested category/region
    #[error("No data found for {category}/{region}.")]
    DataUnavailable { category: String, region: String },

    /// Series too short for the chosen strategy
    #[error("insufficient data: {strategy} needs at least {required} monthly observations, got {available}")]
    InsufficientHistory {
        strategy: String,
        required: usize,
        available: usize,
    },

    /// Numerical failure while fitting a model
    #[error("{0}")]
    FitFailure(String),

    /// Strategy identifier is not one of the supported backends
    #[error("Unknown strategy '{0}': model_type must be 'sarima' or 'xgboost'")]
    UnknownStrategy(String),

    /// The dataset could not be loaded at startup
    #[error("Data not loaded. Reason: {0}")]
    UpstreamLoadFailure(String),

    /// An accuracy metric has no defined value for the evaluation window
    #[error("Metric undefined: {0}")]
    MetricUndefined(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error reading or parsing configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Coarse classification of a [`ForecastError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataUnavailable,
    InsufficientHistory,
    FitFailure,
    UnknownStrategy,
    UpstreamLoadFailure,
    MetricUndefined,
    InvalidInput,
    Internal,
}

/// Structured error payload handed to the request layer
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub kind: ErrorKind,
    pub detail: String,
}

impl ForecastError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            ForecastError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            ForecastError::FitFailure(_) => ErrorKind::FitFailure,
            ForecastError::UnknownStrategy(_) => ErrorKind::UnknownStrategy,
            ForecastError::UpstreamLoadFailure(_) => ErrorKind::UpstreamLoadFailure,
            ForecastError::MetricUndefined(_) => ErrorKind::MetricUndefined,
            ForecastError::ValidationError(_)
            | ForecastError::InvalidParameter(_)
            | ForecastError::ConfigError(_) => ErrorKind::InvalidInput,
            ForecastError::DataError(_)
            | ForecastError::IoError(_)
            | ForecastError::PolarsError(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller caused the failure (4xx-equivalent) rather than the service
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::UpstreamLoadFailure | ErrorKind::Internal
        )
    }

    /// Render as a structured response value
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: "error",
            kind: self.kind(),
            detail: self.to_string(),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidInput(msg) => ForecastError::InvalidParameter(msg),
            other => ForecastError::FitFailure(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
