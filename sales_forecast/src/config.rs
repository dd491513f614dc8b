//! Pipeline configuration

use crate::backtest::DEFAULT_TEST_MONTHS;
use crate::error::{ForecastError, Result};
use crate::models::SarimaConfig;
use forecast_math::boosting::BoostingParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the dataset path
pub const DATA_PATH_ENV: &str = "RETAIL_FORECAST_DATA";
/// Environment variable overriding the backtest window
pub const TEST_MONTHS_ENV: &str = "RETAIL_FORECAST_TEST_MONTHS";

/// Settings shared by every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV file with the transaction table
    pub dataset_path: Option<PathBuf>,
    /// Months held out by the backtest
    pub test_months: usize,
    /// Forecast horizon used when the caller gives none
    pub default_steps: usize,
    /// Statistical strategy settings
    pub sarima: SarimaConfig,
    /// Tree-based strategy settings
    pub gradient_boosting: BoostingParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            test_months: DEFAULT_TEST_MONTHS,
            default_steps: 12,
            sarima: SarimaConfig::default(),
            gradient_boosting: BoostingParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Apply `RETAIL_FORECAST_DATA` and `RETAIL_FORECAST_TEST_MONTHS` when set
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(path) = std::env::var(DATA_PATH_ENV) {
            self.dataset_path = Some(PathBuf::from(path));
        }
        if let Ok(months) = std::env::var(TEST_MONTHS_ENV) {
            self.test_months = months.trim().parse().map_err(|_| {
                ForecastError::ConfigError(format!(
                    "{} must be a positive integer, got '{}'",
                    TEST_MONTHS_ENV, months
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if self.test_months == 0 {
            return Err(ForecastError::ConfigError(
                "test_months must be positive".to_string(),
            ));
        }
        if self.default_steps == 0 {
            return Err(ForecastError::ConfigError(
                "default_steps must be positive".to_string(),
            ));
        }
        self.sarima
            .validate()
            .map_err(|e| ForecastError::ConfigError(format!("[sarima] {}", e)))?;
        self.gradient_boosting
            .validate()
            .map_err(|e| ForecastError::ConfigError(format!("[gradient_boosting] {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            test_months = 6

            [sarima]
            confidence_level = 0.8

            [gradient_boosting]
            n_estimators = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.test_months, 6);
        assert_eq!(config.default_steps, 12);
        assert_eq!(config.sarima.confidence_level, 0.8);
        assert_eq!(config.sarima.period, 12);
        assert_eq!(config.gradient_boosting.n_estimators, 50);
        assert_eq!(config.gradient_boosting.max_depth, 6);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(PipelineConfig::from_toml_str("test_months = 0").is_err());
        assert!(PipelineConfig::from_toml_str("[gradient_boosting]\nlearning_rate = 2.0").is_err());
        assert!(PipelineConfig::from_toml_str("test_months = \"twelve\"").is_err());
    }
}
