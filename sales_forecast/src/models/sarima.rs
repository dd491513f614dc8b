//! Seasonal ARIMA forecasting
//!
//! SARIMA(p,d,q)(P,D,Q)[s] fitted by conditional sum of squares. The series is
//! differenced `d` times and seasonally differenced `D` times, an ARMA model with
//! multiplicative seasonal factors is fitted to the result, and forecasts are
//! integrated back to the original scale. Prediction intervals use the psi
//! weights of the full integrated model, so they widen with the horizon.

use crate::aggregate::MonthlySeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastPoint, ForecastResult, ForecastStrategy, StrategyKind};
use crate::utils::calendar::future_month_ends;
use forecast_math::optimize::NelderMead;
use forecast_math::polynomial;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// SARIMA orders and fitting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarimaConfig {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
    /// Seasonal AR order
    pub seasonal_p: usize,
    /// Seasonal differencing order
    pub seasonal_d: usize,
    /// Seasonal MA order
    pub seasonal_q: usize,
    /// Season length in months
    pub period: usize,
    /// Coverage of the prediction interval
    pub confidence_level: f64,
    /// Shortest accepted history, two full seasons by default
    pub min_history: usize,
    /// Optimizer used for the sum-of-squares fit
    pub optimizer: NelderMead,
}

impl Default for SarimaConfig {
    fn default() -> Self {
        Self {
            p: 1,
            d: 1,
            q: 1,
            seasonal_p: 1,
            seasonal_d: 1,
            seasonal_q: 1,
            period: 12,
            confidence_level: 0.95,
            min_history: 24,
            optimizer: NelderMead::default(),
        }
    }
}

impl SarimaConfig {
    /// Validate orders and interval settings
    pub fn validate(&self) -> Result<()> {
        if self.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                self.period
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be between 0 and 1, got {}",
                self.confidence_level
            )));
        }
        if self.d > 2 || self.seasonal_d > 1 {
            return Err(ForecastError::InvalidParameter(
                "Differencing orders must satisfy d <= 2 and D <= 1".to_string(),
            ));
        }
        self.optimizer.validate()?;
        Ok(())
    }

    fn parameter_count(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    fn differencing_lag(&self) -> usize {
        self.d + self.period * self.seasonal_d
    }

    /// Human-readable order, e.g. `SARIMA(1,1,1)(1,1,1)[12]`
    pub fn name(&self) -> String {
        format!(
            "SARIMA({},{},{})({},{},{})[{}]",
            self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
        )
    }
}

/// Coefficients and residual state of a fitted model
#[derive(Debug, Clone)]
pub struct SarimaFit {
    /// AR side of the stationary ARMA part, as a lag polynomial
    arma_ar: Vec<f64>,
    /// MA side, as a lag polynomial
    arma_ma: Vec<f64>,
    /// Differencing operator
    differencing: Vec<f64>,
    /// Differenced series the ARMA part was fitted to
    differenced: Vec<f64>,
    /// In-sample one-step residuals of the differenced series
    residuals: Vec<f64>,
    /// Innovation variance estimate
    sigma2: f64,
    /// Raw coefficients in order `ar, ma, seasonal ar, seasonal ma`
    coefficients: Vec<f64>,
}

impl SarimaFit {
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Point forecasts and their standard errors for `steps` months past `history`
    fn predict(&self, history: &[f64], steps: usize) -> (Vec<f64>, Vec<f64>) {
        let m = self.differenced.len();
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        for h in 0..steps {
            let t = m + h;
            let mut value = 0.0;
            for (i, &c) in self.arma_ar.iter().enumerate().skip(1) {
                if let Some(past) = t.checked_sub(i) {
                    value -= c * w[past];
                }
            }
            for (j, &c) in self.arma_ma.iter().enumerate().skip(1) {
                if let Some(past) = t.checked_sub(j) {
                    value += c * e[past];
                }
            }
            w.push(value);
            e.push(0.0);
        }

        // Integrate back: y_t = w_t - sum_{i>=1} diff[i] * y_{t-i}
        let mut levels = history.to_vec();
        let n = history.len();
        for h in 0..steps {
            let t = n + h;
            let mut value = w[m + h];
            for (i, &c) in self.differencing.iter().enumerate().skip(1) {
                value -= c * levels[t - i];
            }
            levels.push(value);
        }

        let full_ar = polynomial::multiply(&self.arma_ar, &self.differencing);
        let psi = polynomial::psi_weights(&full_ar, &self.arma_ma, steps);
        let mut cumulative = 0.0;
        let std_errors = psi
            .iter()
            .map(|weight| {
                cumulative += weight * weight;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        (levels[n..].to_vec(), std_errors)
    }
}

/// Statistical forecasting strategy
#[derive(Debug, Clone, Default)]
pub struct SarimaStrategy {
    config: SarimaConfig,
}

impl SarimaStrategy {
    pub fn new(config: SarimaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SarimaConfig {
        &self.config
    }

    /// Map unconstrained optimizer coordinates to polynomials in (-1, 1)
    fn polynomials(&self, raw: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let c = &self.config;
        let coefs: Vec<f64> = raw.iter().map(|x| x.tanh()).collect();
        let (ar, rest) = coefs.split_at(c.p);
        let (ma, rest) = rest.split_at(c.q);
        let (sar, sma) = rest.split_at(c.seasonal_p);

        let arma_ar = polynomial::multiply(
            &polynomial::ar_polynomial(ar, 1),
            &polynomial::ar_polynomial(sar, c.period),
        );
        let arma_ma = polynomial::multiply(
            &polynomial::ma_polynomial(ma, 1),
            &polynomial::ma_polynomial(sma, c.period),
        );
        (arma_ar, arma_ma)
    }

    /// Fit the model to `values`
    pub fn fit(&self, values: &[f64]) -> Result<SarimaFit> {
        self.config.validate()?;
        let c = &self.config;
        let required = c.min_history.max(c.differencing_lag() + c.parameter_count() + 1);
        if values.len() < required {
            return Err(ForecastError::InsufficientHistory {
                strategy: StrategyKind::Sarima.to_string(),
                required,
                available: values.len(),
            });
        }

        let differencing = polynomial::differencing_polynomial(c.d, c.seasonal_d, c.period);
        let differenced = polynomial::apply(&differencing, values)?;

        let start = vec![0.0; c.parameter_count()];
        let minimum = c
            .optimizer
            .minimize(
                |raw| {
                    let (ar, ma) = self.polynomials(raw);
                    css_residuals(&differenced, &ar, &ma)
                        .iter()
                        .map(|r| r * r)
                        .sum::<f64>()
                },
                &start,
            )
            .map_err(|e| ForecastError::FitFailure(format!("{} fit failed: {}", c.name(), e)))?;

        let (arma_ar, arma_ma) = self.polynomials(&minimum.x);
        let residuals = css_residuals(&differenced, &arma_ar, &arma_ma);
        let sigma2 = minimum.value / differenced.len() as f64;
        if !sigma2.is_finite() {
            return Err(ForecastError::FitFailure(format!(
                "{} fit produced a non-finite innovation variance",
                c.name()
            )));
        }

        debug!(
            model = %c.name(),
            iterations = minimum.iterations,
            sse = minimum.value,
            sigma2,
            "SARIMA fit converged"
        );

        Ok(SarimaFit {
            arma_ar,
            arma_ma,
            differencing,
            differenced,
            residuals,
            sigma2,
            coefficients: minimum.x.iter().map(|x| x.tanh()).collect(),
        })
    }

    fn z_score(&self) -> Result<f64> {
        let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::FitFailure(e.to_string()))?;
        Ok(normal.inverse_cdf(1.0 - (1.0 - self.config.confidence_level) / 2.0))
    }
}

/// Conditional one-step residuals of an ARMA model, pre-sample values taken as zero
fn css_residuals(w: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let mut residuals = Vec::with_capacity(w.len());
    for t in 0..w.len() {
        let mut e = w[t];
        for (i, &c) in ar.iter().enumerate().skip(1).take(t) {
            e += c * w[t - i];
        }
        for (j, &c) in ma.iter().enumerate().skip(1).take(t) {
            e -= c * residuals[t - j];
        }
        residuals.push(e);
    }
    residuals
}

impl ForecastStrategy for SarimaStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sarima
    }

    fn min_history(&self) -> usize {
        self.config.min_history
    }

    fn forecast(&self, series: &MonthlySeries, steps: usize) -> Result<ForecastResult> {
        if steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "steps must be positive".to_string(),
            ));
        }
        self.check_history(series)?;
        let last = series.last_date().ok_or_else(|| {
            ForecastError::DataError("Cannot forecast an empty series".to_string())
        })?;

        let fit = self.fit(series.values())?;
        let (means, std_errors) = fit.predict(series.values(), steps);
        let z = self.z_score()?;

        let points = future_month_ends(last, steps)
            .into_iter()
            .zip(means.into_iter().zip(std_errors))
            .map(|(date, (mean, se))| ForecastPoint {
                date,
                point_forecast: mean,
                lower_bound: Some(mean - z * se),
                upper_bound: Some(mean + z * se),
            })
            .collect();

        ForecastResult::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_css_residuals_white_noise() {
        // With no AR/MA terms the residuals are the data
        let w = vec![1.0, -2.0, 3.0];
        assert_eq!(css_residuals(&w, &[1.0], &[1.0]), w);
    }

    #[test]
    fn test_css_residuals_ar1() {
        // e_t = w_t - 0.5 w_{t-1}
        let r = css_residuals(&[2.0, 3.0, 1.0], &[1.0, -0.5], &[1.0]);
        assert_approx_eq!(r[0], 2.0);
        assert_approx_eq!(r[1], 2.0);
        assert_approx_eq!(r[2], -0.5);
    }

    #[test]
    fn test_repeating_season_is_reproduced() {
        let season = [10.0, 12.0, 15.0, 13.0, 11.0, 9.0, 8.0, 10.0, 14.0, 18.0, 22.0, 30.0];
        let values: Vec<f64> = season.iter().chain(season.iter()).chain(season.iter()).copied().collect();
        let strategy = SarimaStrategy::default();
        let fit = strategy.fit(&values).unwrap();
        let (means, _) = fit.predict(&values, 12);

        for (forecast, expected) in means.iter().zip(season.iter()) {
            assert_approx_eq!(*forecast, *expected, 1e-6);
        }
        assert_approx_eq!(fit.sigma2(), 0.0, 1e-9);
    }

    #[test]
    fn test_invalid_confidence_level() {
        let config = SarimaConfig {
            confidence_level: 1.5,
            ..SarimaConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(SarimaConfig::default().name(), "SARIMA(1,1,1)(1,1,1)[12]");
    }
}
