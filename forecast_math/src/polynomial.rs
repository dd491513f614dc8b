//! Lag-polynomial algebra for ARIMA-family models
//!
//! A lag polynomial is stored as its coefficient vector indexed by lag, so
//! `[1.0, -0.5]` is `1 - 0.5B` and `[1.0, 0.0, 0.0, 0.3]` is `1 + 0.3B^3`.
//! Index 0 is always 1.

use crate::{MathError, Result};

/// Multiply two lag polynomials
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

/// Autoregressive polynomial `1 - c1 B^s - c2 B^2s - ...`
pub fn ar_polynomial(coefficients: &[f64], lag_step: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * lag_step + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * lag_step] = -c;
    }
    poly
}

/// Moving-average polynomial `1 + c1 B^s + c2 B^2s + ...`
pub fn ma_polynomial(coefficients: &[f64], lag_step: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * lag_step + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * lag_step] = c;
    }
    poly
}

/// Differencing operator `(1 - B)^d (1 - B^period)^seasonal_d`
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    poly
}

/// Apply a lag polynomial as a filter.
///
/// Returns `sum_i poly[i] * data[t - i]` for every `t` with a full window, so
/// the output is `poly.len() - 1` shorter than the input.
pub fn apply(poly: &[f64], data: &[f64]) -> Result<Vec<f64>> {
    let degree = poly.len().saturating_sub(1);
    if data.len() <= degree {
        return Err(MathError::InsufficientData(format!(
            "Filter of degree {} needs more than {} observations, got {}",
            degree,
            degree,
            data.len()
        )));
    }

    Ok((degree..data.len())
        .map(|t| {
            poly.iter()
                .enumerate()
                .map(|(i, &c)| c * data[t - i])
                .sum()
        })
        .collect())
}

/// Psi weights of the MA(infinity) representation `ma(B) / ar(B)`.
///
/// `ar` and `ma` are lag polynomials; the AR side may include differencing
/// factors, which is what makes forecast variance grow without bound for
/// integrated models.
pub fn psi_weights(ar: &[f64], ma: &[f64], count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);
    for j in 0..count {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = ma.get(j).copied().unwrap_or(0.0);
        for i in 1..=j.min(ar.len().saturating_sub(1)) {
            value -= ar[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_multiply() {
        // (1 - 0.5B)(1 + 0.2B) = 1 - 0.3B - 0.1B^2
        let product = multiply(&[1.0, -0.5], &[1.0, 0.2]);
        assert_eq!(product.len(), 3);
        assert_approx_eq!(product[1], -0.3);
        assert_approx_eq!(product[2], -0.1);
    }

    #[test]
    fn test_differencing_polynomial() {
        // (1 - B)(1 - B^4) = 1 - B - B^4 + B^5
        let poly = differencing_polynomial(1, 1, 4);
        assert_eq!(poly, vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
    }

    #[test]
    fn test_apply_first_difference() {
        let diff = apply(&[1.0, -1.0], &[1.0, 3.0, 6.0, 10.0]).unwrap();
        assert_eq!(diff, vec![2.0, 3.0, 4.0]);

        assert!(apply(&[1.0, -1.0], &[1.0]).is_err());
    }

    #[test]
    fn test_seasonal_polynomials() {
        assert_eq!(ar_polynomial(&[0.5], 3), vec![1.0, 0.0, 0.0, -0.5]);
        assert_eq!(ma_polynomial(&[0.4], 2), vec![1.0, 0.0, 0.4]);
    }

    #[test]
    fn test_psi_weights_random_walk() {
        // Random walk: every psi weight is 1
        let psi = psi_weights(&[1.0, -1.0], &[1.0], 5);
        assert_eq!(psi, vec![1.0; 5]);

        // AR(1) with phi = 0.5: psi_j = 0.5^j
        let psi = psi_weights(&[1.0, -0.5], &[1.0], 4);
        assert_approx_eq!(psi[3], 0.125);
    }
}
