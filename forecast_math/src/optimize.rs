//! Derivative-free minimization
//!
//! Nelder-Mead simplex search, used to fit model coefficients by minimizing a
//! sum-of-squares objective.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Nelder-Mead simplex minimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMead {
    /// Maximum number of iterations per parameter
    pub iterations_per_parameter: usize,
    /// Relative spread of objective values across the simplex that counts as converged
    pub f_tolerance: f64,
    /// Simplex diameter that counts as converged
    pub x_tolerance: f64,
    /// Offset used to build the initial simplex around the starting point
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            iterations_per_parameter: 200,
            f_tolerance: 1e-8,
            x_tolerance: 1e-6,
            initial_step: 0.1,
        }
    }
}

/// Result of a successful minimization
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Location of the minimum
    pub x: Vec<f64>,
    /// Objective value at the minimum
    pub value: f64,
    /// Iterations used
    pub iterations: usize,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

impl NelderMead {
    /// Validate the optimizer settings
    pub fn validate(&self) -> Result<()> {
        if self.iterations_per_parameter == 0 {
            return Err(MathError::InvalidInput(
                "iterations_per_parameter must be positive".to_string(),
            ));
        }
        if !(self.f_tolerance > 0.0) || !(self.x_tolerance > 0.0) || !(self.initial_step > 0.0) {
            return Err(MathError::InvalidInput(
                "Tolerances and initial step must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Minimize `objective` starting from `start`.
    ///
    /// Fails with [`MathError::ConvergenceFailure`] when the objective turns
    /// non-finite at the best vertex or the iteration budget runs out.
    pub fn minimize<F>(&self, mut objective: F, start: &[f64]) -> Result<Minimum>
    where
        F: FnMut(&[f64]) -> f64,
    {
        self.validate()?;
        let n = start.len();
        if n == 0 {
            let value = objective(start);
            return Ok(Minimum {
                x: Vec::new(),
                value,
                iterations: 0,
            });
        }

        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(start.to_vec());
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += if vertex[i] == 0.0 {
                self.initial_step
            } else {
                self.initial_step * vertex[i].abs().max(1.0)
            };
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| sanitize(objective(v))).collect();

        let max_iterations = self.iterations_per_parameter * n;
        for iteration in 0..max_iterations {
            order(&mut simplex, &mut values);

            if self.converged(&simplex, &values) {
                return finish(simplex, values, iteration);
            }

            let centroid = centroid(&simplex[..n]);
            let worst = &simplex[n];

            let reflected = along(&centroid, worst, -REFLECTION);
            let f_reflected = sanitize(objective(&reflected));

            if f_reflected < values[0] {
                let expanded = along(&centroid, worst, -EXPANSION);
                let f_expanded = sanitize(objective(&expanded));
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            let (contracted, f_contracted) = if f_reflected < values[n] {
                let outside = along(&centroid, worst, -CONTRACTION);
                let f = sanitize(objective(&outside));
                (outside, f)
            } else {
                let inside = along(&centroid, worst, CONTRACTION);
                let f = sanitize(objective(&inside));
                (inside, f)
            };

            if f_contracted < values[n].min(f_reflected) {
                simplex[n] = contracted;
                values[n] = f_contracted;
                continue;
            }

            let best = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = best
                    .iter()
                    .zip(simplex[i].iter())
                    .map(|(b, x)| b + SHRINK * (x - b))
                    .collect();
                values[i] = sanitize(objective(&simplex[i]));
            }
        }

        order(&mut simplex, &mut values);
        if self.converged(&simplex, &values) {
            return finish(simplex, values, max_iterations);
        }

        Err(MathError::ConvergenceFailure(format!(
            "Nelder-Mead did not converge after {} iterations (best objective {:.6e})",
            max_iterations, values[0]
        )))
    }

    fn converged(&self, simplex: &[Vec<f64>], values: &[f64]) -> bool {
        let best = values[0];
        let worst = values[values.len() - 1];
        if !best.is_finite() {
            return false;
        }
        let spread_ok = (worst - best).abs() <= self.f_tolerance * (best.abs() + self.f_tolerance);

        let diameter = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(simplex[0].iter()).map(|(x, b)| (x - b).abs()))
            .fold(0.0_f64, f64::max);

        spread_ok || diameter <= self.x_tolerance
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        f64::INFINITY
    } else {
        value
    }
}

fn order(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    *simplex = indices.iter().map(|&i| simplex[i].clone()).collect();
    *values = indices.iter().map(|&i| values[i]).collect();
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let mut center = vec![0.0; vertices[0].len()];
    for vertex in vertices {
        for (c, x) in center.iter_mut().zip(vertex.iter()) {
            *c += x / n;
        }
    }
    center
}

/// Point `centroid + t * (worst - centroid)`
fn along(centroid: &[f64], worst: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(worst.iter())
        .map(|(c, w)| c + t * (w - c))
        .collect()
}

fn finish(simplex: Vec<Vec<f64>>, values: Vec<f64>, iterations: usize) -> Result<Minimum> {
    let value = values[0];
    if !value.is_finite() {
        return Err(MathError::ConvergenceFailure(
            "Objective is not finite at the best simplex vertex".to_string(),
        ));
    }
    let x = simplex.into_iter().next().unwrap_or_default();
    Ok(Minimum {
        x,
        value,
        iterations,
    })
}
