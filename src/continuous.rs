//! Continuous solver: projected gradient descent on the unit simplex.
//!
//! Every iterate is the Euclidean projection of a gradient step onto
//! `{w : Σw = 1, 0 <= wᵢ <= 1}`, so the bounds and the budget hold throughout.
//! Steps are chosen by backtracking: a step is accepted only if it lowers the
//! objective, which makes the current iterate always the best one seen.

use crate::Optimizer;
use crate::config::{Penalties, RiskConfig, SolverSettings};
use crate::error::{Error, Result};
use crate::formulate::ProblemFormulator;
use crate::types::{CovarianceMatrix, OptimizationResult, ReturnVector, equal_weights};

/// Halvings tried per line search before the iterate is declared stationary.
const MAX_BACKTRACKS: usize = 60;

/// Max-Sharpe solver with optional VaR/CVaR penalty.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousOptimizer {
    risk_free_rate: f64,
    penalties: Penalties,
    settings: SolverSettings,
}

impl ContinuousOptimizer {
    pub fn new(risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            penalties: Penalties::default(),
            settings: SolverSettings::default(),
        }
    }

    pub fn with_penalties(mut self, penalties: Penalties) -> Self {
        self.penalties = penalties;
        self
    }

    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }
}

impl Optimizer for ContinuousOptimizer {
    fn name(&self) -> &'static str {
        "continuous"
    }

    fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    fn solve(
        &self,
        returns: &ReturnVector,
        covariance: &CovarianceMatrix,
        config: &RiskConfig,
    ) -> Result<OptimizationResult> {
        self.settings.validate()?;
        let problem = ProblemFormulator::new(
            returns,
            covariance,
            config,
            self.risk_free_rate,
            self.penalties,
        )?;
        let n = problem.num_assets();

        if n == 1 {
            let w = vec![1.0];
            return Ok(OptimizationResult {
                objective_value: problem.objective(&w)?,
                raw_allocation: w,
                converged: true,
            });
        }

        let mut w = equal_weights(n);
        let mut f = problem.objective(&w)?;
        let mut step = self.settings.initial_step;
        let mut converged = false;
        let mut iterations = 0;

        'outer: for _ in 0..self.settings.max_iterations {
            iterations += 1;
            let grad = problem.gradient(&w)?;

            let mut accepted = false;
            for _ in 0..MAX_BACKTRACKS {
                let candidate: Vec<f64> = w
                    .iter()
                    .zip(&grad)
                    .map(|(wi, gi)| wi - step * gi)
                    .collect();
                let Some(projected) = project_simplex(&candidate) else {
                    step *= 0.5;
                    continue;
                };

                if squared_distance(&projected, &w) < self.settings.tolerance {
                    converged = true;
                    break 'outer;
                }

                match problem.objective(&projected) {
                    Ok(next) if next < f => {
                        w = projected;
                        f = next;
                        accepted = true;
                        break;
                    }
                    Ok(_) | Err(Error::DegenerateInput { .. }) => step *= 0.5,
                    Err(e) => return Err(e),
                }
            }

            if !accepted {
                // No descent at machine precision.
                converged = true;
                break;
            }
            step = (step * 2.0).min(self.settings.initial_step);
        }

        if converged {
            log::debug!("continuous solve converged after {iterations} iterations, f = {f:.6}");
        } else {
            log::warn!(
                "continuous solve did not converge in {} iterations; best iterate f = {f:.6}",
                self.settings.max_iterations
            );
        }

        Ok(OptimizationResult {
            raw_allocation: w,
            objective_value: f,
            converged,
        })
    }
}

/// Euclidean projection onto the unit simplex.
///
/// Returns `None` for non-finite input. Entries of the result lie in `[0, 1]`
/// and sum to 1 up to rounding.
pub(crate) fn project_simplex(v: &[f64]) -> Option<Vec<f64>> {
    if v.is_empty() || v.iter().any(|x| !x.is_finite()) {
        return None;
    }

    let mut u = v.to_vec();
    u.sort_by(|a, b| b.total_cmp(a));

    let mut cssv = 0.0;
    let mut rho = 0_usize;
    let mut theta = 0.0;

    for (i, ui) in u.iter().enumerate() {
        cssv += *ui;
        let t = (cssv - 1.0) / (i as f64 + 1.0);
        if *ui - t > 0.0 {
            rho = i + 1;
            theta = t;
        }
    }

    // u[0] − (u[0] − 1) = 1 > 0, so rho >= 1 for finite input.
    debug_assert!(rho > 0);
    Some(v.iter().map(|x| (x - theta).clamp(0.0, 1.0)).collect())
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
}
