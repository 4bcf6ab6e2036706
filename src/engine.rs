//! End-to-end allocation: solve, normalize, assess.

use std::fmt;
use std::str::FromStr;

use crate::Optimizer;
use crate::backend::{AnnealingSampler, ExhaustiveSampler};
use crate::combinatorial::CombinatorialOptimizer;
use crate::config::{Penalties, RiskConfig, SolverSettings};
use crate::continuous::ContinuousOptimizer;
use crate::error::Result;
use crate::normalize::normalize;
use crate::risk::{RiskMetrics, RiskReport};
use crate::types::{CovarianceMatrix, ReturnVector, Weights};

/// A normalized allocation with its risk assessment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Allocation {
    pub weights: Weights,
    pub report: RiskReport,
    /// Solver objective (continuous) or sample energy (combinatorial).
    pub objective: f64,
    pub converged: bool,
}

impl Allocation {
    pub fn var(&self) -> f64 {
        self.report.var
    }

    pub fn cvar(&self) -> f64 {
        self.report.cvar
    }
}

/// Run `optimizer`, normalize its raw allocation, and compute VaR/CVaR.
///
/// Non-convergence is not an error: the best iterate is kept and
/// `converged` is false.
pub fn allocate<O: Optimizer + ?Sized>(
    optimizer: &O,
    returns: &ReturnVector,
    covariance: &CovarianceMatrix,
    config: &RiskConfig,
) -> Result<Allocation> {
    let result = optimizer.solve(returns, covariance, config)?;
    if !result.converged {
        log::warn!(
            "{} optimizer did not converge; allocation is the best iterate found",
            optimizer.name()
        );
    }

    let weights = normalize(&result.raw_allocation)?;
    let metrics = RiskMetrics::new(returns, covariance, config)?;
    let report = metrics.report(weights.as_slice(), optimizer.risk_free_rate())?;

    log::info!(
        "{} allocation: VaR {:.2}, CVaR {:.2}",
        optimizer.name(),
        report.var,
        report.cvar
    );

    Ok(Allocation {
        weights,
        report,
        objective: result.objective_value,
        converged: result.converged,
    })
}

/// Which solver family to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Method {
    /// Projected-gradient max-Sharpe.
    #[default]
    Continuous,
    /// QUBO via the built-in simulated annealer.
    Annealing,
    /// QUBO via exhaustive enumeration.
    Exhaustive,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Continuous => write!(f, "continuous"),
            Method::Annealing => write!(f, "annealing"),
            Method::Exhaustive => write!(f, "exhaustive"),
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuous" | "classical" => Ok(Method::Continuous),
            "annealing" | "anneal" => Ok(Method::Annealing),
            "exhaustive" | "exact" => Ok(Method::Exhaustive),
            other => Err(format!(
                "unknown method '{other}' (expected continuous, annealing, or exhaustive)"
            )),
        }
    }
}

/// Everything needed to build any [`Method`]'s optimizer.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizerSpec {
    pub method: Method,
    pub risk_free_rate: f64,
    pub penalties: Penalties,
    pub solver: SolverSettings,
    pub shots: usize,
    pub sweeps: usize,
    pub seed: u64,
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self {
            method: Method::default(),
            risk_free_rate: 0.01,
            penalties: Penalties::default(),
            solver: SolverSettings::default(),
            shots: crate::combinatorial::DEFAULT_SHOTS,
            sweeps: AnnealingSampler::default().sweeps,
            seed: 0,
        }
    }
}

impl OptimizerSpec {
    /// Build the optimizer selected by `method`.
    pub fn build(&self) -> Box<dyn Optimizer + Send + Sync> {
        match self.method {
            Method::Continuous => Box::new(
                ContinuousOptimizer::new(self.risk_free_rate)
                    .with_penalties(self.penalties)
                    .with_settings(self.solver),
            ),
            Method::Annealing => Box::new(
                CombinatorialOptimizer::new(
                    AnnealingSampler::new(self.seed).sweeps(self.sweeps),
                    self.risk_free_rate,
                )
                .with_shots(self.shots)
                .with_penalties(self.penalties),
            ),
            Method::Exhaustive => Box::new(
                CombinatorialOptimizer::new(ExhaustiveSampler, self.risk_free_rate)
                    .with_shots(self.shots)
                    .with_penalties(self.penalties),
            ),
        }
    }
}
