//! # varopt
//!
//! Risk-aware portfolio allocation from expected returns and a covariance
//! matrix: maximize excess return per unit of volatility, fully invested and
//! long-only, under an optional Value-at-Risk (and CVaR) ceiling.
//!
//! ## Pipeline
//!
//! ```text
//! returns + covariance ─► ProblemFormulator ─► ContinuousOptimizer ─┐
//!                                         └─► CombinatorialOptimizer ─┤ (QUBO backend)
//!                                                                      ▼
//!                      RiskMetrics (VaR, CVaR) ◄── normalize ◄── raw allocation
//! ```
//!
//! Both solvers implement [`Optimizer`], so callers pick one by configuration
//! ([`Method`]) rather than by type.
//!
//! ## Quick Start
//!
//! ```
//! use varopt::{allocate, ContinuousOptimizer, CovarianceMatrix, ReturnVector, RiskConfig};
//!
//! let returns = ReturnVector::new(vec![0.01, 0.02, 0.015]).unwrap();
//! let cov = CovarianceMatrix::new(vec![
//!     vec![1e-4, 2e-5, 1e-5],
//!     vec![2e-5, 1.5e-4, 3e-5],
//!     vec![1e-5, 3e-5, 1.2e-4],
//! ])
//! .unwrap();
//!
//! let config = RiskConfig::default().max_var(50_000.0);
//! let alloc = allocate(&ContinuousOptimizer::new(0.01), &returns, &cov, &config).unwrap();
//!
//! let total: f64 = alloc.weights.as_slice().iter().sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! assert!(alloc.cvar() <= alloc.var());
//! ```
//!
//! ## QUBO backends
//!
//! The combinatorial path answers "which assets to hold" with one bit per
//! asset and spreads the budget equally over the selection. Any sampler that
//! implements [`backend::QuboBackend`] can be plugged in:
//!
//! ```
//! use varopt::backend::ExhaustiveSampler;
//! use varopt::{allocate, CombinatorialOptimizer, CovarianceMatrix, ReturnVector, RiskConfig};
//!
//! let returns = ReturnVector::new(vec![0.01, 0.02]).unwrap();
//! let cov = CovarianceMatrix::new(vec![vec![1e-4, 0.0], vec![0.0, 1.5e-4]]).unwrap();
//!
//! let optimizer = CombinatorialOptimizer::new(ExhaustiveSampler, 0.01).with_shots(4);
//! let alloc = allocate(&optimizer, &returns, &cov, &RiskConfig::default()).unwrap();
//! assert_eq!(alloc.weights.as_slice(), &[0.0, 1.0]);
//! ```
//!
//! ## Sign conventions
//!
//! VaR and CVaR are signed tail P&L in currency units (`value · (μ − k·σ)`),
//! positive when the portfolio still gains at the tail. See
//! [`PenaltyConvention`] for how a ceiling breach becomes a penalty.

pub mod backend;
mod combinatorial;
mod config;
mod continuous;
mod engine;
mod error;
mod formulate;
mod normalize;
pub mod risk;
#[cfg(feature = "parallel")]
pub mod sweep;
mod types;

// Re-export public API
pub use combinatorial::{CombinatorialOptimizer, DEFAULT_SHOTS, select_best};
pub use config::{
    BudgetEncoding, DEFAULT_PORTFOLIO_VALUE, Penalties, PenaltyConvention, RiskConfig,
    SolverSettings,
};
pub use continuous::ContinuousOptimizer;
pub use engine::{Allocation, Method, OptimizerSpec, allocate};
pub use error::{BackendError, Error, Result};
pub use formulate::{ProblemFormulator, QuboPayload, QuboProblem};
pub use normalize::normalize;
pub use risk::{RiskMetrics, RiskReport};
pub use types::{
    CovarianceMatrix, OptimizationResult, ReturnVector, WEIGHT_SUM_TOLERANCE, Weights,
    check_dimensions,
};

/// A solver turning returns and covariance into a raw allocation.
///
/// Implementations are stateless between calls: each `solve` is a pure
/// function of its inputs, so one optimizer can serve concurrent requests.
pub trait Optimizer {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Risk-free rate the objective measures excess return against.
    fn risk_free_rate(&self) -> f64;

    /// Solve for a raw, not yet normalized, allocation.
    fn solve(
        &self,
        returns: &ReturnVector,
        covariance: &CovarianceMatrix,
        config: &RiskConfig,
    ) -> Result<OptimizationResult>;
}
