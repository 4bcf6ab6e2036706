//! Risk, penalty, and solver configuration.

use crate::error::{Error, Result};

/// Default notional the dollar VaR/CVaR figures are scaled by.
pub const DEFAULT_PORTFOLIO_VALUE: f64 = 1_000_000.0;

/// How a breached VaR/CVaR ceiling is turned into a penalty.
///
/// VaR here is the signed tail P&L `value·(μ − z·σ)`: positive when the
/// portfolio still gains at the confidence-level tail, negative when it loses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PenaltyConvention {
    /// Triggers when `VaR > max` and returns `max − VaR`, which is `<= 0`.
    /// A minimizer adding this term is rewarded, not deterred, on breach.
    Legacy,
    /// Treats `−VaR` as the tail loss and returns `max(0, −VaR − max)`.
    #[default]
    TailLoss,
}

/// Immutable risk configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskConfig {
    /// Confidence level in `(0, 1)`, e.g. 0.95.
    pub confidence_level: f64,
    /// Notional in currency units, `> 0`.
    pub portfolio_value: f64,
    /// Optional VaR ceiling in currency units, `> 0`.
    pub max_var: Option<f64>,
    /// Optional CVaR ceiling in currency units, `> 0`.
    pub max_cvar: Option<f64>,
    pub penalty_convention: PenaltyConvention,
}

impl RiskConfig {
    /// Config with the given confidence level and everything else defaulted.
    pub fn with_confidence(confidence_level: f64) -> Self {
        Self {
            confidence_level,
            ..Self::default()
        }
    }

    pub fn max_var(mut self, max_var: f64) -> Self {
        self.max_var = Some(max_var);
        self
    }

    pub fn max_cvar(mut self, max_cvar: f64) -> Self {
        self.max_cvar = Some(max_cvar);
        self
    }

    pub fn portfolio_value(mut self, value: f64) -> Self {
        self.portfolio_value = value;
        self
    }

    pub fn penalty_convention(mut self, convention: PenaltyConvention) -> Self {
        self.penalty_convention = convention;
        self
    }

    /// Validate the config. Returns `Err` with a description if any field is nonsensical.
    pub fn validate(&self) -> Result<()> {
        if !self.confidence_level.is_finite()
            || self.confidence_level <= 0.0
            || self.confidence_level >= 1.0
        {
            return Err(Error::InvalidConfig(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if !self.portfolio_value.is_finite() || self.portfolio_value <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "portfolio_value must be > 0 and finite, got {}",
                self.portfolio_value
            )));
        }
        for (name, ceiling) in [("max_var", self.max_var), ("max_cvar", self.max_cvar)] {
            if let Some(v) = ceiling {
                if !v.is_finite() || v <= 0.0 {
                    return Err(Error::InvalidConfig(format!(
                        "{name} must be > 0 and finite, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            portfolio_value: DEFAULT_PORTFOLIO_VALUE,
            max_var: None,
            max_cvar: None,
            penalty_convention: PenaltyConvention::default(),
        }
    }
}

/// How the full-investment budget is folded into the QUBO.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BudgetEncoding {
    /// `+P` per linear term, `+2P` per pair, and an auxiliary variable at
    /// index N with linear coefficient `−P·N`. The auxiliary bit does not
    /// couple to the asset bits, so the minimizer of this form is the empty
    /// selection whenever `P` dominates the returns.
    Legacy,
    /// Exact expansion of `P·(Σx − 1)²` over binaries: `−P` per linear term,
    /// `+2P` per pair, constant offset `+P`.
    #[default]
    Expanded,
}

/// Penalty coefficients for constraint encoding.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Penalties {
    /// λ multiplying the VaR/CVaR penalty in the continuous objective.
    pub var_weight: f64,
    /// P multiplying the budget term in the QUBO.
    pub budget: f64,
    /// Scale of the flat VaR deterrent added to every QUBO linear term.
    pub qubo_var_scale: f64,
    pub budget_encoding: BudgetEncoding,
}

impl Penalties {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("var_weight", self.var_weight),
            ("budget", self.budget),
            ("qubo_var_scale", self.qubo_var_scale),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be >= 0 and finite, got {v}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            var_weight: 1000.0,
            budget: 1000.0,
            qubo_var_scale: 100.0,
            budget_encoding: BudgetEncoding::default(),
        }
    }
}

/// Settings for the projected-gradient continuous solver.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverSettings {
    pub max_iterations: usize,
    /// Stop when the squared step between iterates falls below this.
    pub tolerance: f64,
    /// First trial step of each backtracking line search.
    pub initial_step: f64,
}

impl SolverSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be > 0".into()));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be > 0 and finite, got {}",
                self.tolerance
            )));
        }
        if !self.initial_step.is_finite() || self.initial_step <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "initial_step must be > 0 and finite, got {}",
                self.initial_step
            )));
        }
        Ok(())
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-16,
            initial_step: 1.0,
        }
    }
}
