//! TOML configuration loading and validation.
//!
//! Every section and field is optional; an empty file yields the library
//! defaults.

use std::path::Path;

use serde::Deserialize;
use varopt::{
    BudgetEncoding, DEFAULT_PORTFOLIO_VALUE, DEFAULT_SHOTS, Method, OptimizerSpec, Penalties,
    PenaltyConvention, RiskConfig, SolverSettings,
};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub risk: RiskSection,
    #[serde(default)]
    pub optimizer: OptimizerSection,
    #[serde(default)]
    pub penalties: PenaltySection,
    #[serde(default)]
    pub solver: SolverSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskSection {
    #[serde(default = "default_confidence")]
    pub confidence_level: f64,
    #[serde(default = "default_portfolio_value")]
    pub portfolio_value: f64,
    pub max_var: Option<f64>,
    pub max_cvar: Option<f64>,
    #[serde(default)]
    pub penalty_convention: PenaltyConvention,
}

fn default_confidence() -> f64 {
    0.95
}
fn default_portfolio_value() -> f64 {
    DEFAULT_PORTFOLIO_VALUE
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            confidence_level: default_confidence(),
            portfolio_value: default_portfolio_value(),
            max_var: None,
            max_cvar: None,
            penalty_convention: PenaltyConvention::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerSection {
    #[serde(default)]
    pub method: Method,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    #[serde(default = "default_shots")]
    pub shots: usize,
    #[serde(default = "default_sweeps")]
    pub sweeps: usize,
    #[serde(default)]
    pub seed: u64,
}

fn default_risk_free_rate() -> f64 {
    0.01
}
fn default_shots() -> usize {
    DEFAULT_SHOTS
}
fn default_sweeps() -> usize {
    1000
}

impl Default for OptimizerSection {
    fn default() -> Self {
        Self {
            method: Method::default(),
            risk_free_rate: default_risk_free_rate(),
            shots: default_shots(),
            sweeps: default_sweeps(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PenaltySection {
    #[serde(default = "default_penalty")]
    pub var_weight: f64,
    #[serde(default = "default_penalty")]
    pub budget: f64,
    #[serde(default = "default_qubo_var_scale")]
    pub qubo_var_scale: f64,
    #[serde(default)]
    pub budget_encoding: BudgetEncoding,
}

fn default_penalty() -> f64 {
    1000.0
}
fn default_qubo_var_scale() -> f64 {
    100.0
}

impl Default for PenaltySection {
    fn default() -> Self {
        Self {
            var_weight: default_penalty(),
            budget: default_penalty(),
            qubo_var_scale: default_qubo_var_scale(),
            budget_encoding: BudgetEncoding::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverSection {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_initial_step")]
    pub initial_step: f64,
}

fn default_max_iterations() -> usize {
    500
}
fn default_tolerance() -> f64 {
    1e-16
}
fn default_initial_step() -> f64 {
    1.0
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            initial_step: default_initial_step(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let invalid = |e: varopt::Error| Error::Config(e.to_string());
        self.risk_config().validate().map_err(invalid)?;
        self.penalties().validate().map_err(invalid)?;
        self.solver_settings().validate().map_err(invalid)?;

        if !self.optimizer.risk_free_rate.is_finite() || self.optimizer.risk_free_rate < 0.0 {
            return Err(Error::Config("risk_free_rate must be finite and >= 0".into()));
        }
        if self.optimizer.shots == 0 {
            return Err(Error::Config("shots must be > 0".into()));
        }
        if self.optimizer.sweeps == 0 {
            return Err(Error::Config("sweeps must be > 0".into()));
        }
        Ok(())
    }

    pub fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            confidence_level: self.risk.confidence_level,
            portfolio_value: self.risk.portfolio_value,
            max_var: self.risk.max_var,
            max_cvar: self.risk.max_cvar,
            penalty_convention: self.risk.penalty_convention,
        }
    }

    pub fn penalties(&self) -> Penalties {
        Penalties {
            var_weight: self.penalties.var_weight,
            budget: self.penalties.budget,
            qubo_var_scale: self.penalties.qubo_var_scale,
            budget_encoding: self.penalties.budget_encoding,
        }
    }

    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            max_iterations: self.solver.max_iterations,
            tolerance: self.solver.tolerance,
            initial_step: self.solver.initial_step,
        }
    }

    /// Optimizer description, with `method` overriding the configured one.
    pub fn optimizer_spec(&self, method: Option<Method>) -> OptimizerSpec {
        OptimizerSpec {
            method: method.unwrap_or(self.optimizer.method),
            risk_free_rate: self.optimizer.risk_free_rate,
            penalties: self.penalties(),
            solver: self.solver_settings(),
            shots: self.optimizer.shots,
            sweeps: self.optimizer.sweeps,
            seed: self.optimizer.seed,
        }
    }
}
