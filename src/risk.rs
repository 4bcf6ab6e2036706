//! Closed-form Gaussian tail risk: VaR, CVaR, and ceiling penalties.
//!
//! Both figures are signed P&L at the tail, scaled by the portfolio value:
//!
//! ```text
//! VaR  = value · (μ − z·σ)
//! CVaR = value · (μ − φ(z)/(1 − c) · σ)
//! ```
//!
//! where `μ = Σ rᵢwᵢ`, `σ = √(wᵀΣw)`, `c` is the confidence level,
//! `z = Φ⁻¹(c)` and `φ` is the standard normal density. Since
//! `φ(z)/(1 − c) >= z` for every `c` in `(0, 1)`, `CVaR <= VaR` always.

use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::config::{PenaltyConvention, RiskConfig};
use crate::error::{Error, Result};
use crate::types::{CovarianceMatrix, ReturnVector, check_dimensions};

/// Below this portfolio volatility the allocation is treated as riskless.
pub const MIN_VOLATILITY: f64 = 1e-12;

/// Gaussian risk metrics over a fixed return vector and covariance matrix.
#[derive(Clone, Debug)]
pub struct RiskMetrics<'a> {
    returns: &'a ReturnVector,
    covariance: &'a CovarianceMatrix,
    config: &'a RiskConfig,
    /// Φ⁻¹(c)
    z: f64,
    /// φ(z) / (1 − c)
    tail_factor: f64,
}

impl<'a> RiskMetrics<'a> {
    pub fn new(
        returns: &'a ReturnVector,
        covariance: &'a CovarianceMatrix,
        config: &'a RiskConfig,
    ) -> Result<Self> {
        config.validate()?;
        check_dimensions(returns, covariance)?;

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| Error::InvalidConfig(format!("standard normal: {e}")))?;
        let c = config.confidence_level;
        let z = normal.inverse_cdf(c);
        let tail_factor = normal.pdf(z) / (1.0 - c);

        Ok(Self {
            returns,
            covariance,
            config,
            z,
            tail_factor,
        })
    }

    pub fn config(&self) -> &RiskConfig {
        self.config
    }

    /// Standard normal quantile at the confidence level.
    pub fn z_score(&self) -> f64 {
        self.z
    }

    /// Expected-shortfall multiplier `φ(z)/(1 − c)`.
    pub fn tail_factor(&self) -> f64 {
        self.tail_factor
    }

    /// Portfolio `(μ, σ)` for `weights`.
    ///
    /// Fails with [`Error::DegenerateInput`] when `σ` is below
    /// [`MIN_VOLATILITY`] or the quadratic form is not a valid variance.
    pub fn moments(&self, weights: &[f64]) -> Result<(f64, f64)> {
        self.check_len(weights)?;
        let variance = self.covariance.quad_form(weights);
        if !variance.is_finite() || variance < 0.0 {
            return Err(Error::DegenerateInput {
                volatility: variance.abs().sqrt(),
            });
        }
        let volatility = variance.sqrt();
        if volatility < MIN_VOLATILITY {
            return Err(Error::DegenerateInput { volatility });
        }
        Ok((self.returns.portfolio_return(weights), volatility))
    }

    /// Signed dollar VaR at the configured confidence level.
    pub fn var(&self, weights: &[f64]) -> Result<f64> {
        self.tail_pnl(weights, self.z)
    }

    /// Signed dollar CVaR (expected shortfall). Never above [`Self::var`].
    pub fn cvar(&self, weights: &[f64]) -> Result<f64> {
        self.tail_pnl(weights, self.tail_factor)
    }

    /// Penalty for breaching a VaR ceiling, under the configured convention.
    pub fn var_constraint_penalty(&self, weights: &[f64], max_var: f64) -> Result<f64> {
        Ok(breach_penalty(
            self.config.penalty_convention,
            self.var(weights)?,
            max_var,
        ))
    }

    /// Penalty for breaching a CVaR ceiling, under the configured convention.
    pub fn cvar_constraint_penalty(&self, weights: &[f64], max_cvar: f64) -> Result<f64> {
        Ok(breach_penalty(
            self.config.penalty_convention,
            self.cvar(weights)?,
            max_cvar,
        ))
    }

    /// Sum of the configured VaR and CVaR ceiling penalties (0 when neither is set).
    pub fn ceiling_penalty(&self, weights: &[f64]) -> Result<f64> {
        let mut total = 0.0;
        if let Some(max_var) = self.config.max_var {
            total += self.var_constraint_penalty(weights, max_var)?;
        }
        if let Some(max_cvar) = self.config.max_cvar {
            total += self.cvar_constraint_penalty(weights, max_cvar)?;
        }
        Ok(total)
    }

    /// Gradient of [`Self::ceiling_penalty`] with respect to the weights.
    ///
    /// The penalty is piecewise linear in the tail P&L; inactive pieces
    /// contribute zero.
    pub fn ceiling_penalty_gradient(&self, weights: &[f64]) -> Result<Vec<f64>> {
        let mut grad = vec![0.0; weights.len()];
        let ceilings = [
            (self.config.max_var, self.z),
            (self.config.max_cvar, self.tail_factor),
        ];
        for (ceiling, k) in ceilings {
            let Some(ceiling) = ceiling else {
                continue;
            };
            let pnl = self.tail_pnl(weights, k)?;
            if breach_penalty(self.config.penalty_convention, pnl, ceiling) == 0.0 {
                continue;
            }
            // Both conventions are `const − pnl` on their active piece.
            for (g, d) in grad.iter_mut().zip(self.tail_pnl_gradient(weights, k)?) {
                *g -= d;
            }
        }
        Ok(grad)
    }

    /// Full report for a weight vector.
    pub fn report(&self, weights: &[f64], risk_free_rate: f64) -> Result<RiskReport> {
        let (expected_return, volatility) = self.moments(weights)?;
        Ok(RiskReport {
            expected_return,
            volatility,
            sharpe: (expected_return - risk_free_rate) / volatility,
            var: self.var(weights)?,
            cvar: self.cvar(weights)?,
            confidence_level: self.config.confidence_level,
            portfolio_value: self.config.portfolio_value,
        })
    }

    /// `value · (μ − k·σ)`
    fn tail_pnl(&self, weights: &[f64], k: f64) -> Result<f64> {
        let (mu, sigma) = self.moments(weights)?;
        Ok(self.config.portfolio_value * (mu - k * sigma))
    }

    /// `value · (r − k·Σw/σ)`
    fn tail_pnl_gradient(&self, weights: &[f64], k: f64) -> Result<Vec<f64>> {
        let (_, sigma) = self.moments(weights)?;
        let sigma_w = self.covariance.mul_vec(weights);
        Ok(self
            .returns
            .as_slice()
            .iter()
            .zip(&sigma_w)
            .map(|(r, sw)| self.config.portfolio_value * (r - k * sw / sigma))
            .collect())
    }

    fn check_len(&self, weights: &[f64]) -> Result<()> {
        if weights.len() != self.returns.len() {
            return Err(Error::InvalidInput(format!(
                "{} weights for {} assets",
                weights.len(),
                self.returns.len()
            )));
        }
        Ok(())
    }
}

/// Penalty for a tail P&L figure against a ceiling.
pub fn breach_penalty(convention: PenaltyConvention, pnl: f64, ceiling: f64) -> f64 {
    match convention {
        PenaltyConvention::Legacy => {
            if pnl > ceiling {
                ceiling - pnl
            } else {
                0.0
            }
        }
        PenaltyConvention::TailLoss => (-pnl - ceiling).max(0.0),
    }
}

/// Risk summary for a single allocation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskReport {
    /// Expected portfolio return `μ`
    pub expected_return: f64,
    /// Portfolio volatility `σ`
    pub volatility: f64,
    /// `(μ − r_f) / σ`
    pub sharpe: f64,
    /// Signed dollar VaR
    pub var: f64,
    /// Signed dollar CVaR
    pub cvar: f64,
    pub confidence_level: f64,
    pub portfolio_value: f64,
}

impl std::fmt::Display for RiskReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Risk Report ({:.1}% confidence, ${:.0} notional)",
            self.confidence_level * 100.0,
            self.portfolio_value
        )?;
        writeln!(f, "  Expected return: {:>10.4}%", self.expected_return * 100.0)?;
        writeln!(f, "  Volatility:      {:>10.4}%", self.volatility * 100.0)?;
        writeln!(f, "  Sharpe:          {:>10.4}", self.sharpe)?;
        writeln!(f, "  VaR:             {:>10.2}", self.var)?;
        write!(f, "  CVaR:            {:>10.2}", self.cvar)
    }
}
