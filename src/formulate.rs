//! Problem formulation: continuous max-Sharpe objective and its QUBO counterpart.
//!
//! Both forms encode the same goal, maximize excess return per unit of
//! volatility while staying fully invested and under the optional VaR/CVaR
//! ceilings, but for different solver families:
//!
//! - **Continuous**: `f(w) = −(rᵀw − r_f)/√(wᵀΣw) + λ·penalty(w)` on the box
//!   `[0, 1]ᴺ` with `Σw = 1`.
//! - **QUBO**: `min xᵀQx + cᵀx` over `x ∈ {0,1}ᴺ`, each bit selecting one asset
//!   for full inclusion; the budget is folded in with a penalty `P`.
//!
//! The QUBO VaR deterrent is evaluated once at the equal-weight portfolio and
//! added as a flat term to every linear coefficient. It does not depend on the
//! candidate bitstring, so it shifts all selections of the same size equally
//! and cannot rank them by tail risk. Re-evaluating it per sample would need a
//! backend that supports iterative refinement.

use rustc_hash::FxHashMap;

use crate::config::{BudgetEncoding, Penalties, RiskConfig};
use crate::error::{Error, Result};
use crate::risk::RiskMetrics;
use crate::types::{CovarianceMatrix, ReturnVector, Weights, check_dimensions};

/// Builds both problem representations over borrowed inputs.
#[derive(Clone, Debug)]
pub struct ProblemFormulator<'a> {
    returns: &'a ReturnVector,
    covariance: &'a CovarianceMatrix,
    metrics: RiskMetrics<'a>,
    risk_free_rate: f64,
    penalties: Penalties,
}

impl<'a> ProblemFormulator<'a> {
    pub fn new(
        returns: &'a ReturnVector,
        covariance: &'a CovarianceMatrix,
        config: &'a RiskConfig,
        risk_free_rate: f64,
        penalties: Penalties,
    ) -> Result<Self> {
        check_dimensions(returns, covariance)?;
        if !risk_free_rate.is_finite() || risk_free_rate < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "risk_free_rate must be >= 0 and finite, got {risk_free_rate}"
            )));
        }
        penalties.validate()?;

        Ok(Self {
            returns,
            covariance,
            metrics: RiskMetrics::new(returns, covariance, config)?,
            risk_free_rate,
            penalties,
        })
    }

    /// Number of assets.
    pub fn num_assets(&self) -> usize {
        self.returns.len()
    }

    pub fn metrics(&self) -> &RiskMetrics<'a> {
        &self.metrics
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    // ------------------------------------------------------------------------
    // Continuous form
    // ------------------------------------------------------------------------

    /// Continuous objective `−Sharpe(w) + λ·penalty(w)`.
    ///
    /// Fails with [`Error::DegenerateInput`] where the volatility vanishes.
    pub fn objective(&self, w: &[f64]) -> Result<f64> {
        let (mu, sigma) = self.metrics.moments(w)?;
        let penalty = self.metrics.ceiling_penalty(w)?;
        Ok(-(mu - self.risk_free_rate) / sigma + self.penalties.var_weight * penalty)
    }

    /// Gradient of [`Self::objective`].
    pub fn gradient(&self, w: &[f64]) -> Result<Vec<f64>> {
        let (mu, sigma) = self.metrics.moments(w)?;
        let excess = mu - self.risk_free_rate;
        let sigma3 = sigma * sigma * sigma;
        let sigma_w = self.covariance.mul_vec(w);
        let penalty_grad = self.metrics.ceiling_penalty_gradient(w)?;

        Ok(self
            .returns
            .as_slice()
            .iter()
            .zip(&sigma_w)
            .zip(&penalty_grad)
            .map(|((r, sw), pg)| {
                -r / sigma + excess * sw / sigma3 + self.penalties.var_weight * pg
            })
            .collect())
    }

    // ------------------------------------------------------------------------
    // QUBO form
    // ------------------------------------------------------------------------

    /// Build the QUBO coefficients.
    pub fn qubo(&self) -> Result<QuboProblem> {
        let n = self.num_assets();
        let p = self.penalties.budget;
        let r = self.returns.as_slice();

        let mut linear = FxHashMap::default();
        let mut quadratic = FxHashMap::default();

        for (i, ri) in r.iter().enumerate() {
            linear.insert(i, -ri);
            for j in i..n {
                quadratic.insert((i, j), self.covariance.get(i, j));
            }
        }

        // Budget: P·(Σx − 1)²
        let linear_budget = match self.penalties.budget_encoding {
            BudgetEncoding::Legacy => p,
            BudgetEncoding::Expanded => -p,
        };
        for i in 0..n {
            *linear.entry(i).or_insert(0.0) += linear_budget;
            for j in (i + 1)..n {
                *quadratic.entry((i, j)).or_insert(0.0) += 2.0 * p;
            }
        }
        let (offset, auxiliary) = match self.penalties.budget_encoding {
            BudgetEncoding::Legacy => {
                linear.insert(n, -p * n as f64);
                (0.0, Some(n))
            }
            BudgetEncoding::Expanded => (p, None),
        };

        if let Some(max_var) = self.metrics.config().max_var {
            let guess = Weights::equal(n);
            let var_penalty = self
                .metrics
                .var_constraint_penalty(guess.as_slice(), max_var)?;
            if var_penalty > 0.0 {
                let bump = var_penalty * self.penalties.qubo_var_scale;
                log::debug!("QUBO VaR deterrent {bump:.4} added to {n} linear terms");
                for i in 0..n {
                    *linear.entry(i).or_insert(0.0) += bump;
                }
            }
        }

        Ok(QuboProblem {
            num_assets: n,
            linear,
            quadratic,
            penalty_weight: p,
            offset,
            auxiliary,
        })
    }
}

/// Binary quadratic program `min offset + Σ cᵢxᵢ + Σ_{i<=j} Qᵢⱼxᵢxⱼ`.
///
/// Quadratic keys are unordered pairs stored as `(min, max)`; a diagonal key
/// `(i, i)` multiplies `xᵢ² = xᵢ`.
#[derive(Clone, Debug, PartialEq)]
pub struct QuboProblem {
    num_assets: usize,
    linear: FxHashMap<usize, f64>,
    quadratic: FxHashMap<(usize, usize), f64>,
    penalty_weight: f64,
    offset: f64,
    auxiliary: Option<usize>,
}

impl QuboProblem {
    /// Number of asset variables N.
    pub fn num_assets(&self) -> usize {
        self.num_assets
    }

    /// Total binary variables, including the auxiliary budget bit if any.
    pub fn num_variables(&self) -> usize {
        self.num_assets + usize::from(self.auxiliary.is_some())
    }

    pub fn linear(&self) -> &FxHashMap<usize, f64> {
        &self.linear
    }

    pub fn quadratic(&self) -> &FxHashMap<(usize, usize), f64> {
        &self.quadratic
    }

    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight
    }

    /// Constant term from the budget expansion.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Index of the reserved budget auxiliary variable, if the encoding uses one.
    pub fn auxiliary(&self) -> Option<usize> {
        self.auxiliary
    }

    pub fn linear_coefficient(&self, i: usize) -> f64 {
        self.linear.get(&i).copied().unwrap_or(0.0)
    }

    /// Coefficient of `xᵢxⱼ`, independent of argument order.
    pub fn quadratic_coefficient(&self, i: usize, j: usize) -> f64 {
        let key = if i <= j { (i, j) } else { (j, i) };
        self.quadratic.get(&key).copied().unwrap_or(0.0)
    }

    /// Energy of a bitstring. Bits past [`Self::num_variables`] are ignored;
    /// missing bits count as 0.
    pub fn energy(&self, bits: &[u8]) -> f64 {
        let on = |i: usize| bits.get(i).is_some_and(|b| *b != 0);

        let linear: f64 = self
            .linear
            .iter()
            .filter(|(i, _)| on(**i))
            .map(|(_, c)| c)
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .filter(|((i, j), _)| on(*i) && on(*j))
            .map(|(_, q)| q)
            .sum();

        self.offset + linear + quadratic
    }

    /// Coefficients as sorted lists, ready to ship to a backend.
    pub fn payload(&self, shots: usize) -> QuboPayload {
        let mut linear: Vec<(usize, f64)> = self.linear.iter().map(|(i, c)| (*i, *c)).collect();
        linear.sort_by_key(|(i, _)| *i);

        let mut quadratic: Vec<(usize, usize, f64)> = self
            .quadratic
            .iter()
            .map(|((i, j), q)| (*i, *j, *q))
            .collect();
        quadratic.sort_by_key(|(i, j, _)| (*i, *j));

        QuboPayload {
            num_variables: self.num_variables(),
            linear,
            quadratic,
            offset: self.offset,
            shots,
        }
    }
}

/// Wire shape of a QUBO submission: `{linear, quadratic, shots}`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuboPayload {
    pub num_variables: usize,
    pub linear: Vec<(usize, f64)>,
    pub quadratic: Vec<(usize, usize, f64)>,
    pub offset: f64,
    pub shots: usize,
}

#[cfg(feature = "json")]
impl QuboPayload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
