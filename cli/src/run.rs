//! Command implementations: optimize an input, or assess given weights.

use std::fmt;

use serde::Serialize;
use varopt::{Method, RiskMetrics, RiskReport, Weights, allocate};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::input::MarketInput;

/// One asset's share of the allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetWeight {
    pub asset: String,
    pub weight: f64,
}

/// Result of the `optimize` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeOutput {
    pub method: Method,
    pub weights: Vec<AssetWeight>,
    pub report: RiskReport,
    pub objective: f64,
    pub converged: bool,
}

impl fmt::Display for OptimizeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allocation ({})", self.method)?;
        for w in &self.weights {
            writeln!(f, "  {:<12} {:>8.4}%", w.asset, w.weight * 100.0)?;
        }
        if !self.converged {
            writeln!(f, "  (solver did not converge; best iterate shown)")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.report)
    }
}

/// Run the configured (or overridden) optimizer on `input`.
pub fn optimize(
    config: &Config,
    input: &MarketInput,
    method: Option<Method>,
) -> Result<OptimizeOutput> {
    let spec = config.optimizer_spec(method);
    let optimizer = spec.build();
    log::info!(
        "optimizing {} assets with the {} method",
        input.num_assets(),
        spec.method
    );

    let allocation = allocate(
        &*optimizer,
        &input.returns,
        &input.covariance,
        &config.risk_config(),
    )?;

    let weights = input
        .asset_names()
        .into_iter()
        .zip(allocation.weights.as_slice())
        .map(|(asset, &weight)| AssetWeight { asset, weight })
        .collect();

    Ok(OptimizeOutput {
        method: spec.method,
        weights,
        report: allocation.report,
        objective: allocation.objective,
        converged: allocation.converged,
    })
}

/// Risk report for caller-supplied weights.
///
/// Weights must already be long-only and fully invested; they are not
/// renormalized.
pub fn assess(config: &Config, input: &MarketInput, weights: Vec<f64>) -> Result<RiskReport> {
    if weights.len() != input.num_assets() {
        return Err(Error::Input(format!(
            "{} weights for {} assets",
            weights.len(),
            input.num_assets()
        )));
    }
    let weights = Weights::new(weights)?;
    let risk = config.risk_config();
    let metrics = RiskMetrics::new(&input.returns, &input.covariance, &risk)?;
    Ok(metrics.report(weights.as_slice(), config.optimizer.risk_free_rate)?)
}

/// Pretty JSON for any command output.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Output(e.to_string()))
}
