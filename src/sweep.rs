//! Parallel allocation sweep over risk configurations.

use crate::Optimizer;
use crate::config::RiskConfig;
use crate::engine::{Allocation, allocate};
use crate::error::Result;
use crate::types::{CovarianceMatrix, ReturnVector};

/// Run one allocation per config in parallel.
///
/// Each run is independent and shares only immutable inputs, so the results
/// are identical to calling [`allocate`] sequentially. Output order matches
/// `configs`.
///
/// # Example
///
/// ```ignore
/// use varopt::{ContinuousOptimizer, RiskConfig};
/// use varopt::sweep::sweep;
///
/// // VaR ceilings from $10K to $50K
/// let configs: Vec<RiskConfig> = (1..=5)
///     .map(|k| RiskConfig::default().max_var(10_000.0 * k as f64))
///     .collect();
/// let results = sweep(&ContinuousOptimizer::new(0.01), &returns, &cov, &configs);
/// ```
#[cfg(feature = "parallel")]
pub fn sweep<O>(
    optimizer: &O,
    returns: &ReturnVector,
    covariance: &CovarianceMatrix,
    configs: &[RiskConfig],
) -> Vec<Result<Allocation>>
where
    O: Optimizer + Sync + ?Sized,
{
    use rayon::prelude::*;

    configs
        .par_iter()
        .map(|config| allocate(optimizer, returns, covariance, config))
        .collect()
}
