//! Combinatorial solver: QUBO formulation handed to an injected backend.

use crate::Optimizer;
use crate::backend::{QuboBackend, Sample};
use crate::config::{Penalties, RiskConfig};
use crate::error::{BackendError, Error, Result};
use crate::formulate::ProblemFormulator;
use crate::types::{CovarianceMatrix, OptimizationResult, ReturnVector};

/// Default number of backend samples per solve.
pub const DEFAULT_SHOTS: usize = 1000;

/// Asset-selection solver over any [`QuboBackend`].
///
/// The raw allocation is the winning bitstring cast to `0.0`/`1.0` per asset;
/// [`crate::normalize`] then spreads the budget equally over the selection.
#[derive(Clone, Debug)]
pub struct CombinatorialOptimizer<B> {
    backend: B,
    shots: usize,
    risk_free_rate: f64,
    penalties: Penalties,
}

impl<B: QuboBackend> CombinatorialOptimizer<B> {
    pub fn new(backend: B, risk_free_rate: f64) -> Self {
        Self {
            backend,
            shots: DEFAULT_SHOTS,
            risk_free_rate,
            penalties: Penalties::default(),
        }
    }

    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = shots;
        self
    }

    pub fn with_penalties(mut self, penalties: Penalties) -> Self {
        self.penalties = penalties;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: QuboBackend> Optimizer for CombinatorialOptimizer<B> {
    fn name(&self) -> &'static str {
        "combinatorial"
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
        if self.shots == 0 {
            return Err(Error::InvalidConfig("shots must be > 0".into()));
        }
        let problem = ProblemFormulator::new(
            returns,
            covariance,
            config,
            self.risk_free_rate,
            self.penalties,
        )?;
        let qubo = problem.qubo()?;
        let n = qubo.num_assets();

        log::debug!(
            "submitting {}-variable QUBO to {} backend ({} shots)",
            qubo.num_variables(),
            self.backend.name(),
            self.shots
        );
        let samples = self.backend.sample(&qubo, self.shots)?;
        let best = select_best(&samples, n)?;

        let raw_allocation: Vec<f64> = best.bits[..n]
            .iter()
            .map(|b| if *b != 0 { 1.0 } else { 0.0 })
            .collect();
        log::info!(
            "{} backend selected {} of {n} assets (energy {:.6})",
            self.backend.name(),
            raw_allocation.iter().filter(|x| **x > 0.0).count(),
            best.energy
        );

        Ok(OptimizationResult {
            raw_allocation,
            objective_value: best.energy,
            converged: true,
        })
    }
}

/// Lowest-energy sample; ties go to the earliest. Samples with a non-finite
/// energy are skipped.
pub fn select_best(samples: &[Sample], num_assets: usize) -> Result<&Sample> {
    if samples.is_empty() {
        return Err(BackendError::NoSamples.into());
    }

    let mut best: Option<&Sample> = None;
    for sample in samples {
        if sample.bits.len() < num_assets {
            return Err(BackendError::ShortSample {
                expected: num_assets,
                got: sample.bits.len(),
            }
            .into());
        }
        if !sample.energy.is_finite() {
            log::debug!("skipping sample with energy {}", sample.energy);
            continue;
        }
        if best.is_none_or(|b| sample.energy < b.energy) {
            best = Some(sample);
        }
    }

    best.ok_or_else(|| {
        BackendError::Misconfigured("no sample has a finite energy".into()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ExhaustiveSampler;
    use crate::backend::mock::MockSampler;
    use crate::normalize;

    fn inputs() -> (ReturnVector, CovarianceMatrix) {
        (
            ReturnVector::new(vec![0.01, 0.02, 0.015]).unwrap(),
            CovarianceMatrix::new(vec![
                vec![1e-4, 2e-5, 1e-5],
                vec![2e-5, 1.5e-4, 3e-5],
                vec![1e-5, 3e-5, 1.2e-4],
            ])
            .unwrap(),
        )
    }

    fn sample(bits: &[u8], energy: f64) -> Sample {
        Sample {
            bits: bits.to_vec(),
            energy,
        }
    }

    #[test]
    fn selects_minimum_energy() {
        let samples = [sample(&[1, 0], -1.0), sample(&[0, 1], -2.0), sample(&[1, 1], 0.5)];
        assert_eq!(select_best(&samples, 2).unwrap().bits, vec![0, 1]);
    }

    #[test]
    fn ties_go_to_first_seen() {
        let samples = [sample(&[1, 0], -1.0), sample(&[0, 1], -1.0)];
        assert_eq!(select_best(&samples, 2).unwrap().bits, vec![1, 0]);
    }

    #[test]
    fn auxiliary_bits_ignored() {
        let samples = [sample(&[0, 1, 1, 1], -1.0)];
        let best = select_best(&samples, 2).unwrap();
        assert_eq!(&best.bits[..2], &[0, 1]);
    }

    #[test]
    fn short_sample_rejected() {
        let samples = [sample(&[1], -1.0)];
        assert!(matches!(
            select_best(&samples, 3),
            Err(Error::Backend(BackendError::ShortSample { expected: 3, got: 1 }))
        ));
    }

    #[test]
    fn empty_samples_rejected() {
        assert!(matches!(
            select_best(&[], 3),
            Err(Error::Backend(BackendError::NoSamples))
        ));
    }

    #[test]
    fn nan_energies_skipped() {
        let samples = [sample(&[1, 0], f64::NAN), sample(&[0, 1], 3.0)];
        assert_eq!(select_best(&samples, 2).unwrap().bits, vec![0, 1]);
    }

    #[test]
    fn exhaustive_backend_end_to_end() {
        let (r, cov) = inputs();
        let opt = CombinatorialOptimizer::new(ExhaustiveSampler, 0.01).with_shots(4);
        let result = opt.solve(&r, &cov, &RiskConfig::default()).unwrap();
        assert_eq!(result.raw_allocation, vec![0.0, 1.0, 0.0]);
        assert!(result.converged);
    }

    #[test]
    fn all_zero_selection_fails_normalization() {
        let (r, cov) = inputs();
        let backend = MockSampler::builder().with_sample(vec![0, 0, 0], -5.0).build();
        let result = CombinatorialOptimizer::new(backend, 0.01)
            .solve(&r, &cov, &RiskConfig::default())
            .unwrap();
        assert!(matches!(
            normalize(&result.raw_allocation),
            Err(Error::InvalidAllocation(_))
        ));
    }

    #[test]
    fn unavailable_backend_surfaces_unmodified() {
        let (r, cov) = inputs();
        let opt = CombinatorialOptimizer::new(MockSampler::unavailable("no device"), 0.01);
        let err = opt.solve(&r, &cov, &RiskConfig::default()).unwrap_err();
        assert_eq!(
            err,
            Error::Backend(BackendError::Unavailable("no device".into()))
        );
    }

    #[test]
    fn shots_forwarded_to_backend() {
        let (r, cov) = inputs();
        let backend = MockSampler::builder().with_bits(vec![1, 1, 0]).build();
        let opt = CombinatorialOptimizer::new(&backend, 0.0).with_shots(250);
        opt.solve(&r, &cov, &RiskConfig::default()).unwrap();

        let submitted = backend.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].shots, 250);
        assert_eq!(submitted[0].linear.len(), 3);
    }
}
