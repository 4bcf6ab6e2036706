//! QUBO backends: anything that can minimize a binary quadratic form.
//!
//! The engine talks to backends only through [`QuboBackend`]. Implementations
//! shipped here:
//!
//! - [`ExhaustiveSampler`]: enumerates every bitstring (small problems, ground truth)
//! - [`AnnealingSampler`]: seeded simulated annealing, one sample per shot
//! - [`mock::MockSampler`]: scripted responses for tests
//!
//! Remote or hardware annealers implement the same trait outside this crate.

pub mod anneal;
pub mod exhaustive;
pub mod mock;

pub use anneal::AnnealingSampler;
pub use exhaustive::ExhaustiveSampler;

use crate::error::BackendError;
use crate::formulate::QuboProblem;

/// One bitstring returned by a backend, with its energy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// One entry per binary variable, `0` or `1`. May be longer than the
    /// number of assets; trailing auxiliary bits are ignored.
    pub bits: Vec<u8>,
    pub energy: f64,
}

impl Sample {
    /// Build a sample and score it against `problem`.
    pub fn scored(problem: &QuboProblem, bits: Vec<u8>) -> Self {
        let energy = problem.energy(&bits);
        Self { bits, energy }
    }
}

/// A blocking QUBO sampler.
///
/// Calls have no timeout, retry, or cancellation; callers that need them wrap
/// the backend. Implementations must be reentrant to be shared across
/// concurrent optimizations.
pub trait QuboBackend {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Draw up to `shots` samples for `problem`.
    fn sample(&self, problem: &QuboProblem, shots: usize) -> Result<Vec<Sample>, BackendError>;
}

impl<B: QuboBackend + ?Sized> QuboBackend for &B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sample(&self, problem: &QuboProblem, shots: usize) -> Result<Vec<Sample>, BackendError> {
        (**self).sample(problem, shots)
    }
}

impl<B: QuboBackend + ?Sized> QuboBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sample(&self, problem: &QuboProblem, shots: usize) -> Result<Vec<Sample>, BackendError> {
        (**self).sample(problem, shots)
    }
}
