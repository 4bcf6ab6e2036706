//! Mock backend for testing: a [`QuboBackend`] with scripted responses.
//!
//! Use this to exercise the combinatorial adapter without a real sampler:
//!
//! ```ignore
//! use varopt::backend::mock::MockSampler;
//!
//! let backend = MockSampler::builder()
//!     .with_sample(vec![1, 0, 1], -0.5)
//!     .with_sample(vec![0, 1, 0], -0.7)
//!     .build();
//! ```

use std::sync::Mutex;

use super::{QuboBackend, Sample};
use crate::error::BackendError;
use crate::formulate::{QuboPayload, QuboProblem};

/// What the mock returns from every call.
#[derive(Clone, Debug)]
pub enum Response {
    /// The scripted samples, verbatim.
    Samples(Vec<Sample>),
    /// Every bitstring rescored against the submitted problem.
    Rescored(Vec<Vec<u8>>),
    /// A boundary failure.
    Fail(BackendError),
}

/// Builder for [`MockSampler`].
pub struct MockSamplerBuilder {
    response: Response,
}

impl MockSamplerBuilder {
    /// Append a sample with a fixed energy.
    pub fn with_sample(mut self, bits: Vec<u8>, energy: f64) -> Self {
        match &mut self.response {
            Response::Samples(samples) => samples.push(Sample { bits, energy }),
            _ => self.response = Response::Samples(vec![Sample { bits, energy }]),
        }
        self
    }

    /// Append a bitstring whose energy is computed from the submitted problem.
    pub fn with_bits(mut self, bits: Vec<u8>) -> Self {
        match &mut self.response {
            Response::Rescored(all) => all.push(bits),
            _ => self.response = Response::Rescored(vec![bits]),
        }
        self
    }

    /// Fail every call with `error`.
    pub fn failing(mut self, error: BackendError) -> Self {
        self.response = Response::Fail(error);
        self
    }

    pub fn build(self) -> MockSampler {
        MockSampler {
            response: self.response,
            submitted: Mutex::new(Vec::new()),
        }
    }
}

/// A mock sampler that records submitted payloads and returns a scripted response.
pub struct MockSampler {
    response: Response,
    submitted: Mutex<Vec<QuboPayload>>,
}

impl MockSampler {
    pub fn builder() -> MockSamplerBuilder {
        MockSamplerBuilder {
            response: Response::Samples(Vec::new()),
        }
    }

    /// A sampler that is always unreachable.
    pub fn unavailable(msg: &str) -> Self {
        Self::builder()
            .failing(BackendError::Unavailable(msg.into()))
            .build()
    }

    /// Payloads submitted so far, in call order.
    pub fn submitted(&self) -> Vec<QuboPayload> {
        match self.submitted.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl QuboBackend for MockSampler {
    fn name(&self) -> &str {
        "mock"
    }

    fn sample(&self, problem: &QuboProblem, shots: usize) -> Result<Vec<Sample>, BackendError> {
        match self.submitted.lock() {
            Ok(mut guard) => guard.push(problem.payload(shots)),
            Err(poisoned) => poisoned.into_inner().push(problem.payload(shots)),
        }

        match &self.response {
            Response::Samples(samples) => Ok(samples.clone()),
            Response::Rescored(all) => Ok(all
                .iter()
                .map(|bits| Sample::scored(problem, bits.clone()))
                .collect()),
            Response::Fail(e) => Err(e.clone()),
        }
    }
}
