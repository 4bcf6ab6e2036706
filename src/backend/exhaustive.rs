//! Brute-force enumeration of every bitstring.

use super::{QuboBackend, Sample};
use crate::error::BackendError;
use crate::formulate::QuboProblem;

/// Largest problem the enumerator accepts (2^20 bitstrings).
pub const MAX_EXHAUSTIVE_VARIABLES: usize = 20;

/// Scores all `2^n` bitstrings and returns the `shots` lowest, best first.
///
/// Equal energies keep enumeration order, where bit `i` of the counter is
/// variable `i`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExhaustiveSampler;

impl QuboBackend for ExhaustiveSampler {
    fn name(&self) -> &str {
        "exhaustive"
    }

    fn sample(&self, problem: &QuboProblem, shots: usize) -> Result<Vec<Sample>, BackendError> {
        let n = problem.num_variables();
        if n > MAX_EXHAUSTIVE_VARIABLES {
            return Err(BackendError::Misconfigured(format!(
                "{n} variables exceeds the exhaustive limit of {MAX_EXHAUSTIVE_VARIABLES}"
            )));
        }
        if shots == 0 {
            return Err(BackendError::Misconfigured("shots must be > 0".into()));
        }

        let mut scored: Vec<(f64, u32)> = (0..1u32 << n)
            .map(|mask| (problem.energy(&bits_of(mask, n)), mask))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(shots)
            .map(|(energy, mask)| Sample {
                bits: bits_of(mask, n),
                energy,
            })
            .collect())
    }
}

fn bits_of(mask: u32, n: usize) -> Vec<u8> {
    (0..n).map(|i| ((mask >> i) & 1) as u8).collect()
}
