//! Single-flip simulated annealing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{QuboBackend, Sample};
use crate::error::BackendError;
use crate::formulate::QuboProblem;

/// Classical annealer drawing one independent sample per shot.
///
/// Temperatures follow a geometric schedule from `hot · scale` down to
/// `cold · scale`, where `scale` is the largest absolute QUBO coefficient, so
/// the same settings work whatever the penalty magnitude. The RNG is seeded
/// per call: identical inputs give identical samples.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnealingSampler {
    pub sweeps: usize,
    pub hot: f64,
    pub cold: f64,
    pub seed: u64,
}

impl AnnealingSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = sweeps;
        self
    }

    fn validate(&self) -> Result<(), BackendError> {
        if self.sweeps == 0 {
            return Err(BackendError::Misconfigured("sweeps must be > 0".into()));
        }
        let ordered = self.cold > 0.0 && self.hot > self.cold;
        if !(self.hot.is_finite() && self.cold.is_finite() && ordered) {
            return Err(BackendError::Misconfigured(format!(
                "temperature range must satisfy hot > cold > 0, got {} / {}",
                self.hot, self.cold
            )));
        }
        Ok(())
    }
}

impl Default for AnnealingSampler {
    fn default() -> Self {
        Self {
            sweeps: 1000,
            hot: 1.0,
            cold: 1e-9,
            seed: 0,
        }
    }
}

/// Dense view of a QUBO for O(n) flip deltas.
struct Dense {
    /// `cᵢ + Qᵢᵢ`
    field: Vec<f64>,
    /// Symmetric off-diagonal couplings, zero diagonal.
    coupling: Vec<Vec<f64>>,
    scale: f64,
}

impl Dense {
    fn from_problem(problem: &QuboProblem) -> Self {
        let n = problem.num_variables();
        let mut field = vec![0.0; n];
        let mut coupling = vec![vec![0.0; n]; n];

        for (&i, &c) in problem.linear() {
            field[i] += c;
        }
        for (&(i, j), &q) in problem.quadratic() {
            if i == j {
                field[i] += q;
            } else {
                coupling[i][j] += q;
                coupling[j][i] += q;
            }
        }

        let scale = field
            .iter()
            .chain(coupling.iter().flatten())
            .fold(0.0_f64, |m, x| m.max(x.abs()));

        Self {
            field,
            coupling,
            scale: if scale > 0.0 { scale } else { 1.0 },
        }
    }

    /// Energy change from flipping bit `i`.
    fn flip_delta(&self, bits: &[u8], i: usize) -> f64 {
        let local: f64 = self.field[i]
            + self.coupling[i]
                .iter()
                .zip(bits)
                .map(|(q, b)| q * f64::from(*b))
                .sum::<f64>();
        if bits[i] == 0 { local } else { -local }
    }
}

impl QuboBackend for AnnealingSampler {
    fn name(&self) -> &str {
        "annealing"
    }

    fn sample(&self, problem: &QuboProblem, shots: usize) -> Result<Vec<Sample>, BackendError> {
        self.validate()?;
        if shots == 0 {
            return Err(BackendError::Misconfigured("shots must be > 0".into()));
        }

        let n = problem.num_variables();
        let dense = Dense::from_problem(problem);
        let t_hot = self.hot * dense.scale;
        let t_cold = self.cold * dense.scale;
        let cooling = if self.sweeps > 1 {
            (t_cold / t_hot).powf(1.0 / (self.sweeps - 1) as f64)
        } else {
            1.0
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut samples = Vec::with_capacity(shots);

        for _ in 0..shots {
            let mut bits: Vec<u8> = (0..n).map(|_| u8::from(rng.gen_bool(0.5))).collect();
            let mut t = t_hot;

            for _ in 0..self.sweeps {
                for i in 0..n {
                    let delta = dense.flip_delta(&bits, i);
                    if delta <= 0.0 || rng.gen_range(0.0..1.0) < (-delta / t).exp() {
                        bits[i] ^= 1;
                    }
                }
                t *= cooling;
            }

            samples.push(Sample::scored(problem, bits));
        }

        Ok(samples)
    }
}
