//! Validated input and output vectors.
//!
//! All three vector types are index-aligned: entry `i` of a [`ReturnVector`],
//! row/column `i` of a [`CovarianceMatrix`], and entry `i` of a [`Weights`]
//! refer to the same asset.

use crate::error::{Error, Result};

/// Tolerance on `Σw = 1` for a [`Weights`] built from outside the normalizer.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Absolute tolerance for `M[i][j] == M[j][i]`, scaled by the entry magnitude.
const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Expected return per asset. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<f64>", into = "Vec<f64>")
)]
pub struct ReturnVector(Vec<f64>);

impl ReturnVector {
    /// Build from raw expected returns. Rejects empty or non-finite input.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidInput("return vector is empty".into()));
        }
        if let Some(i) = values.iter().position(|x| !x.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "return for asset {i} is not finite: {}",
                values[i]
            )));
        }
        Ok(Self(values))
    }

    /// Number of assets.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: construction rejects empty vectors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Expected portfolio return `Σ rᵢ·wᵢ`.
    #[inline]
    pub fn portfolio_return(&self, w: &[f64]) -> f64 {
        dot(&self.0, w)
    }
}

impl TryFrom<Vec<f64>> for ReturnVector {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<ReturnVector> for Vec<f64> {
    fn from(r: ReturnVector) -> Self {
        r.0
    }
}

/// Symmetric N×N return covariance matrix with a non-negative diagonal.
///
/// Positive semi-definiteness is assumed, not checked: a matrix that is
/// symmetric but indefinite can produce a negative quadratic form, which the
/// risk layer reports as [`Error::DegenerateInput`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")
)]
pub struct CovarianceMatrix(Vec<Vec<f64>>);

impl CovarianceMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(Error::InvalidInput("covariance matrix is empty".into()));
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(Error::InvalidInput(format!(
                    "covariance row {i} has {} columns, expected {n}",
                    row.len()
                )));
            }
            if row.iter().any(|x| !x.is_finite()) {
                return Err(Error::InvalidInput(format!(
                    "covariance row {i} contains a non-finite entry"
                )));
            }
        }

        for i in 0..n {
            if rows[i][i] < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "covariance diagonal [{i}][{i}] is negative: {}",
                    rows[i][i]
                )));
            }
            for j in (i + 1)..n {
                let (a, b) = (rows[i][j], rows[j][i]);
                let scale = a.abs().max(b.abs()).max(1.0);
                if (a - b).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(Error::InvalidInput(format!(
                        "covariance is not symmetric at [{i}][{j}]: {a} != {b}"
                    )));
                }
            }
        }

        Ok(Self(rows))
    }

    /// Dimension N.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry `M[i][j]`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0[i][j]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.0
    }

    /// `Σ·w`.
    pub fn mul_vec(&self, w: &[f64]) -> Vec<f64> {
        self.0.iter().map(|row| dot(row, w)).collect()
    }

    /// Portfolio variance `wᵀ·Σ·w`.
    pub fn quad_form(&self, w: &[f64]) -> f64 {
        dot(w, &self.mul_vec(w))
    }
}

impl TryFrom<Vec<Vec<f64>>> for CovarianceMatrix {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<CovarianceMatrix> for Vec<Vec<f64>> {
    fn from(m: CovarianceMatrix) -> Self {
        m.0
    }
}

/// Check that returns and covariance describe the same number of assets.
pub fn check_dimensions(returns: &ReturnVector, covariance: &CovarianceMatrix) -> Result<usize> {
    if returns.len() != covariance.len() {
        return Err(Error::InvalidInput(format!(
            "{} returns but covariance is {}x{}",
            returns.len(),
            covariance.len(),
            covariance.len()
        )));
    }
    Ok(returns.len())
}

/// Long-only portfolio weights on the unit simplex.
///
/// Every entry is finite and `>= 0`, and the entries sum to 1 within
/// [`WEIGHT_SUM_TOLERANCE`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<f64>", into = "Vec<f64>")
)]
pub struct Weights(Vec<f64>);

impl Weights {
    /// Wrap an already-normalized vector, checking the simplex invariants.
    ///
    /// Use [`crate::normalize`] to turn a raw allocation into weights.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidAllocation("weights are empty".into()));
        }
        if let Some(i) = values.iter().position(|x| !x.is_finite() || *x < 0.0) {
            return Err(Error::InvalidAllocation(format!(
                "weight {i} is negative or non-finite: {}",
                values[i]
            )));
        }
        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::InvalidAllocation(format!(
                "weights sum to {sum}, expected 1"
            )));
        }
        Ok(Self(values))
    }

    /// Constructor for vectors the normalizer has already divided through.
    pub(crate) fn from_normalized(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// The equal-weight portfolio `1/N` per asset.
    pub fn equal(n: usize) -> Self {
        Self(equal_weights(n))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl TryFrom<Vec<f64>> for Weights {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<Weights> for Vec<f64> {
    fn from(w: Weights) -> Self {
        w.0
    }
}

impl AsRef<[f64]> for Weights {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Raw solver output, consumed immediately by [`crate::normalize`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    /// Per-asset allocation, each entry `>= 0`. Not necessarily on the simplex.
    pub raw_allocation: Vec<f64>,
    /// Objective (continuous) or energy (combinatorial) at `raw_allocation`.
    pub objective_value: f64,
    /// False when the solver stopped on its iteration limit.
    pub converged: bool,
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn equal_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cov3() -> Vec<Vec<f64>> {
        vec![
            vec![1e-4, 2e-5, 1e-5],
            vec![2e-5, 1.5e-4, 3e-5],
            vec![1e-5, 3e-5, 1.2e-4],
        ]
    }

    #[test]
    fn returns_reject_empty_and_nan() {
        assert!(ReturnVector::new(vec![]).is_err());
        assert!(ReturnVector::new(vec![0.01, f64::NAN]).is_err());
        assert_eq!(ReturnVector::new(vec![0.01, 0.02]).unwrap().len(), 2);
    }

    #[test]
    fn covariance_rejects_ragged() {
        let err = CovarianceMatrix::new(vec![vec![1e-4, 0.0], vec![0.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn covariance_rejects_asymmetric() {
        let mut rows = cov3();
        rows[0][1] = 5e-5;
        assert!(CovarianceMatrix::new(rows).is_err());
    }

    #[test]
    fn covariance_rejects_negative_diagonal() {
        assert!(CovarianceMatrix::new(vec![vec![-1e-4]]).is_err());
    }

    #[test]
    fn quad_form_matches_hand_computation() {
        let cov = CovarianceMatrix::new(cov3()).unwrap();
        let w = [0.4, 0.4, 0.2];
        // 0.16e-4 + 0.16*1.5e-4 + 0.04*1.2e-4 + 2*(0.16*2e-5 + 0.08*1e-5 + 0.08*3e-5)
        let expected = 0.16e-4 + 0.24e-4 + 0.048e-4 + 2.0 * (0.32e-5 + 0.08e-5 + 0.24e-5);
        assert!((cov.quad_form(&w) - expected).abs() < 1e-15);
    }

    #[test]
    fn dimension_mismatch() {
        let r = ReturnVector::new(vec![0.01, 0.02]).unwrap();
        let cov = CovarianceMatrix::new(cov3()).unwrap();
        assert!(check_dimensions(&r, &cov).is_err());
    }

    #[test]
    fn weights_invariants() {
        assert!(Weights::new(vec![0.5, 0.5]).is_ok());
        assert!(Weights::new(vec![0.5, 0.6]).is_err());
        assert!(Weights::new(vec![1.5, -0.5]).is_err());
        let eq = Weights::equal(4);
        assert!(eq.as_slice().iter().all(|w| (*w - 0.25).abs() < 1e-15));
    }
}
