//! Raw allocation → simplex weights.

use crate::error::{Error, Result};
use crate::types::Weights;

/// Divide a non-negative raw allocation through by its sum.
///
/// Fails with [`Error::InvalidAllocation`] when the allocation is empty,
/// contains a negative or non-finite entry, or sums to zero or overflows. Nothing is
/// clamped: normalization either succeeds exactly or fails.
pub fn normalize(raw: &[f64]) -> Result<Weights> {
    if raw.is_empty() {
        return Err(Error::InvalidAllocation("allocation is empty".into()));
    }
    if let Some(i) = raw.iter().position(|x| !x.is_finite() || *x < 0.0) {
        return Err(Error::InvalidAllocation(format!(
            "entry {i} is negative or non-finite: {}",
            raw[i]
        )));
    }

    let sum: f64 = raw.iter().sum();
    if !sum.is_finite() {
        return Err(Error::InvalidAllocation(format!(
            "allocation sum overflows: {sum}"
        )));
    }
    if sum <= 0.0 {
        return Err(Error::InvalidAllocation(
            "all-zero allocation has no meaningful portfolio".into(),
        ));
    }

    Ok(Weights::from_normalized(
        raw.iter().map(|x| x / sum).collect(),
    ))
}
