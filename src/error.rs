//! Error types for formulation, solving, and risk assessment.

/// Errors raised at the combinatorial backend boundary.
///
/// These are surfaced unmodified to the caller; the engine never retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend misconfigured: {0}")]
    Misconfigured(String),

    #[error("backend returned no samples")]
    NoSamples,

    #[error("sample has {got} bits, expected at least {expected}")]
    ShortSample { expected: usize, got: usize },
}

/// All errors that can occur while building or solving an allocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(
        "cannot assess risk for a riskless/degenerate allocation (volatility = {volatility:e})"
    )]
    DegenerateInput { volatility: f64 },

    #[error("invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, Error>;
