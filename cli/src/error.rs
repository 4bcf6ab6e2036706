//! Error types for the command-line front end.

use std::path::PathBuf;

/// All errors that can occur during a CLI run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("input error: {0}")]
    Input(String),

    #[error("failed to read input file {path}: {source}")]
    InputRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse input JSON: {0}")]
    InputParse(#[from] serde_json::Error),

    #[error("failed to render output: {0}")]
    Output(String),

    #[error(transparent)]
    Optimize(#[from] varopt::Error),
}

impl Error {
    /// Process exit code: 2 when the inputs admit no assessable allocation,
    /// 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Optimize(
                varopt::Error::DegenerateInput { .. } | varopt::Error::InvalidAllocation(_),
            ) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
