//! varopt-cli: command-line front end for varopt.
//!
//! Reads expected returns and a covariance matrix from a JSON file, runs the
//! optimizer selected in a TOML config (or on the command line), and prints
//! the allocation with its VaR/CVaR report.

pub mod config;
pub mod error;
pub mod input;
pub mod run;
