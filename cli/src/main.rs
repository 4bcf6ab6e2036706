//! CLI entry point for varopt.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use varopt::Method;
use varopt_cli::config::Config;
use varopt_cli::error::Result;
use varopt_cli::input::{MarketInput, parse_weights};
use varopt_cli::run;

#[derive(Parser)]
#[command(name = "varopt")]
#[command(about = "VaR-constrained portfolio allocation")]
#[command(version)]
struct Cli {
    /// Path to varopt.toml (library defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute an allocation and its VaR/CVaR
    Optimize {
        /// Path to input.json
        input: PathBuf,

        /// continuous, annealing, or exhaustive (overrides the config)
        #[arg(long)]
        method: Option<Method>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Report VaR/CVaR for given weights
    Risk {
        /// Path to input.json
        input: PathBuf,

        /// Comma-separated weights, e.g. 0.4,0.4,0.2
        #[arg(long)]
        weights: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn execute(config: &Config, command: Command) -> Result<String> {
    match command {
        Command::Optimize {
            input,
            method,
            json,
        } => {
            let input = MarketInput::load(&input)?;
            let out = run::optimize(config, &input, method)?;
            if json {
                run::to_json(&out)
            } else {
                Ok(out.to_string())
            }
        }
        Command::Risk {
            input,
            weights,
            json,
        } => {
            let input = MarketInput::load(&input)?;
            let report = run::assess(config, &input, parse_weights(&weights)?)?;
            if json {
                run::to_json(&report)
            } else {
                Ok(report.to_string())
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    match execute(&config, cli.command) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    }
}
