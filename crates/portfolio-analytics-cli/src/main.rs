mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::frontier::FrontierArgs;
use commands::returns::ReturnsArgs;
use commands::risk::RiskArgs;

/// Portfolio return, risk, and efficient-frontier analytics
#[derive(Parser)]
#[command(
    name = "pfa",
    version,
    about = "Portfolio return, risk, and efficient-frontier analytics",
    long_about = "A CLI for portfolio analytics: derives log or simple returns from \
                  close-price series, computes annualized risk/return statistics with \
                  correlation and covariance matrices, and approximates the Markowitz \
                  efficient frontier with a Monte Carlo max-Sharpe search."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a return series from close prices and annualize it
    Returns(ReturnsArgs),
    /// Per-asset risk metrics plus correlation/covariance matrices
    Risk(RiskArgs),
    /// Monte Carlo efficient-frontier search for the max-Sharpe portfolio
    Frontier(FrontierArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Returns(args) => commands::returns::run_returns(args),
        Commands::Risk(args) => commands::risk::run_risk(args),
        Commands::Frontier(args) => commands::frontier::run_frontier(args),
        Commands::Version => {
            println!("pfa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
