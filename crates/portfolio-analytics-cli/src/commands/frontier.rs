use clap::Args;
use serde_json::Value;

use portfolio_analytics_core::frontier::{
    simulate_efficient_frontier, simulate_frontier_from_returns, EfficientFrontierInput,
    FrontierFromReturnsInput,
};

use crate::input;

/// Arguments for the Monte Carlo efficient-frontier search
#[derive(Args)]
pub struct FrontierArgs {
    /// Path to JSON input file. Either a return series document
    /// ({"returns": {...}, ...}) or precomputed annualized inputs
    /// ({"asset_names": [...], "expected_returns": [...],
    ///   "covariance_matrix": [[...]], ...})
    #[arg(long)]
    pub input: Option<String>,

    /// Number of random portfolios (overrides the input document)
    #[arg(long)]
    pub num_portfolios: Option<u32>,

    /// RNG seed for reproducible runs (overrides the input document)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Annual risk-free rate for Sharpe ratios (overrides the input document)
    #[arg(long, allow_hyphen_values = true)]
    pub risk_free_rate: Option<f64>,
}

pub fn run_frontier(args: FrontierArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document: Value = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for frontier search".into());
    };

    // A "returns" key means the caller wants annualization done here.
    let result = if document.get("returns").is_some() {
        let mut frontier_input: FrontierFromReturnsInput = serde_json::from_value(document)?;
        if let Some(n) = args.num_portfolios {
            frontier_input.num_portfolios = n;
        }
        if args.seed.is_some() {
            frontier_input.seed = args.seed;
        }
        if args.risk_free_rate.is_some() {
            frontier_input.risk_free_rate = args.risk_free_rate;
        }
        serde_json::to_value(simulate_frontier_from_returns(&frontier_input)?)?
    } else {
        let mut frontier_input: EfficientFrontierInput = serde_json::from_value(document)?;
        if let Some(n) = args.num_portfolios {
            frontier_input.num_portfolios = n;
        }
        if args.seed.is_some() {
            frontier_input.seed = args.seed;
        }
        if args.risk_free_rate.is_some() {
            frontier_input.risk_free_rate = args.risk_free_rate;
        }
        serde_json::to_value(simulate_efficient_frontier(&frontier_input)?)?
    };

    Ok(result)
}
