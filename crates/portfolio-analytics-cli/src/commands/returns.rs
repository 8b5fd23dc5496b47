use clap::Args;
use serde_json::Value;
use std::str::FromStr;

use portfolio_analytics_core::returns::{analyze_returns, ReturnMethod, ReturnsAnalysisInput};

use crate::input;

/// Arguments for returns analysis
#[derive(Args)]
pub struct ReturnsArgs {
    /// Path to JSON input file ({"prices": {...}, "method": "log", ...})
    #[arg(long)]
    pub input: Option<String>,

    /// Return method: log or simple (overrides the input document)
    #[arg(long)]
    pub method: Option<String>,

    /// Annualisation cadence (overrides the input document; inferred
    /// from the date axis when absent everywhere)
    #[arg(long)]
    pub periods_per_year: Option<u32>,
}

pub fn run_returns(args: ReturnsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut analysis_input: ReturnsAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for returns analysis".into());
    };

    if let Some(ref method) = args.method {
        analysis_input.method = ReturnMethod::from_str(method)?;
    }
    if args.periods_per_year.is_some() {
        analysis_input.periods_per_year = args.periods_per_year;
    }

    let result = analyze_returns(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}
