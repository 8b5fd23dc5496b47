use clap::Args;
use serde_json::Value;

use portfolio_analytics_core::risk::{analyze_risk, RiskAnalysisInput};

use crate::input;

/// Arguments for risk analysis
#[derive(Args)]
pub struct RiskArgs {
    /// Path to JSON input file ({"returns": {...}, "periods_per_year": 252})
    #[arg(long)]
    pub input: Option<String>,

    /// Annualisation cadence (overrides the input document; inferred
    /// from the date axis when absent everywhere)
    #[arg(long)]
    pub periods_per_year: Option<u32>,
}

pub fn run_risk(args: RiskArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut analysis_input: RiskAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for risk analysis".into());
    };

    if args.periods_per_year.is_some() {
        analysis_input.periods_per_year = args.periods_per_year;
    }

    let result = analyze_risk(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}
