use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::error::PortfolioError;
use crate::types::{with_metadata, ComputationOutput, DateRange, PriceSeries, Rate, ReturnSeries};
use crate::PortfolioResult;

/// How periodic returns are derived from consecutive prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMethod {
    /// `ln(p_t / p_{t-1})`
    #[default]
    Log,
    /// `p_t / p_{t-1} - 1`
    Simple,
}

impl FromStr for ReturnMethod {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(ReturnMethod::Log),
            "simple" => Ok(ReturnMethod::Simple),
            other => Err(PortfolioError::UnknownMethod(other.into())),
        }
    }
}

/// Convert a price series into a return series.
///
/// The first row is always dropped (no prior price), and any row where
/// any asset is missing either the current or the prior price is dropped
/// row-wise. Fewer than 2 usable observations yield an empty series,
/// which downstream consumers treat as insufficient data.
pub fn compute_returns(
    prices: &PriceSeries,
    method: ReturnMethod,
) -> PortfolioResult<ReturnSeries> {
    prices.validate()?;

    let n = prices.num_observations();
    if n < 2 {
        return Ok(ReturnSeries::empty(prices.assets.clone()));
    }

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); prices.num_assets()];

    for t in 1..n {
        let complete = prices
            .prices
            .iter()
            .all(|col| col[t].is_some() && col[t - 1].is_some());
        if !complete {
            continue;
        }

        let mut row = Vec::with_capacity(prices.num_assets());
        for (name, col) in prices.assets.iter().zip(prices.prices.iter()) {
            let current = col[t].unwrap_or_default();
            let previous = col[t - 1].unwrap_or_default();
            if previous <= 0.0 || current <= 0.0 {
                return Err(PortfolioError::InvalidInput {
                    field: "prices".into(),
                    reason: format!(
                        "Non-positive price for '{}' at {} (prices must be > 0)",
                        name, prices.dates[t]
                    ),
                });
            }
            let value = match method {
                ReturnMethod::Log => (current / previous).ln(),
                ReturnMethod::Simple => current / previous - 1.0,
            };
            row.push(value);
        }

        dates.push(prices.dates[t]);
        for (col, value) in columns.iter_mut().zip(row) {
            col.push(value);
        }
    }

    Ok(ReturnSeries {
        dates,
        assets: prices.assets.clone(),
        returns: columns,
    })
}

/// Per-asset mean periodic return.
pub fn mean_returns(returns: &ReturnSeries) -> PortfolioResult<Vec<Rate>> {
    returns.validate()?;
    if returns.is_empty() {
        return Err(PortfolioError::InsufficientData(
            "Return series is empty".into(),
        ));
    }
    let n = returns.num_observations() as f64;
    Ok(returns
        .returns
        .iter()
        .map(|col| col.iter().sum::<f64>() / n)
        .collect())
}

/// Per-asset annualized return: mean periodic return × periods per year.
pub fn annualized_returns(
    returns: &ReturnSeries,
    periods_per_year: u32,
) -> PortfolioResult<Vec<Rate>> {
    let means = mean_returns(returns)?;
    Ok(means
        .into_iter()
        .map(|m| m * f64::from(periods_per_year))
        .collect())
}

/// Per-asset cumulative period return via simple compounding:
/// `prod(1 + r) - 1`.
pub fn cumulative_returns(returns: &ReturnSeries) -> PortfolioResult<Vec<Rate>> {
    returns.validate()?;
    if returns.is_empty() {
        return Err(PortfolioError::InsufficientData(
            "Return series is empty".into(),
        ));
    }
    Ok(returns
        .returns
        .iter()
        .map(|col| col.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0)
        .collect())
}

/// Infer the sampling cadence from the calendar span actually covered:
/// `max(1, round(observations / (calendar_days / 365.25)))`.
///
/// Daily data lands near 252, weekly near 52, monthly near 12, whatever
/// the upstream provider happened to deliver.
pub fn infer_periods_per_year(returns: &ReturnSeries) -> PortfolioResult<u32> {
    if returns.num_observations() < 2 {
        return Err(PortfolioError::InsufficientData(
            "At least 2 dated observations required to infer frequency".into(),
        ));
    }
    let first = returns.dates[0];
    let last = returns.dates[returns.dates.len() - 1];
    let days = (last - first).num_days();
    if days <= 0 {
        return Err(PortfolioError::InvalidInput {
            field: "dates".into(),
            reason: "Date axis spans zero calendar days".into(),
        });
    }
    let years = days as f64 / 365.25;
    let periods = (returns.num_observations() as f64 / years).round();
    Ok(periods.max(1.0) as u32)
}

/// Input for a full returns analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsAnalysisInput {
    pub prices: PriceSeries,
    /// Return computation method (default: log).
    #[serde(default)]
    pub method: ReturnMethod,
    /// Annualisation cadence; inferred from the date axis when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods_per_year: Option<u32>,
    /// Restrict the analysis to this window (inclusive) before any
    /// computation. Rejected up front if start is not before end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// Output of a full returns analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsAnalysisOutput {
    pub returns: ReturnSeries,
    /// Per-asset cumulative period return, aligned with `returns.assets`.
    pub cumulative_returns: Vec<Rate>,
    /// Per-asset annualized return, aligned with `returns.assets`.
    pub annualized_returns: Vec<Rate>,
    pub periods_per_year: u32,
    pub observations: usize,
}

/// Derive the return series from prices and annualize it.
pub fn analyze_returns(
    input: &ReturnsAnalysisInput,
) -> PortfolioResult<ComputationOutput<ReturnsAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let prices = match input.date_range {
        Some(ref range) => input.prices.restrict(range)?,
        None => input.prices.clone(),
    };

    let returns = compute_returns(&prices, input.method)?;
    if returns.is_empty() {
        return Err(PortfolioError::InsufficientData(
            "Fewer than 2 complete price observations in the requested window".into(),
        ));
    }

    let dropped = prices.num_observations() - 1 - returns.num_observations();
    if dropped > 0 {
        warnings.push(format!(
            "{dropped} row(s) dropped due to missing prices in at least one asset"
        ));
    }

    let periods_per_year = match input.periods_per_year {
        Some(p) => p,
        None => infer_periods_per_year(&returns)?,
    };

    let output = ReturnsAnalysisOutput {
        cumulative_returns: cumulative_returns(&returns)?,
        annualized_returns: annualized_returns(&returns, periods_per_year)?,
        observations: returns.num_observations(),
        periods_per_year,
        returns,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Periodic Returns (log/simple) with Annualisation",
        &serde_json::json!({
            "method": input.method,
            "periods_per_year": periods_per_year,
            "periods_per_year_inferred": input.periods_per_year.is_none(),
            "assets": input.prices.assets,
        }),
        warnings,
        elapsed,
        output,
    ))
}
