use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Uniform;
use std::time::Instant;

use crate::error::PortfolioError;
use crate::returns::{annualized_returns, infer_periods_per_year};
use crate::risk::covariance_matrix;
use crate::types::{with_metadata, ComputationOutput, Rate, ReturnSeries};
use crate::PortfolioResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for the Monte Carlo efficient-frontier search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficientFrontierInput {
    /// Asset identifiers.
    pub asset_names: Vec<String>,
    /// Annualized expected returns per asset.
    pub expected_returns: Vec<Rate>,
    /// N x N annualized covariance matrix.
    pub covariance_matrix: Vec<Vec<f64>>,
    /// Annual risk-free rate for Sharpe ratios (default 0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_free_rate: Option<Rate>,
    /// Number of random portfolios to sample (minimum 100).
    #[serde(default = "default_num_portfolios")]
    pub num_portfolios: u32,
    /// Optional seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_num_portfolios() -> u32 {
    10_000
}

/// One randomly sampled long-only, fully-invested portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSample {
    /// Non-negative weights summing to 1, aligned with the asset order.
    pub weights: Vec<f64>,
    pub expected_return: Rate,
    pub volatility: Rate,
    pub sharpe_ratio: f64,
}

/// Output of the Monte Carlo frontier search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficientFrontierOutput {
    /// Every retained sample (zero-volatility samples excluded).
    pub samples: Vec<PortfolioSample>,
    /// The maximum-Sharpe sample.
    pub optimal: PortfolioSample,
    /// Asset identifiers, in weight order.
    pub asset_names: Vec<String>,
    /// Samples excluded because their volatility was zero.
    pub num_skipped: u32,
}

/// Input for running the frontier search directly from a return series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierFromReturnsInput {
    pub returns: ReturnSeries,
    /// Annualisation cadence; inferred from the date axis when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods_per_year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_free_rate: Option<Rate>,
    #[serde(default = "default_num_portfolios")]
    pub num_portfolios: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Linear algebra helpers
// ---------------------------------------------------------------------------

fn vec_dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Quadratic form w' * Sigma * w.
fn portfolio_variance(weights: &[f64], sigma: &[Vec<f64>]) -> f64 {
    weights
        .iter()
        .zip(sigma.iter())
        .map(|(wi, row)| wi * vec_dot(row, weights))
        .sum()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &EfficientFrontierInput) -> PortfolioResult<()> {
    let n = input.asset_names.len();
    if n < 2 {
        return Err(PortfolioError::InvalidInput {
            field: "asset_names".into(),
            reason: "At least 2 assets required for a frontier search".into(),
        });
    }
    if input.expected_returns.len() != n {
        return Err(PortfolioError::InvalidInput {
            field: "expected_returns".into(),
            reason: format!("Expected {n} entries, got {}", input.expected_returns.len()),
        });
    }
    if input.covariance_matrix.len() != n
        || input.covariance_matrix.iter().any(|row| row.len() != n)
    {
        return Err(PortfolioError::InvalidInput {
            field: "covariance_matrix".into(),
            reason: format!("Must be a {n}x{n} matrix"),
        });
    }
    for i in 0..n {
        for j in 0..n {
            let v = input.covariance_matrix[i][j];
            if !v.is_finite() {
                return Err(PortfolioError::InvalidInput {
                    field: "covariance_matrix".into(),
                    reason: format!("Non-finite entry at [{i}][{j}]"),
                });
            }
            if (v - input.covariance_matrix[j][i]).abs() > 1e-9 {
                return Err(PortfolioError::InvalidInput {
                    field: "covariance_matrix".into(),
                    reason: format!("Matrix is not symmetric at [{i}][{j}]"),
                });
            }
        }
    }
    if input.expected_returns.iter().any(|r| !r.is_finite()) {
        return Err(PortfolioError::InvalidInput {
            field: "expected_returns".into(),
            reason: "Contains a non-finite value".into(),
        });
    }
    if input.num_portfolios < 100 {
        return Err(PortfolioError::InvalidInput {
            field: "num_portfolios".into(),
            reason: "Must be at least 100".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Approximate the efficient frontier with random long-only portfolios
/// and locate the maximum-Sharpe sample.
///
/// Each sample draws independent uniform [0,1) weights and normalizes
/// them to sum to 1, so every portfolio is fully invested with no short
/// positions by construction. No analytic or quadratic-programming solve
/// is performed; accuracy is bounded by `num_portfolios`. Seeded runs are
/// bit-reproducible.
pub fn simulate_efficient_frontier(
    input: &EfficientFrontierInput,
) -> PortfolioResult<ComputationOutput<EfficientFrontierOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let n = input.asset_names.len();
    let rf = input.risk_free_rate.unwrap_or(0.0);

    let unit = Uniform::new(0.0, 1.0).map_err(|e| PortfolioError::InvalidInput {
        field: "distribution".into(),
        reason: format!("Invalid Uniform parameters: {e}"),
    })?;
    let mut rng = match input.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut samples: Vec<PortfolioSample> = Vec::with_capacity(input.num_portfolios as usize);
    let mut best: Option<usize> = None;
    let mut skipped: u32 = 0;

    for _ in 0..input.num_portfolios {
        let mut weights: Vec<f64> = (0..n).map(|_| rng.sample(&unit)).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            skipped += 1;
            continue;
        }
        for w in &mut weights {
            *w /= total;
        }

        let expected_return = vec_dot(&weights, &input.expected_returns);
        let variance = portfolio_variance(&weights, &input.covariance_matrix);
        if variance < -1e-12 {
            return Err(PortfolioError::InvalidInput {
                field: "covariance_matrix".into(),
                reason: format!("Matrix is not positive semi-definite (w'Σw = {variance})"),
            });
        }
        let volatility = variance.max(0.0).sqrt();
        if volatility == 0.0 {
            // Degenerate Sharpe: excluded from optimum selection, never
            // propagated as an infinite or undefined value.
            skipped += 1;
            continue;
        }

        let sharpe_ratio = (expected_return - rf) / volatility;
        samples.push(PortfolioSample {
            weights,
            expected_return,
            volatility,
            sharpe_ratio,
        });

        let idx = samples.len() - 1;
        if best.map_or(true, |b| sharpe_ratio > samples[b].sharpe_ratio) {
            best = Some(idx);
        }
    }

    let best = match best {
        Some(idx) => idx,
        None => {
            return Err(PortfolioError::InsufficientData(
                "All sampled portfolios had zero volatility".into(),
            ))
        }
    };

    if skipped > 0 {
        warnings.push(format!(
            "{skipped} of {} samples skipped (zero portfolio volatility)",
            input.num_portfolios
        ));
    }

    let optimal = samples[best].clone();
    let output = EfficientFrontierOutput {
        optimal,
        asset_names: input.asset_names.clone(),
        num_skipped: skipped,
        samples,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo Markowitz Efficient Frontier (max-Sharpe search)",
        &serde_json::json!({
            "n_assets": n,
            "num_portfolios": input.num_portfolios,
            "risk_free_rate": rf,
            "seed": input.seed,
            "sampling": "uniform [0,1) weights normalized onto the simplex",
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Annualize mean returns and covariance from a return series, then run
/// the frontier search on them.
pub fn simulate_frontier_from_returns(
    input: &FrontierFromReturnsInput,
) -> PortfolioResult<ComputationOutput<EfficientFrontierOutput>> {
    if input.returns.is_empty() {
        return Err(PortfolioError::InsufficientData(
            "Return series is empty".into(),
        ));
    }
    let periods_per_year = match input.periods_per_year {
        Some(p) => p,
        None => infer_periods_per_year(&input.returns)?,
    };

    let frontier_input = EfficientFrontierInput {
        asset_names: input.returns.assets.clone(),
        expected_returns: annualized_returns(&input.returns, periods_per_year)?,
        covariance_matrix: covariance_matrix(&input.returns, periods_per_year)?,
        risk_free_rate: input.risk_free_rate,
        num_portfolios: input.num_portfolios,
        seed: input.seed,
    };
    simulate_efficient_frontier(&frontier_input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    fn two_asset_input() -> EfficientFrontierInput {
        EfficientFrontierInput {
            asset_names: vec!["A".into(), "B".into()],
            expected_returns: vec![0.10, 0.20],
            covariance_matrix: vec![vec![0.04, 0.01], vec![0.01, 0.09]],
            risk_free_rate: None,
            num_portfolios: 1_000,
            seed: Some(SEED),
        }
    }

    #[test]
    fn test_weights_on_the_simplex() {
        let result = simulate_efficient_frontier(&two_asset_input()).unwrap();
        for sample in &result.result.samples {
            let total: f64 = sample.weights.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "sum={total}");
            assert!(sample.weights.iter().all(|w| *w >= 0.0));
        }
    }

    #[test]
    fn test_optimal_has_max_sharpe() {
        let result = simulate_efficient_frontier(&two_asset_input()).unwrap();
        let out = &result.result;
        assert!(out
            .samples
            .iter()
            .all(|s| s.sharpe_ratio <= out.optimal.sharpe_ratio));
    }

    #[test]
    fn test_seeded_reproducibility() {
        let input = two_asset_input();
        let r1 = simulate_efficient_frontier(&input).unwrap();
        let r2 = simulate_efficient_frontier(&input).unwrap();
        assert_eq!(r1.result.samples, r2.result.samples);
        assert_eq!(r1.result.optimal, r2.result.optimal);
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut other = two_asset_input();
        other.seed = Some(7);
        let r1 = simulate_efficient_frontier(&two_asset_input()).unwrap();
        let r2 = simulate_efficient_frontier(&other).unwrap();
        assert_ne!(
            r1.result.samples[0].weights,
            r2.result.samples[0].weights
        );
    }

    #[test]
    fn test_sample_count() {
        let result = simulate_efficient_frontier(&two_asset_input()).unwrap();
        let out = &result.result;
        assert_eq!(out.samples.len() as u32 + out.num_skipped, 1_000);
    }

    #[test]
    fn test_risk_free_rate_shifts_sharpe() {
        let mut with_rf = two_asset_input();
        with_rf.risk_free_rate = Some(0.05);
        let base = simulate_efficient_frontier(&two_asset_input()).unwrap();
        let shifted = simulate_efficient_frontier(&with_rf).unwrap();
        // Same draws under the same seed, so each sample's Sharpe drops by
        // exactly rf / vol.
        let b = &base.result.samples[0];
        let s = &shifted.result.samples[0];
        assert_eq!(b.weights, s.weights);
        assert!((s.sharpe_ratio - (b.expected_return - 0.05) / b.volatility).abs() < 1e-12);
    }

    #[test]
    fn test_zero_covariance_all_skipped() {
        let input = EfficientFrontierInput {
            asset_names: vec!["A".into(), "B".into()],
            expected_returns: vec![0.10, 0.20],
            covariance_matrix: vec![vec![0.0, 0.0], vec![0.0, 0.0]],
            risk_free_rate: None,
            num_portfolios: 100,
            seed: Some(SEED),
        };
        assert!(matches!(
            simulate_efficient_frontier(&input),
            Err(PortfolioError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_single_asset_rejected() {
        let input = EfficientFrontierInput {
            asset_names: vec!["A".into()],
            expected_returns: vec![0.10],
            covariance_matrix: vec![vec![0.04]],
            risk_free_rate: None,
            num_portfolios: 1_000,
            seed: Some(SEED),
        };
        assert!(simulate_efficient_frontier(&input).is_err());
    }

    #[test]
    fn test_min_portfolios_validation() {
        let mut input = two_asset_input();
        input.num_portfolios = 50;
        assert!(simulate_efficient_frontier(&input).is_err());
    }

    #[test]
    fn test_asymmetric_covariance_rejected() {
        let mut input = two_asset_input();
        input.covariance_matrix = vec![vec![0.04, 0.02], vec![0.01, 0.09]];
        assert!(simulate_efficient_frontier(&input).is_err());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut input = two_asset_input();
        input.expected_returns = vec![0.10];
        assert!(simulate_efficient_frontier(&input).is_err());
    }
}
