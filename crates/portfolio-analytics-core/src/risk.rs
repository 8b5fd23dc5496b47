use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PortfolioError;
use crate::returns::{annualized_returns, cumulative_returns, infer_periods_per_year};
use crate::types::{with_metadata, ComputationOutput, Rate, ReturnSeries};
use crate::PortfolioResult;

/// Per-asset risk/return record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRiskMetrics {
    pub asset: String,
    pub annualized_return: Rate,
    pub annualized_volatility: Rate,
    pub cumulative_return: Rate,
}

fn require_observations(returns: &ReturnSeries, minimum: usize) -> PortfolioResult<()> {
    returns.validate()?;
    if returns.num_observations() < minimum {
        return Err(PortfolioError::InsufficientData(format!(
            "At least {} return observations required, got {}",
            minimum,
            returns.num_observations()
        )));
    }
    Ok(())
}

/// Sample mean of a column.
fn mean(column: &[f64]) -> f64 {
    column.iter().sum::<f64>() / column.len() as f64
}

/// Sample variance (n-1 denominator).
fn sample_variance(column: &[f64], mean: f64) -> f64 {
    let n = column.len();
    if n < 2 {
        return 0.0;
    }
    column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Sample covariance between two columns (n-1 denominator).
fn sample_covariance(x: &[f64], y: &[f64], x_mean: f64, y_mean: f64) -> f64 {
    let n = x.len();
    if n < 2 {
        return 0.0;
    }
    x.iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Per-asset annualized volatility: sample standard deviation × √periods.
pub fn volatility(returns: &ReturnSeries, periods_per_year: u32) -> PortfolioResult<Vec<Rate>> {
    require_observations(returns, 2)?;
    let scale = f64::from(periods_per_year).sqrt();
    Ok(returns
        .returns
        .iter()
        .map(|col| {
            let m = mean(col);
            sample_variance(col, m).sqrt() * scale
        })
        .collect())
}

/// Annualized pairwise covariance matrix: sample covariance × periods.
///
/// Linear time scaling under the i.i.d. returns assumption.
pub fn covariance_matrix(
    returns: &ReturnSeries,
    periods_per_year: u32,
) -> PortfolioResult<Vec<Vec<f64>>> {
    require_observations(returns, 2)?;
    let n = returns.num_assets();
    let means: Vec<f64> = returns.returns.iter().map(|col| mean(col)).collect();
    let scale = f64::from(periods_per_year);

    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let cov = sample_covariance(
                &returns.returns[i],
                &returns.returns[j],
                means[i],
                means[j],
            ) * scale;
            matrix[i][j] = cov;
            matrix[j][i] = cov;
        }
    }
    Ok(matrix)
}

/// Pearson correlation matrix. Unscaled by time (correlation is
/// scale-invariant); diagonal is exactly 1.0.
pub fn correlation_matrix(returns: &ReturnSeries) -> PortfolioResult<Vec<Vec<f64>>> {
    require_observations(returns, 2)?;
    let n = returns.num_assets();
    let means: Vec<f64> = returns.returns.iter().map(|col| mean(col)).collect();
    let std_devs: Vec<f64> = returns
        .returns
        .iter()
        .zip(means.iter())
        .map(|(col, m)| sample_variance(col, *m).sqrt())
        .collect();

    for (asset, sd) in returns.assets.iter().zip(std_devs.iter()) {
        if *sd == 0.0 {
            return Err(PortfolioError::DivisionByZero {
                context: format!("correlation for asset '{asset}' (zero return variance)"),
            });
        }
    }

    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let cov = sample_covariance(
                &returns.returns[i],
                &returns.returns[j],
                means[i],
                means[j],
            );
            let corr = cov / (std_devs[i] * std_devs[j]);
            matrix[i][j] = corr;
            matrix[j][i] = corr;
        }
    }
    Ok(matrix)
}

/// Input for a full risk analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysisInput {
    pub returns: ReturnSeries,
    /// Annualisation cadence; inferred from the date axis when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods_per_year: Option<u32>,
}

/// Output of a full risk analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysisOutput {
    /// Per-asset metrics, aligned with the input asset order.
    pub metrics: Vec<AssetRiskMetrics>,
    pub correlation_matrix: Vec<Vec<f64>>,
    pub covariance_matrix: Vec<Vec<f64>>,
    pub periods_per_year: u32,
    pub observations: usize,
}

/// Compute per-asset risk/return metrics plus correlation and covariance
/// matrices from a return series.
pub fn analyze_risk(
    input: &RiskAnalysisInput,
) -> PortfolioResult<ComputationOutput<RiskAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_observations(&input.returns, 2)?;

    let periods_per_year = match input.periods_per_year {
        Some(p) => p,
        None => infer_periods_per_year(&input.returns)?,
    };

    let observations = input.returns.num_observations();
    if observations < 30 {
        warnings.push(format!(
            "Only {observations} observations; annualized statistics will be noisy"
        ));
    }

    let annual_ret = annualized_returns(&input.returns, periods_per_year)?;
    let annual_vol = volatility(&input.returns, periods_per_year)?;
    let cumulative = cumulative_returns(&input.returns)?;

    let metrics = input
        .returns
        .assets
        .iter()
        .enumerate()
        .map(|(i, asset)| AssetRiskMetrics {
            asset: asset.clone(),
            annualized_return: annual_ret[i],
            annualized_volatility: annual_vol[i],
            cumulative_return: cumulative[i],
        })
        .collect();

    let output = RiskAnalysisOutput {
        metrics,
        correlation_matrix: correlation_matrix(&input.returns)?,
        covariance_matrix: covariance_matrix(&input.returns, periods_per_year)?,
        periods_per_year,
        observations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annualized Return/Volatility, Pearson Correlation, Covariance",
        &serde_json::json!({
            "periods_per_year": periods_per_year,
            "periods_per_year_inferred": input.periods_per_year.is_none(),
            "observations": observations,
            "volatility_definition": "sample standard deviation × sqrt(periods_per_year)",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_series() -> ReturnSeries {
        ReturnSeries {
            dates: (1..=6).map(|i| d(2024, 1, i)).collect(),
            assets: vec!["A".into(), "B".into()],
            returns: vec![
                vec![0.01, -0.02, 0.03, 0.005, -0.01, 0.02],
                vec![-0.005, 0.015, -0.01, 0.02, 0.01, -0.015],
            ],
        }
    }

    #[test]
    fn test_volatility_known_value() {
        let series = ReturnSeries {
            dates: vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)],
            assets: vec!["A".into()],
            returns: vec![vec![0.01, 0.03, 0.02]],
        };
        // Sample std of [0.01, 0.03, 0.02] is 0.01.
        let vol = volatility(&series, 252).unwrap();
        assert!((vol[0] - 0.01 * 252.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_non_negative() {
        let vol = volatility(&sample_series(), 252).unwrap();
        assert!(vol.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_volatility_empty_is_insufficient_data() {
        let empty = ReturnSeries::empty(vec!["A".into()]);
        assert!(matches!(
            volatility(&empty, 252),
            Err(PortfolioError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_covariance_diagonal_matches_variance() {
        let series = sample_series();
        let cov = covariance_matrix(&series, 252).unwrap();
        let vol = volatility(&series, 252).unwrap();
        for i in 0..2 {
            assert!((cov[i][i] - vol[i] * vol[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_covariance_scales_linearly_with_periods() {
        let series = sample_series();
        let daily = covariance_matrix(&series, 1).unwrap();
        let annual = covariance_matrix(&series, 252).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert!((annual[i][j] - daily[i][j] * 252.0).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_correlation_diagonal_is_exactly_one() {
        let corr = correlation_matrix(&sample_series()).unwrap();
        assert_eq!(corr[0][0], 1.0);
        assert_eq!(corr[1][1], 1.0);
    }

    #[test]
    fn test_correlation_symmetric_and_bounded() {
        let corr = correlation_matrix(&sample_series()).unwrap();
        assert_eq!(corr[0][1], corr[1][0]);
        assert!(corr[0][1].abs() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_correlation_perfectly_correlated_assets() {
        let series = ReturnSeries {
            dates: vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)],
            assets: vec!["A".into(), "TWICE_A".into()],
            returns: vec![vec![0.01, -0.02, 0.03], vec![0.02, -0.04, 0.06]],
        };
        let corr = correlation_matrix(&series).unwrap();
        assert!((corr[0][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_zero_variance_column_rejected() {
        let series = ReturnSeries {
            dates: vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)],
            assets: vec!["A".into(), "FLAT".into()],
            returns: vec![vec![0.01, -0.02, 0.03], vec![0.0, 0.0, 0.0]],
        };
        assert!(matches!(
            correlation_matrix(&series),
            Err(PortfolioError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_analyze_risk_envelope() {
        let input = RiskAnalysisInput {
            returns: sample_series(),
            periods_per_year: Some(252),
        };
        let result = analyze_risk(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.metrics.len(), 2);
        assert_eq!(out.metrics[0].asset, "A");
        assert_eq!(out.periods_per_year, 252);
        assert_eq!(out.correlation_matrix.len(), 2);
        // Short sample triggers the noise warning.
        assert!(result.warnings.iter().any(|w| w.contains("noisy")));
    }

    #[test]
    fn test_analyze_risk_infers_cadence() {
        let mut series = sample_series();
        // Stretch the axis to weekly spacing.
        series.dates = (0..6i64)
            .map(|i| d(2024, 1, 1) + chrono::Duration::weeks(i))
            .collect();
        let input = RiskAnalysisInput {
            returns: series,
            periods_per_year: None,
        };
        let result = analyze_risk(&input).unwrap();
        let inferred = result.result.periods_per_year;
        assert!(
            (50..=64).contains(&inferred),
            "expected weekly cadence, got {inferred}"
        );
    }

    #[test]
    fn test_analyze_risk_empty_is_insufficient_data() {
        let input = RiskAnalysisInput {
            returns: ReturnSeries::empty(vec!["A".into()]),
            periods_per_year: Some(252),
        };
        assert!(matches!(
            analyze_risk(&input),
            Err(PortfolioError::InsufficientData(_))
        ));
    }
}
