use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PortfolioError;
use crate::PortfolioResult;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = f64;

/// An analysis window. `start` must be strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn validate(&self) -> PortfolioResult<()> {
        if self.start >= self.end {
            return Err(PortfolioError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Close prices per asset on a shared, ascending date axis.
///
/// Missing observations are `None`; wholly-empty dates are expected to be
/// dropped by the upstream price provider, never interpolated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub dates: Vec<NaiveDate>,
    pub assets: Vec<String>,
    /// One column per asset, each the same length as `dates`.
    pub prices: Vec<Vec<Option<f64>>>,
}

impl PriceSeries {
    /// Build a validated series. Inputs deserialized from external JSON
    /// should also go through `validate` before use.
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        prices: Vec<Vec<Option<f64>>>,
    ) -> PortfolioResult<Self> {
        let series = PriceSeries {
            dates,
            assets,
            prices,
        };
        series.validate()?;
        Ok(series)
    }

    pub fn validate(&self) -> PortfolioResult<()> {
        if self.assets.is_empty() {
            return Err(PortfolioError::InvalidInput {
                field: "assets".into(),
                reason: "At least one asset is required".into(),
            });
        }
        for pair in self.dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(PortfolioError::InvalidInput {
                    field: "dates".into(),
                    reason: format!("Dates must be strictly ascending ({} >= {})", pair[0], pair[1]),
                });
            }
        }
        for (i, name) in self.assets.iter().enumerate() {
            if self.assets[..i].contains(name) {
                return Err(PortfolioError::InvalidInput {
                    field: "assets".into(),
                    reason: format!("Duplicate asset identifier '{name}'"),
                });
            }
        }
        if self.prices.len() != self.assets.len() {
            return Err(PortfolioError::InvalidInput {
                field: "prices".into(),
                reason: format!(
                    "Expected {} price columns, got {}",
                    self.assets.len(),
                    self.prices.len()
                ),
            });
        }
        for (name, column) in self.assets.iter().zip(self.prices.iter()) {
            if column.len() != self.dates.len() {
                return Err(PortfolioError::InvalidInput {
                    field: "prices".into(),
                    reason: format!(
                        "Column '{}' has {} observations, date axis has {}",
                        name,
                        column.len(),
                        self.dates.len()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Restrict the series to observations within the given window
    /// (inclusive on both ends). The range is validated first.
    pub fn restrict(&self, range: &DateRange) -> PortfolioResult<PriceSeries> {
        range.validate()?;
        self.validate()?;

        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, date)| **date >= range.start && **date <= range.end)
            .map(|(i, _)| i)
            .collect();

        Ok(PriceSeries {
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            assets: self.assets.clone(),
            prices: self
                .prices
                .iter()
                .map(|col| keep.iter().map(|&i| col[i]).collect())
                .collect(),
        })
    }

    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn num_observations(&self) -> usize {
        self.dates.len()
    }
}

/// Periodic returns per asset on a shared date axis.
///
/// One row fewer than the prices that produced it; rows with a missing
/// value for any asset have been dropped entirely. May be empty, which
/// downstream operations treat as insufficient data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub dates: Vec<NaiveDate>,
    pub assets: Vec<String>,
    /// One dense column per asset, each the same length as `dates`.
    pub returns: Vec<Vec<f64>>,
}

impl ReturnSeries {
    pub fn empty(assets: Vec<String>) -> Self {
        let columns = assets.len();
        ReturnSeries {
            dates: Vec::new(),
            assets,
            returns: vec![Vec::new(); columns],
        }
    }

    pub fn validate(&self) -> PortfolioResult<()> {
        if self.returns.len() != self.assets.len() {
            return Err(PortfolioError::InvalidInput {
                field: "returns".into(),
                reason: format!(
                    "Expected {} return columns, got {}",
                    self.assets.len(),
                    self.returns.len()
                ),
            });
        }
        for (name, column) in self.assets.iter().zip(self.returns.iter()) {
            if column.len() != self.dates.len() {
                return Err(PortfolioError::InvalidInput {
                    field: "returns".into(),
                    reason: format!(
                        "Column '{}' has {} observations, date axis has {}",
                        name,
                        column.len(),
                        self.dates.len()
                    ),
                });
            }
            if column.iter().any(|r| !r.is_finite()) {
                return Err(PortfolioError::InvalidInput {
                    field: "returns".into(),
                    reason: format!("Column '{name}' contains a non-finite value"),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn num_observations(&self) -> usize {
        self.dates.len()
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        let range = DateRange {
            start: d(2024, 6, 1),
            end: d(2024, 1, 1),
        };
        assert!(matches!(
            range.validate(),
            Err(PortfolioError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_date_range_rejects_equal() {
        let range = DateRange {
            start: d(2024, 1, 1),
            end: d(2024, 1, 1),
        };
        assert!(range.validate().is_err());
    }

    #[test]
    fn test_price_series_rejects_unsorted_dates() {
        let result = PriceSeries::new(
            vec![d(2024, 1, 2), d(2024, 1, 1)],
            vec!["PETR4.SA".into()],
            vec![vec![Some(10.0), Some(11.0)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_price_series_rejects_ragged_columns() {
        let result = PriceSeries::new(
            vec![d(2024, 1, 1), d(2024, 1, 2)],
            vec!["PETR4.SA".into()],
            vec![vec![Some(10.0)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_price_series_rejects_duplicate_assets() {
        let result = PriceSeries::new(
            vec![d(2024, 1, 1)],
            vec!["VALE3.SA".into(), "VALE3.SA".into()],
            vec![vec![Some(60.0)], vec![Some(61.0)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_restrict_window_is_inclusive() {
        let series = PriceSeries::new(
            vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)],
            vec!["A".into()],
            vec![vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]],
        )
        .unwrap();
        let window = DateRange {
            start: d(2024, 1, 2),
            end: d(2024, 1, 3),
        };
        let restricted = series.restrict(&window).unwrap();
        assert_eq!(restricted.dates, vec![d(2024, 1, 2), d(2024, 1, 3)]);
        assert_eq!(restricted.prices[0], vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_restrict_rejects_inverted_window() {
        let series = PriceSeries::new(
            vec![d(2024, 1, 1), d(2024, 1, 2)],
            vec!["A".into()],
            vec![vec![Some(1.0), Some(2.0)]],
        )
        .unwrap();
        let window = DateRange {
            start: d(2024, 1, 2),
            end: d(2024, 1, 1),
        };
        assert!(matches!(
            series.restrict(&window),
            Err(PortfolioError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_empty_return_series() {
        let series = ReturnSeries::empty(vec!["A".into(), "B".into()]);
        assert!(series.is_empty());
        assert_eq!(series.num_assets(), 2);
        assert!(series.validate().is_ok());
    }
}
