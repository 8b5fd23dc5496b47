pub mod error;
pub mod returns;
pub mod risk;
pub mod types;

#[cfg(feature = "monte_carlo")]
pub mod frontier;

pub use error::PortfolioError;
pub use types::*;

/// Standard result type for all portfolio-analytics operations
pub type PortfolioResult<T> = Result<T, PortfolioError>;
