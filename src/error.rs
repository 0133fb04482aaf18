use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the advisor core.
///
/// These are programmer/input-contract errors only: a value that violates a
/// construction invariant fails immediately at the boundary. Degraded analysis
/// (gaps, outliers, thin history) is never an error; it surfaces as warnings
/// and lowered confidence on the result objects instead.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("negative consumption for {month}: {kwh} kWh")]
    NegativeKwh { month: NaiveDate, kwh: f64 },

    #[error("non-finite consumption reading for {month}")]
    NonFiniteKwh { month: NaiveDate },

    #[error("invalid rate structure: {0}")]
    InvalidRateStructure(String),

    #[error("configuration error: {0}")]
    Config(String),
}
