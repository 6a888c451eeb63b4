//! Error types for pricing and comparison runs
//!
//! Pricing errors are recovered per workload; configuration errors abort a run.

use thiserror::Error;

/// Failure to price a single resource vector
#[derive(Debug, Error)]
pub enum PricingError {
    /// The pricer could not produce a quote (network, auth, unsupported spec)
    #[error("pricing unavailable: {0}")]
    Unavailable(String),

    /// A cost string failed numeric parsing
    #[error("malformed cost quantity: {0:?}")]
    MalformedQuantity(String),

    /// A quote evaluated to NaN
    #[error("cost evaluated to NaN")]
    NotANumber,
}

impl PricingError {
    /// Short label used for metrics and structured logs
    pub fn reason(&self) -> &'static str {
        match self {
            PricingError::Unavailable(_) => "unavailable",
            PricingError::MalformedQuantity(_) => "malformed_quantity",
            PricingError::NotANumber => "nan",
        }
    }
}

/// Configuration defects that make a whole comparison meaningless
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no pricer configured")]
    MissingPricer,

    #[error("no cluster snapshot configured")]
    MissingSnapshot,

    #[error("time span must be greater than zero seconds")]
    InvalidTimeSpan,

    #[error("invalid tier table {table}: {reason}")]
    TierTable { table: String, reason: String },

    #[error("failed to parse tier data: {0}")]
    TierData(#[from] serde_json::Error),
}

/// Failure of a comparison run as a whole
#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A pricing worker panicked or was cancelled
    #[error("pricing worker failed: {0}")]
    Worker(String),
}
