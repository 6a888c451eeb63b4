//! Resource tier quantization
//!
//! Serverless vendors sell a discrete set of (CPU, Memory) combinations. This
//! module holds the vendor tier tables, picks a charge type for a demand and
//! quantizes the demand up to the smallest tier that encloses it.

mod charge_type;
mod matcher;
mod table;

#[cfg(test)]
mod tests;

pub use charge_type::{
    select_charge_type, ChargeTypeSelector, PREPAID_CPU_CEILING, PREPAID_CPU_FLOOR,
    PREPAID_MIN_CPU_MEM_RATIO,
};
pub use matcher::{MatchOutcome, TierMatch, TierMatcher};
pub use table::{flatten, Aggregate, ResourceRange, TierCatalog, TierTable};

use std::sync::Arc;

use crate::error::ConfigError;

/// Matcher over the embedded vendor tier data
pub fn builtin_matcher() -> Result<TierMatcher, ConfigError> {
    Ok(TierMatcher::new(Arc::new(TierCatalog::builtin()?)))
}
