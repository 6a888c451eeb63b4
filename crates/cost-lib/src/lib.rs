//! Serverless cost comparison library
//!
//! This crate provides the core functionality for:
//! - Quantizing resource demand onto a vendor's purchasable tiers
//! - Choosing between prepaid and postpaid billing
//! - Pricing nodes, pods and cluster platforms
//! - Aggregating cluster cost per hosting model and sizing strategy
//! - Metrics and structured logging of comparison runs

pub mod comparator;
pub mod coster;
pub mod error;
pub mod models;
pub mod observability;
pub mod pricer;
pub mod summary;
pub mod tier;

pub use comparator::{
    Comparator, ComparatorBuilder, ComparisonReport, ReportDocument, SpecResources, StrategySpecRow,
};
pub use error::{CompareError, ConfigError, PricingError};
pub use models::*;
pub use observability::{CostLogger, CostMetrics};
pub use pricer::{LocalPricer, Pricer, RateTable};
pub use summary::{ResourceSummary, ResourceTotals};
pub use tier::{TierCatalog, TierMatcher};
