//! Cluster-wide cost aggregation
//!
//! Each coster walks a [`ClusterSnapshot`] through a [`Pricer`] and sums hourly
//! prices over the configured time span. A workload whose price cannot be
//! computed contributes zero and the pass continues.

mod recommender;
mod serverful;
mod serverless;


pub use recommender::{RecommendedCostReport, RecommenderCoster};
pub use serverful::{ServerfulCostReport, ServerfulCoster};
pub use serverless::{ServerlessCostReport, ServerlessCoster};

use std::fmt;
use std::sync::Arc;

use crate::error::PricingError;
use crate::models::{ClusterSnapshot, Prices, WorkloadKey};
use crate::observability::{CostLogger, CostMetrics};
use crate::pricer::Pricer;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Shared inputs of every costing pass
#[derive(Clone)]
pub struct CosterContext {
    pub pricer: Arc<dyn Pricer>,
    pub snapshot: Arc<ClusterSnapshot>,
    pub time_span_seconds: u64,
    metrics: CostMetrics,
    logger: CostLogger,
}

impl CosterContext {
    pub fn new(pricer: Arc<dyn Pricer>, snapshot: Arc<ClusterSnapshot>, time_span_seconds: u64) -> Self {
        let logger = CostLogger::new(snapshot.cluster_id.clone());
        Self {
            pricer,
            snapshot,
            time_span_seconds,
            metrics: CostMetrics::new(),
            logger,
        }
    }

    pub fn time_span_hours(&self) -> f64 {
        self.time_span_seconds as f64 / SECONDS_PER_HOUR
    }

    pub fn logger(&self) -> &CostLogger {
        &self.logger
    }

    /// Resolve one workload price, recovering failures as a zero price
    pub(crate) fn settle(
        &self,
        key: &WorkloadKey,
        pass: &str,
        result: Result<Prices, PricingError>,
    ) -> Prices {
        match self.recover(key, pass, result) {
            Some(prices) => {
                self.metrics.inc_workloads_priced();
                prices
            }
            None => Prices::zero(),
        }
    }

    /// Resolve one node price, recovering failures as a zero price
    pub(crate) fn settle_node(&self, name: &str, result: Result<Prices, PricingError>) -> Prices {
        self.recover(&name, "node", result).unwrap_or_default()
    }

    fn recover(
        &self,
        subject: &dyn fmt::Display,
        pass: &str,
        result: Result<Prices, PricingError>,
    ) -> Option<Prices> {
        let outcome = result.and_then(|prices| {
            if prices.total_price.is_nan() {
                Err(PricingError::NotANumber)
            } else {
                Ok(prices)
            }
        });

        match outcome {
            Ok(prices) => Some(prices),
            Err(e) => {
                self.metrics.inc_pricing_failures(e.reason());
                self.logger
                    .log_pricing_failed(&subject.to_string(), pass, e.reason(), &e.to_string());
                None
            }
        }
    }
}

/// A costing strategy over a cluster snapshot
pub trait Coster {
    type Output;

    fn total_cost(&self, ctx: &CosterContext) -> Self::Output;
}
