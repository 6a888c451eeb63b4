//! Cost of every sizing strategy, migrated to serverless

use std::collections::BTreeMap;
use tokio::task::JoinSet;
use tracing::debug;

use super::{Coster, CosterContext};
use crate::error::CompareError;
use crate::models::{
    RecommendedCost, SizingStrategy, WorkloadKey, WorkloadRecommendedPrice,
    WorkloadRecommendedSpecs,
};
use crate::pricer::PlatformParameter;

/// Per-strategy totals plus the per-workload prices they were summed from
#[derive(Debug, Clone, Default)]
pub struct RecommendedCostReport {
    pub costs: BTreeMap<SizingStrategy, RecommendedCost>,
    pub workload_prices: BTreeMap<WorkloadKey, WorkloadRecommendedPrice>,
    /// Platform cost shared by every strategy total
    pub platform_cost: f64,
}

impl RecommendedCostReport {
    pub fn cost(&self, strategy: SizingStrategy) -> RecommendedCost {
        self.costs.get(&strategy).copied().unwrap_or_default()
    }

    /// Migrating without resizing; baseline for savings
    pub fn baseline(&self) -> RecommendedCost {
        self.cost(SizingStrategy::Direct)
    }

    pub fn savings_percent(&self, strategy: SizingStrategy) -> f64 {
        self.cost(strategy).savings_percent(&self.baseline())
    }

    /// Strategy with the lowest total; ties go to the earlier strategy
    pub fn cheapest(&self) -> Option<(SizingStrategy, RecommendedCost)> {
        self.costs
            .iter()
            .map(|(s, c)| (*s, *c))
            .fold(None, |best, (s, c)| match best {
                Some((_, b)) if b.total_cost <= c.total_cost => best,
                _ => Some((s, c)),
            })
    }
}

/// Prices all six strategy specs of every non-DaemonSet workload
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommenderCoster;

impl RecommenderCoster {
    pub fn new() -> Self {
        Self
    }

    fn price_workload(
        ctx: &CosterContext,
        key: &WorkloadKey,
        specs: &WorkloadRecommendedSpecs,
    ) -> WorkloadRecommendedPrice {
        let mut prices = WorkloadRecommendedPrice::default();
        for strategy in SizingStrategy::ALL {
            let spec = specs.get(strategy);
            let quote = ctx.settle(key, strategy.label(), ctx.pricer.serverless_pod_price(spec));
            prices.set(strategy, quote);
        }
        prices
    }

    /// Sum per-workload prices in key order and attach the shared platform fee
    fn summarize(
        ctx: &CosterContext,
        workload_prices: BTreeMap<WorkloadKey, WorkloadRecommendedPrice>,
    ) -> RecommendedCostReport {
        let hours = ctx.time_span_hours();
        let platform_cost = ctx
            .pricer
            .platform_price(&PlatformParameter::serverless())
            .total_price
            * hours;

        let costs = SizingStrategy::ALL
            .into_iter()
            .map(|strategy| {
                let workload_cost = workload_prices
                    .values()
                    .map(|p| p.get(strategy).total_price * hours)
                    .fold(0.0, |acc, cost| acc + cost);
                (strategy, RecommendedCost::new(workload_cost, platform_cost))
            })
            .collect();

        RecommendedCostReport {
            costs,
            workload_prices,
            platform_cost,
        }
    }

    fn eligible<'a>(
        ctx: &'a CosterContext,
    ) -> impl Iterator<Item = (&'a WorkloadKey, &'a WorkloadRecommendedSpecs)> + 'a {
        ctx.snapshot
            .recommendations
            .iter()
            .filter(|(key, _)| !key.is_daemonset())
    }

    /// Same pass as [`Coster::total_cost`], spread over `workers` blocking tasks.
    ///
    /// Each worker fills its own map; maps are merged before summing so the
    /// totals equal the sequential pass exactly.
    pub async fn total_cost_concurrent(
        &self,
        ctx: &CosterContext,
        workers: usize,
    ) -> Result<RecommendedCostReport, CompareError> {
        let keys: Vec<WorkloadKey> = Self::eligible(ctx).map(|(k, _)| k.clone()).collect();
        let workers = workers.max(1);
        let chunk_size = keys.len().div_ceil(workers).max(1);

        let mut join_set = JoinSet::new();
        for chunk in keys.chunks(chunk_size) {
            let chunk = chunk.to_vec();
            let ctx = ctx.clone();
            join_set.spawn_blocking(move || {
                let mut partial = BTreeMap::new();
                for key in chunk {
                    if let Some(specs) = ctx.snapshot.recommendations.get(&key) {
                        let prices = Self::price_workload(&ctx, &key, specs);
                        partial.insert(key, prices);
                    }
                }
                partial
            });
        }

        let mut workload_prices = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            let partial = joined.map_err(|e| CompareError::Worker(e.to_string()))?;
            workload_prices.extend(partial);
        }

        debug!(
            workers = workers,
            workloads = workload_prices.len(),
            "Merged concurrent recommender results"
        );
        Ok(Self::summarize(ctx, workload_prices))
    }
}

impl Coster for RecommenderCoster {
    type Output = RecommendedCostReport;

    fn total_cost(&self, ctx: &CosterContext) -> RecommendedCostReport {
        let workload_prices = Self::eligible(ctx)
            .map(|(key, specs)| (key.clone(), Self::price_workload(ctx, key, specs)))
            .collect();
        Self::summarize(ctx, workload_prices)
    }
}
