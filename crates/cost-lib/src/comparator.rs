//! End-to-end cost comparison of one cluster snapshot
//!
//! Runs the serverful, direct-serverless and recommender passes over the same
//! snapshot and pricer and bundles them with a resource summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::coster::{
    Coster, CosterContext, RecommendedCostReport, RecommenderCoster, ServerfulCostReport,
    ServerfulCoster, ServerlessCostReport, ServerlessCoster,
};
use crate::error::{CompareError, ConfigError};
use crate::models::{
    ChargeType, CloudPodSpec, ClusterSnapshot, Cost, QosClass, RecommendedCost, SizingStrategy,
    WorkloadKey, WorkloadRecommendedPrice,
};
use crate::observability::CostMetrics;
use crate::pricer::Pricer;
use crate::summary::ResourceSummary;
use crate::tier::TierMatch;

/// Default time span: one hour
pub const DEFAULT_TIME_SPAN_SECONDS: u64 = 3600;

/// Everything one comparison run produces
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub cluster_id: String,
    pub generated_at: DateTime<Utc>,
    pub time_span_seconds: u64,
    pub serverful: ServerfulCostReport,
    pub serverless: ServerlessCostReport,
    pub recommended: RecommendedCostReport,
    pub resources: ResourceSummary,
    snapshot: Arc<ClusterSnapshot>,
    tiers: BTreeMap<WorkloadKey, WorkloadTiers>,
}

/// Tiers every spec of one workload quantizes to
#[derive(Debug, Clone, Default)]
struct WorkloadTiers {
    original: Option<TierMatch>,
    strategies: BTreeMap<SizingStrategy, TierMatch>,
}

/// Per-replica requests and limits of one spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpecResources {
    pub cpu_request: f64,
    pub mem_request: f64,
    pub cpu_limit: f64,
    pub mem_limit: f64,
}

impl From<&CloudPodSpec> for SpecResources {
    fn from(spec: &CloudPodSpec) -> Self {
        Self {
            cpu_request: spec.cpu,
            mem_request: spec.mem,
            cpu_limit: spec.cpu_limit,
            mem_limit: spec.mem_limit,
        }
    }
}

/// Per-strategy row of the recommended cost summary
#[derive(Debug, Clone, Serialize)]
pub struct StrategyRow {
    pub strategy: SizingStrategy,
    pub label: &'static str,
    #[serde(flatten)]
    pub cost: RecommendedCost,
    pub savings_percent: f64,
}

/// Per-workload row of the workload distribution
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadRow {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub replicas: u64,
    pub serverless: bool,
    /// Absent for workloads known only through recommendations
    pub qos_class: Option<QosClass>,
    pub resources: Option<SpecResources>,
    /// Tier the original spec lands on when migrated
    pub serverless_tier: Option<TierMatch>,
    /// Hourly price where the workload runs today
    pub original_price: f64,
    /// Hourly price migrated as-is
    pub direct_serverless_price: Option<f64>,
    pub recommended_prices: Option<WorkloadRecommendedPrice>,
    /// Recommended hourly price of one replica
    pub recommended_per_replica: Option<f64>,
}

/// One strategy spec of a recommended workload
#[derive(Debug, Clone, Serialize)]
pub struct StrategySpecRow {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub strategy: SizingStrategy,
    pub replicas: u64,
    pub resources: SpecResources,
    pub tier: Option<TierMatch>,
    pub price: f64,
}

/// Per-node row of the node distribution
#[derive(Debug, Clone, Serialize)]
pub struct NodeRow {
    pub name: String,
    pub virtual_node: bool,
    pub instance_type: String,
    pub charge_type: Option<ChargeType>,
    pub zone: String,
    pub region: String,
    pub cpu: f64,
    pub mem: f64,
    pub gpu: f64,
    pub gpu_type: String,
    pub price: f64,
}

/// Serializable view of a [`ComparisonReport`]
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub cluster_id: String,
    pub generated_at: DateTime<Utc>,
    pub time_span_seconds: u64,
    pub original_cost: Cost,
    pub serverless_cost: Cost,
    pub recommended_cost: Vec<StrategyRow>,
    pub resources: ResourceSummary,
    pub workloads: Vec<WorkloadRow>,
    pub recommended_workloads: Vec<StrategySpecRow>,
    pub nodes: Vec<NodeRow>,
}

impl ComparisonReport {
    pub fn strategy_rows(&self) -> Vec<StrategyRow> {
        SizingStrategy::ALL
            .into_iter()
            .map(|strategy| StrategyRow {
                strategy,
                label: strategy.label(),
                cost: self.recommended.cost(strategy),
                savings_percent: self.recommended.savings_percent(strategy),
            })
            .collect()
    }

    /// One row per workload that appears in any pass, in key order
    pub fn workload_rows(&self) -> Vec<WorkloadRow> {
        let mut keys: Vec<_> = self
            .snapshot
            .workloads
            .keys()
            .chain(self.snapshot.recommendations.keys())
            .collect();
        keys.sort();
        keys.dedup();

        keys.into_iter()
            .map(|key| {
                let spec = self.snapshot.workloads.get(key);
                let recommended_specs = self.snapshot.recommendations.get(key);
                let replicas = spec
                    .or_else(|| recommended_specs.map(|r| &r.recommended))
                    .map(|s| s.goods_num)
                    .unwrap_or(1);
                let recommended_prices = self.recommended.workload_prices.get(key).copied();
                let recommended_per_replica = recommended_prices.map(|p| {
                    let goods = recommended_specs
                        .map(|r| r.recommended.goods_num)
                        .unwrap_or(replicas);
                    p.recommended.per_replica(goods)
                });

                WorkloadRow {
                    kind: key.kind.clone(),
                    namespace: key.namespace.clone(),
                    name: key.name.clone(),
                    replicas,
                    serverless: spec.map(|s| s.serverless).unwrap_or(false),
                    qos_class: spec.map(|s| s.qos_class),
                    resources: spec.map(SpecResources::from),
                    serverless_tier: self.tiers.get(key).and_then(|t| t.original),
                    original_price: self
                        .serverful
                        .workload_prices
                        .get(key)
                        .map(|p| p.total_price)
                        .unwrap_or_default(),
                    direct_serverless_price: self
                        .serverless
                        .workload_prices
                        .get(key)
                        .map(|p| p.total_price),
                    recommended_prices,
                    recommended_per_replica,
                }
            })
            .collect()
    }

    /// One row per strategy of every priced recommended workload, in key order
    pub fn strategy_spec_rows(&self) -> Vec<StrategySpecRow> {
        let mut rows = Vec::new();
        for (key, prices) in &self.recommended.workload_prices {
            let Some(specs) = self.snapshot.recommendations.get(key) else {
                continue;
            };
            let tiers = self.tiers.get(key);
            for strategy in SizingStrategy::ALL {
                let spec = specs.get(strategy);
                rows.push(StrategySpecRow {
                    kind: key.kind.clone(),
                    namespace: key.namespace.clone(),
                    name: key.name.clone(),
                    strategy,
                    replicas: spec.goods_num,
                    resources: SpecResources::from(spec),
                    tier: tiers.and_then(|t| t.strategies.get(&strategy).copied()),
                    price: prices.get(strategy).total_price,
                });
            }
        }
        rows
    }

    pub fn node_rows(&self) -> Vec<NodeRow> {
        self.snapshot
            .nodes
            .iter()
            .map(|(name, node)| NodeRow {
                name: name.clone(),
                virtual_node: node.virtual_node,
                instance_type: node.instance_type.clone(),
                charge_type: node.charge_type,
                zone: node.zone.clone(),
                region: node.region.clone(),
                cpu: node.cpu,
                mem: node.mem,
                gpu: node.gpu,
                gpu_type: node.gpu_type.clone(),
                price: self
                    .serverful
                    .node_prices
                    .get(name)
                    .map(|p| p.total_price)
                    .unwrap_or_default(),
            })
            .collect()
    }

    pub fn document(&self) -> ReportDocument {
        ReportDocument {
            cluster_id: self.cluster_id.clone(),
            generated_at: self.generated_at,
            time_span_seconds: self.time_span_seconds,
            original_cost: self.serverful.cost,
            serverless_cost: self.serverless.cost,
            recommended_cost: self.strategy_rows(),
            resources: self.resources,
            workloads: self.workload_rows(),
            recommended_workloads: self.strategy_spec_rows(),
            nodes: self.node_rows(),
        }
    }
}

/// Runs every costing pass over one snapshot
pub struct Comparator {
    ctx: CosterContext,
    workers: usize,
    metrics: CostMetrics,
}

impl Comparator {
    pub fn builder() -> ComparatorBuilder {
        ComparatorBuilder::new()
    }

    pub fn context(&self) -> &CosterContext {
        &self.ctx
    }

    /// Run every pass sequentially
    pub fn run(&self) -> ComparisonReport {
        let start = self.start();
        let recommended = RecommenderCoster::new().total_cost(&self.ctx);
        self.finish(start, recommended)
    }

    /// Run every pass, spreading the recommender over the configured workers
    pub async fn run_concurrent(&self) -> Result<ComparisonReport, CompareError> {
        let start = self.start();
        let recommended = RecommenderCoster::new()
            .total_cost_concurrent(&self.ctx, self.workers)
            .await?;
        Ok(self.finish(start, recommended))
    }

    fn start(&self) -> Instant {
        let snapshot = &self.ctx.snapshot;
        self.ctx.logger().log_comparison_started(
            snapshot.workloads.len().max(snapshot.recommendations.len()),
            snapshot.nodes.len(),
            self.ctx.time_span_seconds,
        );
        Instant::now()
    }

    fn finish(&self, start: Instant, recommended: RecommendedCostReport) -> ComparisonReport {
        let serverful = ServerfulCoster::new().total_cost(&self.ctx);
        let serverless = ServerlessCoster::new().total_cost(&self.ctx);
        let resources = ResourceSummary::from_snapshot(&self.ctx.snapshot);
        let tiers = self.quantize_workloads();

        let elapsed = start.elapsed().as_secs_f64();
        self.metrics.observe_comparison_duration(elapsed);
        self.ctx.logger().log_comparison_completed(
            elapsed,
            serverful.cost.total_cost,
            serverless.cost.total_cost,
            recommended.baseline().total_cost,
            recommended.cost(SizingStrategy::Recommended).total_cost,
        );

        ComparisonReport {
            cluster_id: self.ctx.snapshot.cluster_id.clone(),
            generated_at: Utc::now(),
            time_span_seconds: self.ctx.time_span_seconds,
            serverful,
            serverless,
            recommended,
            resources,
            snapshot: Arc::clone(&self.ctx.snapshot),
            tiers,
        }
    }

    fn quantize_workloads(&self) -> BTreeMap<WorkloadKey, WorkloadTiers> {
        let pricer = &self.ctx.pricer;
        let snapshot = &self.ctx.snapshot;
        let mut tiers: BTreeMap<WorkloadKey, WorkloadTiers> = BTreeMap::new();

        for (key, spec) in &snapshot.workloads {
            tiers.entry(key.clone()).or_default().original = pricer.serverless_tier(spec);
        }
        for (key, specs) in &snapshot.recommendations {
            let entry = tiers.entry(key.clone()).or_default();
            for strategy in SizingStrategy::ALL {
                if let Some(tier) = pricer.serverless_tier(specs.get(strategy)) {
                    entry.strategies.insert(strategy, tier);
                }
            }
        }
        tiers
    }
}

/// Builder for a [`Comparator`]
pub struct ComparatorBuilder {
    pricer: Option<Arc<dyn Pricer>>,
    snapshot: Option<Arc<ClusterSnapshot>>,
    time_span_seconds: u64,
    workers: usize,
}

impl ComparatorBuilder {
    pub fn new() -> Self {
        Self {
            pricer: None,
            snapshot: None,
            time_span_seconds: DEFAULT_TIME_SPAN_SECONDS,
            workers: 1,
        }
    }

    pub fn pricer(mut self, pricer: Arc<dyn Pricer>) -> Self {
        self.pricer = Some(pricer);
        self
    }

    pub fn snapshot(mut self, snapshot: ClusterSnapshot) -> Self {
        self.snapshot = Some(Arc::new(snapshot));
        self
    }

    pub fn time_span_seconds(mut self, seconds: u64) -> Self {
        self.time_span_seconds = seconds;
        self
    }

    /// Worker count for [`Comparator::run_concurrent`]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn build(self) -> Result<Comparator, ConfigError> {
        let pricer = self.pricer.ok_or(ConfigError::MissingPricer)?;
        let snapshot = self.snapshot.ok_or(ConfigError::MissingSnapshot)?;
        if self.time_span_seconds == 0 {
            return Err(ConfigError::InvalidTimeSpan);
        }

        info!(
            cluster_id = %snapshot.cluster_id,
            time_span_seconds = self.time_span_seconds,
            workers = self.workers,
            "Comparator configured"
        );

        Ok(Comparator {
            ctx: CosterContext::new(pricer, snapshot, self.time_span_seconds),
            workers: self.workers.max(1),
            metrics: CostMetrics::new(),
        })
    }
}

impl Default for ComparatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
