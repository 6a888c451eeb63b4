//! Observability infrastructure for cost comparisons
//!
//! Provides:
//! - Prometheus metrics (pricing failures, tier outcomes, comparison latency)
//! - Structured logging of comparison events with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for whole-comparison latency (in seconds)
const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<CostMetricsInner> = OnceLock::new();

struct CostMetricsInner {
    pricing_failures: IntCounterVec,
    tier_outcomes: IntCounterVec,
    workloads_priced: IntCounter,
    comparison_duration_seconds: Histogram,
}

impl CostMetricsInner {
    fn new() -> Self {
        Self {
            pricing_failures: register_int_counter_vec!(
                "fcost_pricing_failures_total",
                "Workload pricing calls that failed and were counted as zero cost",
                &["reason"]
            )
            .expect("Failed to register pricing_failures"),

            tier_outcomes: register_int_counter_vec!(
                "fcost_tier_outcomes_total",
                "Tier quantization decisions by outcome",
                &["outcome"]
            )
            .expect("Failed to register tier_outcomes"),

            workloads_priced: register_int_counter!(
                "fcost_workloads_priced_total",
                "Workload specs priced successfully"
            )
            .expect("Failed to register workloads_priced"),

            comparison_duration_seconds: register_histogram!(
                "fcost_comparison_duration_seconds",
                "Wall time of a full cost comparison",
                DURATION_BUCKETS.to_vec()
            )
            .expect("Failed to register comparison_duration_seconds"),
        }
    }
}

/// Handle to the process-wide cost metrics
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct CostMetrics {
    _private: (),
}

impl Default for CostMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CostMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(CostMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &CostMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_pricing_failures(&self, reason: &str) {
        self.inner()
            .pricing_failures
            .with_label_values(&[reason])
            .inc();
    }

    pub fn inc_tier_outcome(&self, outcome: &str) {
        self.inner().tier_outcomes.with_label_values(&[outcome]).inc();
    }

    pub fn inc_workloads_priced(&self) {
        self.inner().workloads_priced.inc();
    }

    pub fn observe_comparison_duration(&self, duration_secs: f64) {
        self.inner().comparison_duration_seconds.observe(duration_secs);
    }

    pub fn pricing_failures(&self, reason: &str) -> u64 {
        self.inner()
            .pricing_failures
            .with_label_values(&[reason])
            .get()
    }

    pub fn workloads_priced(&self) -> u64 {
        self.inner().workloads_priced.get()
    }
}

/// Structured logger for comparison events
#[derive(Clone)]
pub struct CostLogger {
    cluster_id: String,
}

impl CostLogger {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// Log the start of a comparison run
    pub fn log_comparison_started(&self, workloads: usize, nodes: usize, time_span_seconds: u64) {
        info!(
            event = "comparison_started",
            cluster_id = %self.cluster_id,
            workloads = workloads,
            nodes = nodes,
            time_span_seconds = time_span_seconds,
            "Cost comparison started"
        );
    }

    /// Log the end of a comparison run
    pub fn log_comparison_completed(
        &self,
        duration_secs: f64,
        serverful_total: f64,
        serverless_total: f64,
        direct_total: f64,
        recommended_total: f64,
    ) {
        info!(
            event = "comparison_completed",
            cluster_id = %self.cluster_id,
            duration_secs = duration_secs,
            serverful_total = serverful_total,
            serverless_total = serverless_total,
            direct_total = direct_total,
            recommended_total = recommended_total,
            "Cost comparison completed"
        );
    }

    /// Log a workload whose price could not be computed
    pub fn log_pricing_failed(&self, workload: &str, pass: &str, reason: &str, details: &str) {
        warn!(
            event = "pricing_failed",
            cluster_id = %self.cluster_id,
            workload = %workload,
            pass = %pass,
            reason = %reason,
            details = %details,
            "Pricing failed, counting workload as zero cost"
        );
    }

    /// Log a demand that exceeded every tier of its table
    pub fn log_tier_saturated(
        &self,
        architecture: &str,
        charge_type: &str,
        demand_cpu: f64,
        demand_mem: f64,
        tier_cpu: f64,
        tier_mem: f64,
    ) {
        debug!(
            event = "tier_saturated",
            cluster_id = %self.cluster_id,
            architecture = %architecture,
            charge_type = %charge_type,
            demand_cpu = demand_cpu,
            demand_mem = demand_mem,
            tier_cpu = tier_cpu,
            tier_mem = tier_mem,
            "Demand exceeds every tier, saturated at ceiling"
        );
    }
}
