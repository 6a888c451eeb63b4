//! Cost of the cluster as it runs today

use std::collections::BTreeMap;

use super::{Coster, CosterContext};
use crate::models::{Cost, Prices, WorkloadKey};
use crate::pricer::PlatformParameter;

/// Result of a serverful costing pass
#[derive(Debug, Clone, Default)]
pub struct ServerfulCostReport {
    pub cost: Cost,
    /// Hourly price of every workload, by hosting model
    pub workload_prices: BTreeMap<WorkloadKey, Prices>,
    /// Hourly price of every node; virtual nodes price at zero
    pub node_prices: BTreeMap<String, Prices>,
}

/// Prices workloads where they run: on real nodes at their request, or
/// serverless at their quantized tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerfulCoster;

impl ServerfulCoster {
    pub fn new() -> Self {
        Self
    }
}

impl Coster for ServerfulCoster {
    type Output = ServerfulCostReport;

    fn total_cost(&self, ctx: &CosterContext) -> ServerfulCostReport {
        let hours = ctx.time_span_hours();
        let snapshot = &ctx.snapshot;
        let mut report = ServerfulCostReport::default();

        let mut serverful_cost = 0.0;
        let mut serverless_cost = 0.0;
        let mut has_serverless = false;

        for (key, spec) in &snapshot.workloads {
            let prices = if spec.serverless {
                has_serverless = true;
                let prices = ctx.settle(key, "serverful", ctx.pricer.serverless_pod_price(spec));
                serverless_cost += prices.total_price * hours;
                prices
            } else {
                let prices = ctx.settle(key, "serverful", ctx.pricer.pod_price(spec));
                serverful_cost += prices.total_price * hours;
                prices
            };
            report.workload_prices.insert(key.clone(), prices);
        }

        for (name, node) in &snapshot.nodes {
            let prices = ctx.settle_node(name, ctx.pricer.node_price(node));
            report.node_prices.insert(name.clone(), prices);
        }

        let serverful_platform = ctx
            .pricer
            .platform_price(&PlatformParameter::serverful(snapshot.real_node_count()))
            .total_price
            * hours;
        let serverless_platform = if has_serverless {
            ctx.pricer
                .platform_price(&PlatformParameter::serverless())
                .total_price
                * hours
        } else {
            0.0
        };

        report.cost = Cost {
            total_cost: serverful_cost + serverless_cost + serverful_platform + serverless_platform,
            serverful_cost,
            serverless_cost,
            serverful_platform_cost: serverful_platform,
            serverless_platform_cost: serverless_platform,
        };
        report
    }
}
