//! Cost of migrating every workload to serverless as-is

use std::collections::BTreeMap;

use super::{Coster, CosterContext};
use crate::models::{Cost, Prices, WorkloadKey};
use crate::pricer::PlatformParameter;

/// Result of a direct-migration costing pass
#[derive(Debug, Clone, Default)]
pub struct ServerlessCostReport {
    pub cost: Cost,
    pub workload_prices: BTreeMap<WorkloadKey, Prices>,
}

/// Re-prices each workload's original spec at its quantized serverless tier.
/// DaemonSets are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerlessCoster;

impl ServerlessCoster {
    pub fn new() -> Self {
        Self
    }
}

impl Coster for ServerlessCoster {
    type Output = ServerlessCostReport;

    fn total_cost(&self, ctx: &CosterContext) -> ServerlessCostReport {
        let hours = ctx.time_span_hours();
        let mut workload_prices = BTreeMap::new();
        let mut workload_cost = 0.0;

        for (key, spec) in &ctx.snapshot.workloads {
            if key.is_daemonset() {
                continue;
            }
            let prices = ctx.settle(key, "serverless", ctx.pricer.serverless_pod_price(spec));
            workload_cost += prices.total_price * hours;
            workload_prices.insert(key.clone(), prices);
        }

        let platform_cost = ctx
            .pricer
            .platform_price(&PlatformParameter::serverless())
            .total_price
            * hours;

        ServerlessCostReport {
            cost: Cost {
                total_cost: workload_cost + platform_cost,
                serverful_cost: 0.0,
                serverless_cost: workload_cost,
                serverful_platform_cost: 0.0,
                serverless_platform_cost: platform_cost,
            },
            workload_prices,
        }
    }
}
