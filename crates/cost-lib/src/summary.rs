//! Cluster resource totals

use serde::{Deserialize, Serialize};

use crate::models::{CloudPodSpec, ClusterSnapshot};

/// CPU cores and memory GiB summed over a set of pods or nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTotals {
    pub cpu: f64,
    pub mem: f64,
}

impl ResourceTotals {
    fn add(&mut self, cpu: f64, mem: f64, count: u64) {
        self.cpu += cpu * count as f64;
        self.mem += mem * count as f64;
    }
}

/// Requests, limits and capacity of a cluster snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub requests_total: ResourceTotals,
    pub limits_total: ResourceTotals,
    pub serverful_requests_total: ResourceTotals,
    pub serverful_limits_total: ResourceTotals,
    pub serverless_requests_total: ResourceTotals,
    pub serverless_limits_total: ResourceTotals,
    pub real_node_capacity: ResourceTotals,
    pub virtual_node_capacity: ResourceTotals,
    /// Recommended specs of non-DaemonSet workloads, as serverless demand
    pub recommended_total: ResourceTotals,
}

impl ResourceSummary {
    pub fn from_snapshot(snapshot: &ClusterSnapshot) -> Self {
        let mut summary = Self::default();

        for spec in snapshot.workloads.values() {
            let replicas = spec.goods_num;
            summary.requests_total.add(spec.cpu, spec.mem, replicas);
            summary.limits_total.add(spec.cpu_limit, spec.mem_limit, replicas);

            let (requests, limits) = if spec.serverless {
                (
                    &mut summary.serverless_requests_total,
                    &mut summary.serverless_limits_total,
                )
            } else {
                (
                    &mut summary.serverful_requests_total,
                    &mut summary.serverful_limits_total,
                )
            };
            requests.add(spec.cpu, spec.mem, replicas);
            limits.add(spec.cpu_limit, spec.mem_limit, replicas);
        }

        for node in snapshot.nodes.values() {
            let capacity = if node.virtual_node {
                &mut summary.virtual_node_capacity
            } else {
                &mut summary.real_node_capacity
            };
            capacity.add(node.cpu, node.mem, 1);
        }

        for (key, specs) in &snapshot.recommendations {
            if key.is_daemonset() {
                continue;
            }
            add_demand(&mut summary.recommended_total, &specs.recommended);
        }

        summary
    }

    /// Labelled rows in report order
    pub fn rows(&self) -> Vec<(&'static str, ResourceTotals)> {
        vec![
            ("requestsTotal", self.requests_total),
            ("limitsTotal", self.limits_total),
            ("serverfulRequestsTotal", self.serverful_requests_total),
            ("serverfulLimitsTotal", self.serverful_limits_total),
            ("serverlessRequestsTotal", self.serverless_requests_total),
            ("serverlessLimitsTotal", self.serverless_limits_total),
            ("realNodesCapacity", self.real_node_capacity),
            ("virtualNodesCapacity", self.virtual_node_capacity),
            ("recommendedTotal", self.recommended_total),
        ]
    }
}

fn add_demand(totals: &mut ResourceTotals, spec: &CloudPodSpec) {
    let demand = spec.serverless_demand();
    totals.add(demand.cpu, demand.mem, spec.goods_num);
}
