//! Flat hourly rate cards

use serde::{Deserialize, Serialize};

use super::ClusterLevel;
use crate::models::Architecture;

/// Per-resource hourly rates for one architecture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    pub cpu_core_hour: f64,
    pub mem_gib_hour: f64,
    #[serde(default)]
    pub gpu_unit_hour: f64,
}

impl RateCard {
    pub const fn new(cpu_core_hour: f64, mem_gib_hour: f64, gpu_unit_hour: f64) -> Self {
        Self {
            cpu_core_hour,
            mem_gib_hour,
            gpu_unit_hour,
        }
    }

    /// Quote in cents for `goods_num` replicas.
    ///
    /// The single-replica price is truncated to whole cents before it is
    /// multiplied by the replica count, matching the vendor's billing.
    pub fn quote_cents(&self, cpu: f64, mem: f64, gpu: f64, goods_num: u64) -> u64 {
        let per_replica =
            self.cpu_core_hour * cpu + self.mem_gib_hour * mem + self.gpu_unit_hour * gpu;
        ((per_replica * 100.0) as u64).saturating_mul(goods_num)
    }
}

/// Managed-cluster fee per hour for each cluster level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterLevelFees {
    pub l5: f64,
    pub l20: f64,
    pub l50: f64,
    pub l100: f64,
    pub l200: f64,
    pub l500: f64,
    pub l1000: f64,
    pub l3000: f64,
    pub l5000: f64,
}

impl Default for ClusterLevelFees {
    fn default() -> Self {
        Self {
            l5: 0.13,
            l20: 0.36,
            l50: 0.52,
            l100: 0.91,
            l200: 1.56,
            l500: 2.73,
            l1000: 4.55,
            l3000: 9.1,
            l5000: 13.65,
        }
    }
}

impl ClusterLevelFees {
    pub fn fee(&self, level: ClusterLevel) -> f64 {
        match level {
            ClusterLevel::L5 => self.l5,
            ClusterLevel::L20 => self.l20,
            ClusterLevel::L50 => self.l50,
            ClusterLevel::L100 => self.l100,
            ClusterLevel::L200 => self.l200,
            ClusterLevel::L500 => self.l500,
            ClusterLevel::L1000 => self.l1000,
            ClusterLevel::L3000 => self.l3000,
            ClusterLevel::L5000 => self.l5000,
        }
    }
}

/// Every rate a local pricer needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTable {
    pub intel: RateCard,
    pub amd: RateCard,
    pub v100: RateCard,
    pub t4: RateCard,
    pub nvidia_2080ti: RateCard,
    /// Rates for pods and nodes on real (serverful) nodes
    pub node: RateCard,
    /// Serverless control-plane fee per hour
    pub serverless_platform_hour: f64,
    pub cluster_levels: ClusterLevelFees,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            intel: RateCard::new(0.12, 0.05, 0.0),
            amd: RateCard::new(0.055, 0.032, 0.0),
            v100: RateCard::new(0.208, 0.122, 11.5),
            t4: RateCard::new(0.0868, 0.0868, 5.21),
            // no published card; billed like the default Intel card
            nvidia_2080ti: RateCard::new(0.12, 0.05, 0.0),
            node: RateCard::new(0.12, 0.05, 0.0),
            serverless_platform_hour: 0.0,
            cluster_levels: ClusterLevelFees::default(),
        }
    }
}

impl RateTable {
    pub fn card(&self, architecture: Architecture) -> &RateCard {
        match architecture {
            Architecture::Intel => &self.intel,
            Architecture::Amd => &self.amd,
            Architecture::V100 => &self.v100,
            Architecture::T4 => &self.t4,
            Architecture::Nvidia2080Ti => &self.nvidia_2080ti,
        }
    }
}
