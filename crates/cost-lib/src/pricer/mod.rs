//! Pricing of nodes, pods and cluster platforms
//!
//! A [`Pricer`] turns resource specs into hourly [`Prices`]. Serverless pod
//! prices go through tier quantization first; serverful prices use the request
//! as written. Implementations must be callable from several workers at once.

mod local;
mod rates;

pub use local::LocalPricer;
pub use rates::{ClusterLevelFees, RateCard, RateTable};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PricingError;
use crate::models::{CloudNodeSpec, CloudPodSpec, Prices};
use crate::tier::TierMatch;

/// Prices a cluster node
pub trait NodePricer {
    fn node_price(&self, spec: &CloudNodeSpec) -> Result<Prices, PricingError>;
}

/// Prices pods under either hosting model
pub trait PodPricer {
    /// Pod running on a real node, priced at its request
    fn pod_price(&self, spec: &CloudPodSpec) -> Result<Prices, PricingError>;

    /// Pod running serverless, priced at its quantized tier
    fn serverless_pod_price(&self, spec: &CloudPodSpec) -> Result<Prices, PricingError>;

    /// Tier a serverless pod is billed at, for pricers that quantize
    fn serverless_tier(&self, _spec: &CloudPodSpec) -> Option<TierMatch> {
        None
    }
}

/// Prices the managed control plane
pub trait PlatformPricer {
    fn platform_price(&self, params: &PlatformParameter) -> Prices;
}

/// Full pricing capability set for one vendor
pub trait Pricer: NodePricer + PodPricer + PlatformPricer + Send + Sync {}

impl<T> Pricer for T where T: NodePricer + PodPricer + PlatformPricer + Send + Sync {}

/// Hosting model a platform fee is charged for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Serverless,
    Serverful,
}

/// Managed-cluster size class; each level caps the number of nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClusterLevel {
    L5,
    L20,
    L50,
    L100,
    L200,
    L500,
    L1000,
    L3000,
    L5000,
}

impl ClusterLevel {
    pub const ALL: [ClusterLevel; 9] = [
        ClusterLevel::L5,
        ClusterLevel::L20,
        ClusterLevel::L50,
        ClusterLevel::L100,
        ClusterLevel::L200,
        ClusterLevel::L500,
        ClusterLevel::L1000,
        ClusterLevel::L3000,
        ClusterLevel::L5000,
    ];

    /// Largest node count the level admits
    pub fn max_nodes(&self) -> usize {
        match self {
            ClusterLevel::L5 => 5,
            ClusterLevel::L20 => 20,
            ClusterLevel::L50 => 50,
            ClusterLevel::L100 => 100,
            ClusterLevel::L200 => 200,
            ClusterLevel::L500 => 500,
            ClusterLevel::L1000 => 1000,
            ClusterLevel::L3000 => 3000,
            ClusterLevel::L5000 => 5000,
        }
    }

    /// Smallest level admitting `nodes`; saturates at the largest level
    pub fn for_node_count(nodes: usize) -> Self {
        Self::ALL
            .into_iter()
            .find(|level| nodes <= level.max_nodes())
            .unwrap_or(ClusterLevel::L5000)
    }
}

impl fmt::Display for ClusterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.max_nodes())
    }
}

impl FromStr for ClusterLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown cluster level: {}", s))
    }
}

/// Input of a platform fee quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformParameter {
    pub platform: PlatformKind,
    /// Real node count of the cluster
    pub nodes: Option<usize>,
    pub cluster_level: Option<ClusterLevel>,
}

impl PlatformParameter {
    pub fn serverless() -> Self {
        Self {
            platform: PlatformKind::Serverless,
            nodes: None,
            cluster_level: None,
        }
    }

    pub fn serverful(nodes: usize) -> Self {
        Self {
            platform: PlatformKind::Serverful,
            nodes: Some(nodes),
            cluster_level: None,
        }
    }

    pub fn with_cluster_level(mut self, level: ClusterLevel) -> Self {
        self.cluster_level = Some(level);
        self
    }

    /// Explicit level, else the level derived from the node count
    pub fn resolved_level(&self) -> ClusterLevel {
        self.cluster_level
            .unwrap_or_else(|| ClusterLevel::for_node_count(self.nodes.unwrap_or_default()))
    }
}
