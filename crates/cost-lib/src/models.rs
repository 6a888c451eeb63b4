//! Core data models for the cost comparator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PricingError;

/// Raw, continuous resource demand of one pod replica
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceVector {
    /// CPU in cores
    pub cpu: f64,
    /// Memory in GiB
    pub mem: f64,
    /// GPU units
    #[serde(default)]
    pub gpu: f64,
}

impl ResourceVector {
    pub fn new(cpu: f64, mem: f64) -> Self {
        Self { cpu, mem, gpu: 0.0 }
    }

    pub fn with_gpu(mut self, gpu: f64) -> Self {
        self.gpu = gpu;
        self
    }

    /// True when neither CPU nor memory was specified
    pub fn is_unspecified(&self) -> bool {
        self.cpu <= 0.0 && self.mem <= 0.0
    }

    /// Element-wise maximum of two vectors; NaN in either operand stays NaN
    pub fn max(self, other: Self) -> Self {
        Self {
            cpu: nan_max(self.cpu, other.cpu),
            mem: nan_max(self.mem, other.mem),
            gpu: nan_max(self.gpu, other.gpu),
        }
    }

    /// Derive the pod-level ask from container requirements.
    ///
    /// For each container group the ask is `max(sum of requests, max of limits)`
    /// per resource; the pod ask is the element-wise max of the init-container
    /// group and the app-container group.
    pub fn from_containers(
        init_containers: &[ContainerResources],
        containers: &[ContainerResources],
    ) -> Self {
        let init = Self::from_container_group(init_containers);
        let app = Self::from_container_group(containers);
        init.max(app)
    }

    fn from_container_group(containers: &[ContainerResources]) -> Self {
        let mut request_sum = ResourceVector::default();
        let mut limit_max = ResourceVector::default();
        for c in containers {
            request_sum.cpu += c.cpu_request;
            request_sum.mem += c.mem_request;
            request_sum.gpu += c.gpu;
            limit_max = limit_max.max(ResourceVector {
                cpu: c.cpu_limit,
                mem: c.mem_limit,
                gpu: c.gpu,
            });
        }
        request_sum.max(limit_max)
    }
}

/// `f64::max` drops a NaN operand; pricing must see it
fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Requests and limits of a single container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerResources {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpu_request: f64,
    #[serde(default)]
    pub mem_request: f64,
    #[serde(default)]
    pub cpu_limit: f64,
    #[serde(default)]
    pub mem_limit: f64,
    #[serde(default)]
    pub gpu: f64,
}

/// Billing model for a serverless pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    /// Monthly or yearly subscription
    #[serde(alias = "PREPAID")]
    Prepaid,
    /// Billed by the hour
    #[serde(alias = "POSTPAID_BY_HOUR", alias = "postpaid")]
    PostpaidByHour,
}

impl ChargeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeType::Prepaid => "PREPAID",
            ChargeType::PostpaidByHour => "POSTPAID_BY_HOUR",
        }
    }
}

impl fmt::Display for ChargeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "prepaid" => Ok(ChargeType::Prepaid),
            "postpaid" | "postpaid_by_hour" => Ok(ChargeType::PostpaidByHour),
            other => Err(format!("unknown charge type: {}", other)),
        }
    }
}

/// CPU architecture or GPU model a serverless pod is scheduled on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[default]
    Intel,
    Amd,
    #[serde(alias = "V100")]
    V100,
    #[serde(alias = "T4", alias = "1/4*T4", alias = "1/2*T4")]
    T4,
    #[serde(rename = "nvidia_2080ti", alias = "2080TI")]
    Nvidia2080Ti,
}

impl Architecture {
    pub const ALL: [Architecture; 5] = [
        Architecture::Intel,
        Architecture::Amd,
        Architecture::V100,
        Architecture::T4,
        Architecture::Nvidia2080Ti,
    ];

    pub fn is_gpu(&self) -> bool {
        matches!(
            self,
            Architecture::V100 | Architecture::T4 | Architecture::Nvidia2080Ti
        )
    }

    /// Resolve the vendor's annotation value, falling back to Intel
    pub fn from_annotation(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Intel => "intel",
            Architecture::Amd => "amd",
            Architecture::V100 => "V100",
            Architecture::T4 => "T4",
            Architecture::Nvidia2080Ti => "2080TI",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "intel" => Ok(Architecture::Intel),
            "amd" => Ok(Architecture::Amd),
            "v100" => Ok(Architecture::V100),
            // fractional T4 slices share the T4 table and rate card
            "t4" | "1/4*t4" | "1/2*t4" => Ok(Architecture::T4),
            "2080ti" | "nvidia_2080ti" | "nvidia-2080ti" => Ok(Architecture::Nvidia2080Ti),
            other => Err(format!("unknown architecture: {}", other)),
        }
    }
}

/// Kubernetes QoS class of a pod
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QosClass {
    Guaranteed,
    Burstable,
    #[default]
    BestEffort,
}

impl QosClass {
    /// Class Kubernetes assigns to a pod with these app containers
    pub fn from_containers(containers: &[ContainerResources]) -> Self {
        let unset = |c: &ContainerResources| {
            c.cpu_request <= 0.0 && c.mem_request <= 0.0 && c.cpu_limit <= 0.0 && c.mem_limit <= 0.0
        };
        if containers.iter().all(unset) {
            return QosClass::BestEffort;
        }
        let pinned = |c: &ContainerResources| {
            c.cpu_limit > 0.0
                && c.mem_limit > 0.0
                && (c.cpu_request <= 0.0 || c.cpu_request == c.cpu_limit)
                && (c.mem_request <= 0.0 || c.mem_request == c.mem_limit)
        };
        if containers.iter().all(pinned) {
            QosClass::Guaranteed
        } else {
            QosClass::Burstable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QosClass::Guaranteed => "Guaranteed",
            QosClass::Burstable => "Burstable",
            QosClass::BestEffort => "BestEffort",
        }
    }
}

impl fmt::Display for QosClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workload- or pod-level resource ask as seen by the pricer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudPodSpec {
    /// CPU request in cores
    #[serde(default)]
    pub cpu: f64,
    /// Memory request in GiB
    #[serde(default)]
    pub mem: f64,
    #[serde(default)]
    pub cpu_limit: f64,
    #[serde(default)]
    pub mem_limit: f64,
    #[serde(default)]
    pub gpu: f64,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub machine_arch: Architecture,
    /// Requested charge type; when `charge_type_forced` is false this is only a hint
    #[serde(default)]
    pub charge_type: Option<ChargeType>,
    #[serde(default)]
    pub charge_type_forced: bool,
    /// Time span in seconds the spec is priced over
    #[serde(default)]
    pub time_span: u64,
    /// Replica count; 1 for a bare pod
    #[serde(default = "default_goods_num")]
    pub goods_num: u64,
    #[serde(default)]
    pub serverless: bool,
    #[serde(default)]
    pub qos_class: QosClass,
}

fn default_goods_num() -> u64 {
    1
}

impl Default for CloudPodSpec {
    fn default() -> Self {
        Self {
            cpu: 0.0,
            mem: 0.0,
            cpu_limit: 0.0,
            mem_limit: 0.0,
            gpu: 0.0,
            zone: String::new(),
            machine_arch: Architecture::Intel,
            charge_type: None,
            charge_type_forced: false,
            time_span: 0,
            goods_num: 1,
            serverless: false,
            qos_class: QosClass::BestEffort,
        }
    }
}

impl CloudPodSpec {
    /// Build a spec from container requirements
    pub fn from_containers(
        init_containers: &[ContainerResources],
        containers: &[ContainerResources],
    ) -> Self {
        let request = containers.iter().fold(ResourceVector::default(), |acc, c| {
            ResourceVector {
                cpu: acc.cpu + c.cpu_request,
                mem: acc.mem + c.mem_request,
                gpu: acc.gpu + c.gpu,
            }
        });
        let ask = ResourceVector::from_containers(init_containers, containers);
        Self {
            cpu: request.cpu,
            mem: request.mem,
            cpu_limit: ask.cpu,
            mem_limit: ask.mem,
            gpu: ask.gpu,
            ..Default::default()
        }
    }

    /// Demand used for serverless quantization: the larger of request and limit
    pub fn serverless_demand(&self) -> ResourceVector {
        ResourceVector {
            cpu: nan_max(self.cpu, self.cpu_limit),
            mem: nan_max(self.mem, self.mem_limit),
            gpu: self.gpu,
        }
    }

    /// Demand used for serverful pricing: the request as written
    pub fn request(&self) -> ResourceVector {
        ResourceVector {
            cpu: self.cpu,
            mem: self.mem,
            gpu: self.gpu,
        }
    }

    /// Charge type the caller forces, if any
    pub fn forced_charge_type(&self) -> Option<ChargeType> {
        if self.charge_type_forced {
            self.charge_type
        } else {
            None
        }
    }
}

/// Node-level resource and billing description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudNodeSpec {
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub mem: f64,
    #[serde(default)]
    pub gpu: f64,
    #[serde(default)]
    pub gpu_type: String,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub charge_type: Option<ChargeType>,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub region: String,
    /// Node is a virtual kubelet
    #[serde(default)]
    pub virtual_node: bool,
    /// Hourly cost string from the vendor's billing export; overrides the rate card
    #[serde(default)]
    pub quoted_price: Option<String>,
}

/// A cost quote for one resource vector, per hour
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
}

impl Prices {
    pub fn new(total_price: f64) -> Self {
        Self {
            total_price,
            discount_price: None,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Parse a vendor cost string
    pub fn parse(total: &str, discount: Option<&str>) -> Result<Self, PricingError> {
        let total_price = parse_cost(total)?;
        let discount_price = discount.map(parse_cost).transpose()?;
        Ok(Self {
            total_price,
            discount_price,
        })
    }

    /// Price of one replica; zero replicas price at zero
    pub fn per_replica(&self, goods_num: u64) -> f64 {
        if goods_num == 0 {
            return 0.0;
        }
        self.total_price / goods_num as f64
    }
}

fn parse_cost(value: &str) -> Result<f64, PricingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let parsed: f64 = trimmed
        .parse()
        .map_err(|_| PricingError::MalformedQuantity(value.to_string()))?;
    if parsed.is_nan() {
        return Err(PricingError::NotANumber);
    }
    Ok(parsed)
}

/// Sizing strategy a workload spec was produced by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingStrategy {
    /// Original spec, migrated as-is
    Direct,
    /// Percentile plus margin
    Recommended,
    /// Plain percentile
    Percentile,
    /// Max observed usage
    Max,
    /// Max observed usage plus margin
    MaxMargin,
    /// Request set equal to limit
    RequestEqualsLimit,
}

impl SizingStrategy {
    pub const ALL: [SizingStrategy; 6] = [
        SizingStrategy::Direct,
        SizingStrategy::Recommended,
        SizingStrategy::Percentile,
        SizingStrategy::Max,
        SizingStrategy::MaxMargin,
        SizingStrategy::RequestEqualsLimit,
    ];

    /// Label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            SizingStrategy::Direct => "eks-direct-without-recommendation",
            SizingStrategy::Recommended => "eks-recommended-by-percentile-margin",
            SizingStrategy::Percentile => "eks-recommended-by-percentile",
            SizingStrategy::Max => "eks-recommended-by-max",
            SizingStrategy::MaxMargin => "eks-recommended-by-max-margin",
            SizingStrategy::RequestEqualsLimit => "eks-recommended-request-equals-limit",
        }
    }
}

impl fmt::Display for SizingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One spec per sizing strategy for a single workload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkloadRecommendedSpecs {
    pub direct: CloudPodSpec,
    pub recommended: CloudPodSpec,
    pub percentile: CloudPodSpec,
    pub max: CloudPodSpec,
    pub max_margin: CloudPodSpec,
    pub request_equals_limit: CloudPodSpec,
}

impl WorkloadRecommendedSpecs {
    pub fn get(&self, strategy: SizingStrategy) -> &CloudPodSpec {
        match strategy {
            SizingStrategy::Direct => &self.direct,
            SizingStrategy::Recommended => &self.recommended,
            SizingStrategy::Percentile => &self.percentile,
            SizingStrategy::Max => &self.max,
            SizingStrategy::MaxMargin => &self.max_margin,
            SizingStrategy::RequestEqualsLimit => &self.request_equals_limit,
        }
    }
}

/// One price per sizing strategy for a single workload
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadRecommendedPrice {
    pub direct: Prices,
    pub recommended: Prices,
    pub percentile: Prices,
    pub max: Prices,
    pub max_margin: Prices,
    pub request_equals_limit: Prices,
}

impl WorkloadRecommendedPrice {
    pub fn get(&self, strategy: SizingStrategy) -> &Prices {
        match strategy {
            SizingStrategy::Direct => &self.direct,
            SizingStrategy::Recommended => &self.recommended,
            SizingStrategy::Percentile => &self.percentile,
            SizingStrategy::Max => &self.max,
            SizingStrategy::MaxMargin => &self.max_margin,
            SizingStrategy::RequestEqualsLimit => &self.request_equals_limit,
        }
    }

    pub fn set(&mut self, strategy: SizingStrategy, prices: Prices) {
        let slot = match strategy {
            SizingStrategy::Direct => &mut self.direct,
            SizingStrategy::Recommended => &mut self.recommended,
            SizingStrategy::Percentile => &mut self.percentile,
            SizingStrategy::Max => &mut self.max,
            SizingStrategy::MaxMargin => &mut self.max_margin,
            SizingStrategy::RequestEqualsLimit => &mut self.request_equals_limit,
        };
        *slot = prices;
    }
}

/// Cluster-wide cost of one hosting model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub total_cost: f64,
    pub serverful_cost: f64,
    pub serverless_cost: f64,
    pub serverful_platform_cost: f64,
    pub serverless_platform_cost: f64,
}

/// Cluster-wide cost of one sizing strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedCost {
    pub total_cost: f64,
    pub workload_cost: f64,
    pub platform_cost: f64,
}

impl RecommendedCost {
    pub fn new(workload_cost: f64, platform_cost: f64) -> Self {
        Self {
            total_cost: workload_cost + platform_cost,
            workload_cost,
            platform_cost,
        }
    }

    /// Percentage saved relative to a baseline; 0 when the baseline is free
    pub fn savings_percent(&self, baseline: &RecommendedCost) -> f64 {
        if baseline.total_cost <= 0.0 {
            return 0.0;
        }
        (baseline.total_cost - self.total_cost) / baseline.total_cost * 100.0
    }
}

/// Identity of a workload within a cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl WorkloadKey {
    pub fn new(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// DaemonSet pods are platform-level and excluded from workload cost
    pub fn is_daemonset(&self) -> bool {
        self.kind.eq_ignore_ascii_case("daemonset")
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Pod annotation selecting the serverless CPU architecture
pub const CPU_TYPE_ANNOTATION: &str = "eks.tke.cloud.tencent.com/cpu-type";

/// Pod annotation selecting the serverless GPU model; wins over the CPU type
pub const GPU_TYPE_ANNOTATION: &str = "eks.tke.cloud.tencent.com/gpu-type";

/// One workload entry of a cluster snapshot.
///
/// Either carries a ready pod-level `spec`, or the pod template's containers
/// and annotations from which the spec is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadEntry {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub spec: Option<CloudPodSpec>,
    #[serde(default)]
    pub init_containers: Vec<ContainerResources>,
    #[serde(default)]
    pub containers: Vec<ContainerResources>,
    #[serde(default = "default_goods_num")]
    pub replicas: u64,
    #[serde(default)]
    pub serverless: bool,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub recommendations: Option<WorkloadRecommendedSpecs>,
}

impl WorkloadEntry {
    pub fn key(&self) -> WorkloadKey {
        WorkloadKey::new(&self.kind, &self.namespace, &self.name)
    }

    /// Architecture requested through the pod template's annotations
    pub fn architecture(&self) -> Architecture {
        let annotation = self
            .annotations
            .get(GPU_TYPE_ANNOTATION)
            .or_else(|| self.annotations.get(CPU_TYPE_ANNOTATION));
        Architecture::from_annotation(annotation.map(String::as_str))
    }

    /// Pod-level spec, derived from the containers when none was given
    pub fn pod_spec(&self) -> CloudPodSpec {
        if let Some(spec) = &self.spec {
            return spec.clone();
        }
        CloudPodSpec {
            goods_num: self.replicas,
            serverless: self.serverless,
            machine_arch: self.architecture(),
            qos_class: QosClass::from_containers(&self.containers),
            ..CloudPodSpec::from_containers(&self.init_containers, &self.containers)
        }
    }
}

/// Node entry of a cluster snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    pub name: String,
    #[serde(flatten)]
    pub spec: CloudNodeSpec,
}

/// Serialized form of a cluster snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub workloads: Vec<WorkloadEntry>,
}

/// Read-only view of a cluster produced by cluster inspection
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub cluster_id: String,
    pub nodes: BTreeMap<String, CloudNodeSpec>,
    pub workloads: BTreeMap<WorkloadKey, CloudPodSpec>,
    pub recommendations: BTreeMap<WorkloadKey, WorkloadRecommendedSpecs>,
}

impl ClusterSnapshot {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            ..Default::default()
        }
    }

    pub fn with_node(mut self, name: impl Into<String>, spec: CloudNodeSpec) -> Self {
        self.nodes.insert(name.into(), spec);
        self
    }

    pub fn with_workload(mut self, key: WorkloadKey, spec: CloudPodSpec) -> Self {
        self.workloads.insert(key, spec);
        self
    }

    pub fn with_recommendation(mut self, key: WorkloadKey, specs: WorkloadRecommendedSpecs) -> Self {
        self.recommendations.insert(key, specs);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.workloads.is_empty() && self.recommendations.is_empty()
    }

    /// Number of real (non-virtual) nodes
    pub fn real_node_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.virtual_node).count()
    }
}

impl From<SnapshotDocument> for ClusterSnapshot {
    fn from(doc: SnapshotDocument) -> Self {
        let mut snapshot = ClusterSnapshot::new(doc.cluster_id);
        for node in doc.nodes {
            snapshot.nodes.insert(node.name, node.spec);
        }
        for entry in doc.workloads {
            let key = entry.key();
            let spec = entry.pod_spec();
            if let Some(recs) = entry.recommendations {
                snapshot.recommendations.insert(key.clone(), recs);
            }
            snapshot.workloads.insert(key, spec);
        }
        snapshot
    }
}

impl ClusterSnapshot {
    /// Parse a snapshot from its JSON document form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: SnapshotDocument = serde_json::from_str(json)?;
        Ok(doc.into())
    }
}
