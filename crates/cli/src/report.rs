//! Comparison report tables
//!
//! Each table is a list of rows that render both as a terminal table and as a
//! tab-separated file named `<cluster>-<report>.csv`.

use anyhow::{Context, Result};
use cost_lib::tier::{MatchOutcome, TierMatch};
use cost_lib::{ComparisonReport, Cost, SizingStrategy, SpecResources};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;

use crate::output::{format_cost, format_percent, format_quantity, print_table};

/// Row of the original and direct-migration cost summaries
#[derive(Tabled, Serialize)]
pub struct CostRow {
    #[tabled(rename = "Platform")]
    #[serde(rename = "platform")]
    platform: String,
    #[tabled(rename = "Total")]
    #[serde(rename = "totalCost")]
    total_cost: String,
    #[tabled(rename = "Serverful")]
    #[serde(rename = "serverfulCost")]
    serverful_cost: String,
    #[tabled(rename = "Serverless")]
    #[serde(rename = "serverlessCost")]
    serverless_cost: String,
    #[tabled(rename = "Serverful Platform")]
    #[serde(rename = "serverfulPlatformCost")]
    serverful_platform_cost: String,
    #[tabled(rename = "Serverless Platform")]
    #[serde(rename = "serverlessPlatformCost")]
    serverless_platform_cost: String,
}

impl CostRow {
    fn new(platform: &str, cost: &Cost) -> Self {
        Self {
            platform: platform.to_string(),
            total_cost: format_cost(cost.total_cost),
            serverful_cost: format_cost(cost.serverful_cost),
            serverless_cost: format_cost(cost.serverless_cost),
            serverful_platform_cost: format_cost(cost.serverful_platform_cost),
            serverless_platform_cost: format_cost(cost.serverless_platform_cost),
        }
    }
}

/// Row of the recommended cost summary
#[derive(Tabled, Serialize)]
pub struct StrategyCostRow {
    #[tabled(rename = "Strategy")]
    #[serde(rename = "strategy")]
    strategy: String,
    #[tabled(rename = "Total")]
    #[serde(rename = "totalCost")]
    total_cost: String,
    #[tabled(rename = "Workload")]
    #[serde(rename = "workloadCost")]
    workload_cost: String,
    #[tabled(rename = "Platform")]
    #[serde(rename = "platformCost")]
    platform_cost: String,
    #[tabled(rename = "Savings vs Direct")]
    #[serde(rename = "savingsPercent")]
    savings: String,
}

/// Row of the resource summary
#[derive(Tabled, Serialize)]
pub struct ResourceRow {
    #[tabled(rename = "Resource")]
    #[serde(rename = "name")]
    name: String,
    #[tabled(rename = "CPU (cores)")]
    #[serde(rename = "cpu")]
    cpu: String,
    #[tabled(rename = "Memory (GiB)")]
    #[serde(rename = "memory")]
    mem: String,
}

/// Row of the workload distribution
#[derive(Tabled, Serialize)]
pub struct WorkloadPriceRow {
    #[tabled(rename = "Kind")]
    #[serde(rename = "kind")]
    kind: String,
    #[tabled(rename = "Namespace")]
    #[serde(rename = "namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "name")]
    name: String,
    #[tabled(rename = "Replicas")]
    #[serde(rename = "replicas")]
    replicas: u64,
    #[tabled(rename = "QoS")]
    #[serde(rename = "qosClass")]
    qos_class: String,
    #[tabled(rename = "CPU Req")]
    #[serde(rename = "cpuRequest")]
    cpu_request: String,
    #[tabled(rename = "Mem Req")]
    #[serde(rename = "memRequest")]
    mem_request: String,
    #[tabled(rename = "CPU Lim")]
    #[serde(rename = "cpuLimit")]
    cpu_limit: String,
    #[tabled(rename = "Mem Lim")]
    #[serde(rename = "memLimit")]
    mem_limit: String,
    #[tabled(rename = "Serverless Tier")]
    #[serde(rename = "serverlessTier")]
    tier: String,
    #[tabled(rename = "Original")]
    #[serde(rename = "originalPrice")]
    original: String,
    #[tabled(rename = "Direct")]
    #[serde(rename = "directPrice")]
    direct: String,
    #[tabled(rename = "Recommended")]
    #[serde(rename = "recommendedPrice")]
    recommended: String,
    #[tabled(rename = "Percentile")]
    #[serde(rename = "percentilePrice")]
    percentile: String,
    #[tabled(rename = "Max")]
    #[serde(rename = "maxPrice")]
    max: String,
    #[tabled(rename = "Max+Margin")]
    #[serde(rename = "maxMarginPrice")]
    max_margin: String,
    #[tabled(rename = "Req=Limit")]
    #[serde(rename = "requestEqualsLimitPrice")]
    request_equals_limit: String,
    #[tabled(rename = "Rec/Replica")]
    #[serde(rename = "recommendedPerReplica")]
    per_replica: String,
}

/// Row of the recommended workload distribution, one per strategy
#[derive(Tabled, Serialize)]
pub struct StrategySpecPriceRow {
    #[tabled(rename = "Kind")]
    #[serde(rename = "kind")]
    kind: String,
    #[tabled(rename = "Namespace")]
    #[serde(rename = "namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "name")]
    name: String,
    #[tabled(rename = "Strategy")]
    #[serde(rename = "strategy")]
    strategy: String,
    #[tabled(rename = "Replicas")]
    #[serde(rename = "replicas")]
    replicas: u64,
    #[tabled(rename = "CPU Req")]
    #[serde(rename = "cpuRequest")]
    cpu_request: String,
    #[tabled(rename = "Mem Req")]
    #[serde(rename = "memRequest")]
    mem_request: String,
    #[tabled(rename = "CPU Lim")]
    #[serde(rename = "cpuLimit")]
    cpu_limit: String,
    #[tabled(rename = "Mem Lim")]
    #[serde(rename = "memLimit")]
    mem_limit: String,
    #[tabled(rename = "Serverless Tier")]
    #[serde(rename = "serverlessTier")]
    tier: String,
    #[tabled(rename = "Price/h")]
    #[serde(rename = "price")]
    price: String,
}

/// Row of the node distribution
#[derive(Tabled, Serialize)]
pub struct NodeRow {
    #[tabled(rename = "Node")]
    #[serde(rename = "name")]
    name: String,
    #[tabled(rename = "Virtual")]
    #[serde(rename = "virtual")]
    virtual_node: bool,
    #[tabled(rename = "Instance Type")]
    #[serde(rename = "instanceType")]
    instance_type: String,
    #[tabled(rename = "Charge Type")]
    #[serde(rename = "chargeType")]
    charge_type: String,
    #[tabled(rename = "Region")]
    #[serde(rename = "region")]
    region: String,
    #[tabled(rename = "Zone")]
    #[serde(rename = "zone")]
    zone: String,
    #[tabled(rename = "CPU")]
    #[serde(rename = "cpu")]
    cpu: String,
    #[tabled(rename = "Memory")]
    #[serde(rename = "memory")]
    mem: String,
    #[tabled(rename = "GPU")]
    #[serde(rename = "gpu")]
    gpu: String,
    #[tabled(rename = "GPU Type")]
    #[serde(rename = "gpuType")]
    gpu_type: String,
    #[tabled(rename = "Price/h")]
    #[serde(rename = "price")]
    price: String,
}

fn optional_cost(value: Option<f64>) -> String {
    value.map(format_cost).unwrap_or_else(|| "-".to_string())
}

fn or_dash(value: impl Into<String>) -> String {
    let value = value.into();
    if value.is_empty() {
        "-".to_string()
    } else {
        value
    }
}

/// Render a quantized tier, e.g. `1c 4Gi PREPAID` or `16c 64Gi POSTPAID_BY_HOUR (ceiling)`
fn format_tier(tier: Option<TierMatch>) -> String {
    let Some(m) = tier else {
        return "-".to_string();
    };
    let mut out = format!(
        "{}c {}Gi",
        format_quantity(m.tier.cpu),
        format_quantity(m.tier.mem)
    );
    if m.architecture.is_gpu() {
        out.push_str(&format!(" {}x{}", format_quantity(m.tier.gpu), m.architecture));
    }
    out.push(' ');
    out.push_str(m.charge_type.as_str());
    match m.outcome {
        MatchOutcome::Fitted => {}
        MatchOutcome::Floor => out.push_str(" (floor)"),
        MatchOutcome::Ceiling => out.push_str(" (ceiling)"),
    }
    out
}

struct ResourceCells {
    cpu_request: String,
    mem_request: String,
    cpu_limit: String,
    mem_limit: String,
}

impl From<Option<SpecResources>> for ResourceCells {
    fn from(resources: Option<SpecResources>) -> Self {
        let cell = |f: fn(&SpecResources) -> f64| {
            resources
                .as_ref()
                .map(|r| format_quantity(f(r)))
                .unwrap_or_else(|| "-".to_string())
        };
        Self {
            cpu_request: cell(|r| r.cpu_request),
            mem_request: cell(|r| r.mem_request),
            cpu_limit: cell(|r| r.cpu_limit),
            mem_limit: cell(|r| r.mem_limit),
        }
    }
}

pub fn original_cost_rows(report: &ComparisonReport) -> Vec<CostRow> {
    vec![CostRow::new("serverful", &report.serverful.cost)]
}

pub fn direct_cost_rows(report: &ComparisonReport) -> Vec<CostRow> {
    vec![CostRow::new("serverless", &report.serverless.cost)]
}

pub fn strategy_rows(report: &ComparisonReport) -> Vec<StrategyCostRow> {
    report
        .strategy_rows()
        .into_iter()
        .map(|row| StrategyCostRow {
            strategy: row.label.to_string(),
            total_cost: format_cost(row.cost.total_cost),
            workload_cost: format_cost(row.cost.workload_cost),
            platform_cost: format_cost(row.cost.platform_cost),
            savings: format_percent(row.savings_percent),
        })
        .collect()
}

pub fn resource_rows(report: &ComparisonReport) -> Vec<ResourceRow> {
    report
        .resources
        .rows()
        .into_iter()
        .map(|(name, totals)| ResourceRow {
            name: name.to_string(),
            cpu: format_quantity(totals.cpu),
            mem: format_quantity(totals.mem),
        })
        .collect()
}

pub fn workload_rows(report: &ComparisonReport) -> Vec<WorkloadPriceRow> {
    report
        .workload_rows()
        .into_iter()
        .map(|row| {
            let strategy = |s: SizingStrategy| {
                optional_cost(row.recommended_prices.map(|p| p.get(s).total_price))
            };
            let cells = ResourceCells::from(row.resources);
            WorkloadPriceRow {
                qos_class: row
                    .qos_class
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                cpu_request: cells.cpu_request,
                mem_request: cells.mem_request,
                cpu_limit: cells.cpu_limit,
                mem_limit: cells.mem_limit,
                tier: format_tier(row.serverless_tier),
                recommended: strategy(SizingStrategy::Recommended),
                percentile: strategy(SizingStrategy::Percentile),
                max: strategy(SizingStrategy::Max),
                max_margin: strategy(SizingStrategy::MaxMargin),
                request_equals_limit: strategy(SizingStrategy::RequestEqualsLimit),
                original: format_cost(row.original_price),
                direct: optional_cost(row.direct_serverless_price),
                per_replica: optional_cost(row.recommended_per_replica),
                replicas: row.replicas,
                kind: row.kind,
                namespace: row.namespace,
                name: row.name,
            }
        })
        .collect()
}

pub fn strategy_spec_rows(report: &ComparisonReport) -> Vec<StrategySpecPriceRow> {
    report
        .strategy_spec_rows()
        .into_iter()
        .map(|row| {
            let cells = ResourceCells::from(Some(row.resources));
            StrategySpecPriceRow {
                kind: row.kind,
                namespace: row.namespace,
                name: row.name,
                strategy: row.strategy.label().to_string(),
                replicas: row.replicas,
                cpu_request: cells.cpu_request,
                mem_request: cells.mem_request,
                cpu_limit: cells.cpu_limit,
                mem_limit: cells.mem_limit,
                tier: format_tier(row.tier),
                price: format_cost(row.price),
            }
        })
        .collect()
}

pub fn node_rows(report: &ComparisonReport) -> Vec<NodeRow> {
    report
        .node_rows()
        .into_iter()
        .map(|row| NodeRow {
            name: row.name,
            virtual_node: row.virtual_node,
            instance_type: or_dash(row.instance_type),
            charge_type: row
                .charge_type
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            region: or_dash(row.region),
            zone: or_dash(row.zone),
            cpu: format_quantity(row.cpu),
            mem: format_quantity(row.mem),
            gpu: format_quantity(row.gpu),
            gpu_type: or_dash(row.gpu_type),
            price: format_cost(row.price),
        })
        .collect()
}

/// Write rows as a tab-separated file `<cluster>-<name>.csv` under `dir`
pub fn write_tsv<T: Serialize>(dir: &Path, cluster_id: &str, name: &str, rows: &[T]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
    let path = dir.join(format!("{}-{}.csv", cluster_id, name));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(path)
}

/// Emits every report table to stdout, csv files or both
pub struct ReportWriter<'a> {
    cluster_id: &'a str,
    stdout: bool,
    csv_dir: Option<&'a Path>,
    written: Vec<PathBuf>,
}

impl<'a> ReportWriter<'a> {
    pub fn new(cluster_id: &'a str, stdout: bool, csv_dir: Option<&'a Path>) -> Self {
        Self {
            cluster_id,
            stdout,
            csv_dir,
            written: Vec::new(),
        }
    }

    pub fn emit<T: Tabled + Serialize>(&mut self, name: &str, title: &str, rows: &[T]) -> Result<()> {
        if self.stdout {
            print_table(title, rows);
        }
        if let Some(dir) = self.csv_dir {
            let path = write_tsv(dir, self.cluster_id, name, rows)?;
            self.written.push(path);
        }
        Ok(())
    }

    /// Emit every table of a comparison report
    pub fn emit_all(&mut self, report: &ComparisonReport) -> Result<()> {
        self.emit("original-cost-summary", "Original Cost Summary", &original_cost_rows(report))?;
        self.emit("direct-cost-summary", "Direct Migration Cost Summary", &direct_cost_rows(report))?;
        self.emit("recommended-cost-summary", "Recommended Cost Summary", &strategy_rows(report))?;
        self.emit("resource-summary", "Resource Summary", &resource_rows(report))?;
        self.emit("workload-distribution", "Workload Distribution", &workload_rows(report))?;
        self.emit(
            "recommended-workload-distribution",
            "Recommended Workload Distribution",
            &strategy_spec_rows(report),
        )?;
        self.emit("node-distribution", "Node Distribution", &node_rows(report))?;
        Ok(())
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}
