//! Vendor tier tables
//!
//! Tables are declarative data embedded in the crate and parsed once into an
//! immutable [`TierCatalog`]. Each table row pairs a CPU step with the memory
//! steps that may be combined with it; rows are flattened into a CPU-major,
//! memory-minor sorted list of purchasable [`Aggregate`]s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::models::{Architecture, ChargeType};

/// Tier data for the reference vendor's serverless product
const BUILTIN_TIERS: &str = include_str!("../../data/tiers.json");

/// One purchasable (CPU, Memory[, GPU]) combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub cpu: f64,
    pub mem: f64,
    #[serde(default)]
    pub gpu: f64,
}

impl Aggregate {
    pub fn new(cpu: f64, mem: f64) -> Self {
        Self { cpu, mem, gpu: 0.0 }
    }
}

/// One table row: a CPU step and the memory steps legally combinable with it
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRange {
    pub cpu: f64,
    pub mem_values: Vec<f64>,
    /// GPUs bundled with this CPU step (GPU tables only)
    pub gpu: f64,
}

/// A flattened, validated table for one architecture (and charge type)
#[derive(Debug, Clone)]
pub struct TierTable {
    architecture: Architecture,
    charge_type: Option<ChargeType>,
    rows: Vec<ResourceRange>,
    aggregates: Vec<Aggregate>,
    floor: Aggregate,
    ceiling: Aggregate,
}

impl TierTable {
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// `None` when the table applies to every charge type
    pub fn charge_type(&self) -> Option<ChargeType> {
        self.charge_type
    }

    pub fn rows(&self) -> &[ResourceRange] {
        &self.rows
    }

    /// Tiers sorted by CPU ascending, then memory ascending
    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    /// Tier used when neither CPU nor memory was specified
    pub fn floor(&self) -> Aggregate {
        self.floor
    }

    /// Largest single-instance tier; demand that fits nowhere saturates here
    pub fn ceiling(&self) -> Aggregate {
        self.ceiling
    }

    pub fn name(&self) -> String {
        match self.charge_type {
            Some(ct) => format!("{}/{}", self.architecture, ct),
            None => self.architecture.to_string(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: String| ConfigError::TierTable {
            table: self.name(),
            reason,
        };

        if self.rows.is_empty() {
            return Err(fail("table has no rows".to_string()));
        }
        for pair in self.rows.windows(2) {
            if pair[1].cpu <= pair[0].cpu {
                return Err(fail(format!(
                    "cpu steps must be strictly increasing ({} after {})",
                    pair[1].cpu, pair[0].cpu
                )));
            }
        }
        for row in &self.rows {
            if row.mem_values.is_empty() {
                return Err(fail(format!("cpu step {} has no memory steps", row.cpu)));
            }
            if row.mem_values.iter().any(|m| !m.is_finite() || *m <= 0.0) {
                return Err(fail(format!("cpu step {} has a non-positive memory step", row.cpu)));
            }
            if row.mem_values.windows(2).any(|w| w[1] < w[0]) {
                return Err(fail(format!(
                    "memory steps of cpu {} must be non-decreasing",
                    row.cpu
                )));
            }
        }
        let max_cpu = self.rows.last().map(|r| r.cpu).unwrap_or_default();
        if self.ceiling.cpu < max_cpu {
            return Err(fail(format!(
                "ceiling cpu {} is below the largest cpu step {}",
                self.ceiling.cpu, max_cpu
            )));
        }
        Ok(())
    }
}

/// Flatten rows into the sorted first-fit scan order
pub fn flatten(rows: &[ResourceRange]) -> Vec<Aggregate> {
    rows.iter()
        .flat_map(|row| {
            row.mem_values.iter().map(move |&mem| Aggregate {
                cpu: row.cpu,
                mem,
                gpu: row.gpu,
            })
        })
        .collect()
}

/// Indices of the tables an architecture resolves to, per charge type
#[derive(Debug, Clone, Copy)]
struct Resolved {
    prepaid: usize,
    postpaid: usize,
}

/// Immutable set of tier tables for one vendor
#[derive(Debug, Clone)]
pub struct TierCatalog {
    vendor: String,
    tables: Vec<TierTable>,
    resolved: Vec<Resolved>,
    exclusive: BTreeMap<Architecture, Vec<Aggregate>>,
}

impl TierCatalog {
    /// Catalog built from the embedded vendor data
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_TIERS)
    }

    /// Parse and validate a catalog from its JSON form
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawCatalog) -> Result<Self, ConfigError> {
        let tables = raw
            .tables
            .into_iter()
            .map(|t| {
                let rows: Vec<ResourceRange> = t.rows.into_iter().map(RawRow::into_range).collect();
                let table = TierTable {
                    architecture: t.architecture,
                    charge_type: t.charge_type,
                    aggregates: flatten(&rows),
                    rows,
                    floor: t.floor,
                    ceiling: t.ceiling,
                };
                table.validate()?;
                Ok(table)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let mut resolved = Vec::with_capacity(Architecture::ALL.len());
        for arch in Architecture::ALL {
            let prepaid = resolve(&tables, arch, ChargeType::Prepaid)?;
            let postpaid = resolve(&tables, arch, ChargeType::PostpaidByHour)?;
            resolved.push(Resolved { prepaid, postpaid });
        }

        let mut exclusive: BTreeMap<Architecture, Vec<Aggregate>> = raw
            .exclusive
            .into_iter()
            .map(|e| {
                let rows: Vec<ResourceRange> = e.rows.into_iter().map(RawRow::into_range).collect();
                (e.architecture, flatten(&rows))
            })
            .collect();
        // every tier of a GPU model is exclusive to that model
        for table in tables.iter().filter(|t| t.architecture.is_gpu()) {
            exclusive
                .entry(table.architecture)
                .or_insert_with(|| table.aggregates.clone());
        }

        Ok(Self {
            vendor: raw.vendor,
            tables,
            resolved,
            exclusive,
        })
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn tables(&self) -> &[TierTable] {
        &self.tables
    }

    /// Table used for an architecture under a charge type
    pub fn table(&self, architecture: Architecture, charge_type: ChargeType) -> &TierTable {
        let resolved = self.resolved[architecture_index(architecture)];
        match charge_type {
            ChargeType::Prepaid => &self.tables[resolved.prepaid],
            ChargeType::PostpaidByHour => &self.tables[resolved.postpaid],
        }
    }

    /// SKUs sold only on the given architecture
    pub fn exclusive(&self, architecture: Architecture) -> &[Aggregate] {
        self.exclusive
            .get(&architecture)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn architecture_index(architecture: Architecture) -> usize {
    match architecture {
        Architecture::Intel => 0,
        Architecture::Amd => 1,
        Architecture::V100 => 2,
        Architecture::T4 => 3,
        Architecture::Nvidia2080Ti => 4,
    }
}

/// Prefer a table dedicated to the charge type, else a charge-type independent one
fn resolve(
    tables: &[TierTable],
    architecture: Architecture,
    charge_type: ChargeType,
) -> Result<usize, ConfigError> {
    let dedicated = tables
        .iter()
        .position(|t| t.architecture == architecture && t.charge_type == Some(charge_type));
    let shared = || {
        tables
            .iter()
            .position(|t| t.architecture == architecture && t.charge_type.is_none())
    };
    dedicated.or_else(shared).ok_or_else(|| ConfigError::TierTable {
        table: format!("{}/{}", architecture, charge_type),
        reason: "no table covers this architecture and charge type".to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    vendor: String,
    tables: Vec<RawTable>,
    #[serde(default)]
    exclusive: Vec<RawExclusive>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    architecture: Architecture,
    #[serde(default)]
    charge_type: Option<ChargeType>,
    floor: Aggregate,
    ceiling: Aggregate,
    rows: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawExclusive {
    architecture: Architecture,
    rows: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    cpu: f64,
    mem: MemorySteps,
    #[serde(default)]
    gpu: f64,
}

impl RawRow {
    fn into_range(self) -> ResourceRange {
        ResourceRange {
            cpu: self.cpu,
            mem_values: self.mem.into_values(),
            gpu: self.gpu,
        }
    }
}

/// Memory steps either listed or given as an inclusive 1 GiB range
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MemorySteps {
    Range { from: u32, to: u32 },
    Values(Vec<f64>),
}

impl MemorySteps {
    fn into_values(self) -> Vec<f64> {
        match self {
            MemorySteps::Range { from, to } => (from..=to).map(f64::from).collect(),
            MemorySteps::Values(values) => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = TierCatalog::builtin().unwrap();
        assert_eq!(catalog.vendor(), "qcloud-eks");
        assert_eq!(catalog.tables().len(), 6);
    }

    #[test]
    fn test_flattened_tables_are_cpu_major_sorted() {
        let catalog = TierCatalog::builtin().unwrap();
        for table in catalog.tables() {
            for pair in table.aggregates().windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert!(
                    a.cpu < b.cpu || (a.cpu == b.cpu && a.mem <= b.mem),
                    "{} not sorted at {:?} -> {:?}",
                    table.name(),
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_charge_type_segmentation() {
        let catalog = TierCatalog::builtin().unwrap();

        let prepaid = catalog.table(Architecture::Intel, ChargeType::Prepaid);
        assert_eq!(prepaid.ceiling(), Aggregate::new(8.0, 32.0));
        assert_eq!(prepaid.aggregates().first(), Some(&Aggregate::new(1.0, 1.0)));

        let postpaid = catalog.table(Architecture::Intel, ChargeType::PostpaidByHour);
        assert_eq!(postpaid.ceiling(), Aggregate::new(16.0, 64.0));
        assert_eq!(postpaid.aggregates().first(), Some(&Aggregate::new(0.25, 0.5)));

        // AMD is charge-type independent
        let amd_prepaid = catalog.table(Architecture::Amd, ChargeType::Prepaid);
        let amd_postpaid = catalog.table(Architecture::Amd, ChargeType::PostpaidByHour);
        assert_eq!(amd_prepaid.aggregates(), amd_postpaid.aggregates());
        assert_eq!(amd_prepaid.ceiling(), Aggregate::new(32.0, 64.0));
    }

    #[test]
    fn test_postpaid_row_sizes() {
        let catalog = TierCatalog::builtin().unwrap();
        let postpaid = catalog.table(Architecture::Intel, ChargeType::PostpaidByHour);
        let sizes: Vec<usize> = postpaid.rows().iter().map(|r| r.mem_values.len()).collect();
        assert_eq!(sizes, vec![3, 4, 8, 13, 25, 17, 25, 33]);
    }

    #[test]
    fn test_gpu_tables_bundle_gpus() {
        let catalog = TierCatalog::builtin().unwrap();
        let v100 = catalog.table(Architecture::V100, ChargeType::PostpaidByHour);
        let gpus: Vec<f64> = v100.aggregates().iter().map(|a| a.gpu).collect();
        assert_eq!(gpus, vec![1.0, 2.0, 4.0, 8.0]);
        assert_eq!(catalog.exclusive(Architecture::T4).len(), 3);
    }

    #[test]
    fn test_rejects_decreasing_memory() {
        let json = r#"{
            "vendor": "broken",
            "tables": [{
                "architecture": "intel",
                "floor": {"cpu": 1, "mem": 2},
                "ceiling": {"cpu": 1, "mem": 4},
                "rows": [{"cpu": 1, "mem": [4, 2]}]
            }]
        }"#;
        let err = TierCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::TierTable { .. }));
    }

    #[test]
    fn test_rejects_missing_architecture() {
        let json = r#"{
            "vendor": "intel-only",
            "tables": [{
                "architecture": "intel",
                "floor": {"cpu": 1, "mem": 2},
                "ceiling": {"cpu": 1, "mem": 4},
                "rows": [{"cpu": 1, "mem": {"from": 1, "to": 4}}]
            }]
        }"#;
        let err = TierCatalog::from_json(json).unwrap_err();
        assert!(err.to_string().contains("amd"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = TierCatalog::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::TierData(_)));
    }
}
