//! Quantization of raw demand onto vendor tiers

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::charge_type::ChargeTypeSelector;
use super::table::{Aggregate, TierCatalog, TierTable};
use crate::models::{Architecture, ChargeType, ResourceVector};

/// How a tier was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Smallest enclosing tier from the table
    Fitted,
    /// Demand was unspecified; the table's floor tier was used
    Floor,
    /// Nothing enclosed the demand; saturated at the table's ceiling
    Ceiling,
}

impl MatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::Fitted => "fitted",
            MatchOutcome::Floor => "floor",
            MatchOutcome::Ceiling => "ceiling",
        }
    }
}

/// Result of quantizing one demand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierMatch {
    pub tier: Aggregate,
    pub charge_type: ChargeType,
    pub architecture: Architecture,
    pub outcome: MatchOutcome,
}

/// Maps continuous demand onto the tiers of a [`TierCatalog`]
#[derive(Debug, Clone)]
pub struct TierMatcher {
    catalog: Arc<TierCatalog>,
    selector: ChargeTypeSelector,
}

impl TierMatcher {
    pub fn new(catalog: Arc<TierCatalog>) -> Self {
        let selector = ChargeTypeSelector::new(
            catalog
                .table(Architecture::Intel, ChargeType::Prepaid)
                .ceiling()
                .cpu,
        );
        Self { catalog, selector }
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    pub fn selector(&self) -> &ChargeTypeSelector {
        &self.selector
    }

    /// Quantize a demand under an explicit charge type.
    ///
    /// Scans the table in ascending (CPU, Memory) order and returns the first
    /// tier enclosing the demand. GPU tables also require enough bundled GPUs.
    /// Unspecified demand maps to the floor tier; demand nothing encloses
    /// saturates at the ceiling.
    pub fn match_tier(
        &self,
        demand: &ResourceVector,
        charge_type: ChargeType,
        architecture: Architecture,
    ) -> TierMatch {
        let table = self.catalog.table(architecture, charge_type);
        let (tier, outcome) = first_fit(table, demand);
        TierMatch {
            tier,
            charge_type,
            architecture,
            outcome,
        }
    }

    /// Select the charge type, then quantize
    pub fn match_demand(
        &self,
        demand: &ResourceVector,
        forced: Option<ChargeType>,
        architecture: Architecture,
    ) -> TierMatch {
        let charge_type = self.selector.select(demand, forced);
        self.match_tier(demand, charge_type, architecture)
    }

    /// True only if the pair is exactly one of the SKUs exclusive to the architecture
    pub fn is_exact_tier_member(&self, cpu: f64, mem: f64, architecture: Architecture) -> bool {
        self.catalog
            .exclusive(architecture)
            .iter()
            .any(|a| a.cpu == cpu && a.mem == mem)
    }

    /// The single CPU architecture a pair is exclusive to, if any
    pub fn exclusive_architecture(&self, cpu: f64, mem: f64) -> Option<Architecture> {
        [Architecture::Intel, Architecture::Amd]
            .into_iter()
            .find(|arch| self.is_exact_tier_member(cpu, mem, *arch))
    }
}

fn first_fit(table: &TierTable, demand: &ResourceVector) -> (Aggregate, MatchOutcome) {
    let gpu_table = table.architecture().is_gpu();

    if demand.is_unspecified() && (!gpu_table || demand.gpu <= 0.0) {
        return (table.floor(), MatchOutcome::Floor);
    }

    table
        .aggregates()
        .iter()
        .find(|tier| {
            demand.cpu <= tier.cpu && demand.mem <= tier.mem && (!gpu_table || demand.gpu <= tier.gpu)
        })
        .map(|tier| (*tier, MatchOutcome::Fitted))
        .unwrap_or((table.ceiling(), MatchOutcome::Ceiling))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> TierMatcher {
        TierMatcher::new(Arc::new(TierCatalog::builtin().unwrap()))
    }

    #[test]
    fn test_fits_smallest_enclosing_tier() {
        let m = matcher().match_tier(
            &ResourceVector::new(1.0, 3.5),
            ChargeType::PostpaidByHour,
            Architecture::Intel,
        );
        assert_eq!(m.tier, Aggregate::new(1.0, 4.0));
        assert_eq!(m.outcome, MatchOutcome::Fitted);
    }

    #[test]
    fn test_memory_pushes_to_next_cpu_step() {
        // 1 core with 10 GiB exceeds the 1-core row; 2 cores allow up to 16 GiB
        let m = matcher().match_tier(
            &ResourceVector::new(1.0, 10.0),
            ChargeType::PostpaidByHour,
            Architecture::Intel,
        );
        assert_eq!(m.tier, Aggregate::new(2.0, 10.0));
    }

    #[test]
    fn test_saturates_at_ceiling() {
        let m = matcher().match_demand(&ResourceVector::new(20.0, 10.0), None, Architecture::Intel);
        assert_eq!(m.charge_type, ChargeType::PostpaidByHour);
        assert_eq!(m.tier, Aggregate::new(16.0, 64.0));
        assert_eq!(m.outcome, MatchOutcome::Ceiling);

        let m = matcher().match_tier(
            &ResourceVector::new(4.0, 40.0),
            ChargeType::Prepaid,
            Architecture::Intel,
        );
        assert_eq!(m.tier, Aggregate::new(8.0, 32.0));
        assert_eq!(m.outcome, MatchOutcome::Ceiling);
    }

    #[test]
    fn test_unspecified_demand_uses_floor() {
        let m = matcher().match_tier(
            &ResourceVector::default(),
            ChargeType::PostpaidByHour,
            Architecture::Intel,
        );
        assert_eq!(m.tier, Aggregate::new(1.0, 2.0));
        assert_eq!(m.outcome, MatchOutcome::Floor);
    }

    #[test]
    fn test_memory_only_demand_is_not_floor() {
        let m = matcher().match_tier(
            &ResourceVector::new(0.0, 0.5),
            ChargeType::PostpaidByHour,
            Architecture::Intel,
        );
        assert_eq!(m.tier, Aggregate::new(0.25, 0.5));
        assert_eq!(m.outcome, MatchOutcome::Fitted);
    }

    #[test]
    fn test_gpu_demand_selects_bundle() {
        let m = matcher().match_tier(
            &ResourceVector::new(4.0, 16.0).with_gpu(2.0),
            ChargeType::PostpaidByHour,
            Architecture::V100,
        );
        assert_eq!(m.tier.cpu, 18.0);
        assert_eq!(m.tier.mem, 80.0);
        assert_eq!(m.tier.gpu, 2.0);

        let m = matcher().match_tier(
            &ResourceVector::new(0.0, 0.0).with_gpu(16.0),
            ChargeType::PostpaidByHour,
            Architecture::T4,
        );
        assert_eq!(m.outcome, MatchOutcome::Ceiling);
        assert_eq!(m.tier.gpu, 4.0);
    }

    #[test]
    fn test_exact_membership() {
        let m = matcher();
        assert!(m.is_exact_tier_member(2.0, 3.0, Architecture::Amd));
        assert!(!m.is_exact_tier_member(2.0, 3.0, Architecture::Intel));
        assert!(m.is_exact_tier_member(1.0, 6.0, Architecture::Intel));
        assert!(!m.is_exact_tier_member(1.0, 5.5, Architecture::Intel));
        assert!(m.is_exact_tier_member(8.0, 40.0, Architecture::V100));

        assert_eq!(m.exclusive_architecture(0.25, 1.0), Some(Architecture::Intel));
        assert_eq!(m.exclusive_architecture(32.0, 48.0), Some(Architecture::Amd));
        assert_eq!(m.exclusive_architecture(1.0, 2.0), None);
    }
}
