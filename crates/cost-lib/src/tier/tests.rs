//! Property-style checks of tier quantization across every builtin table

#[cfg(test)]
mod quantization_tests {
    use crate::models::{Architecture, ChargeType, ResourceVector};
    use crate::tier::{builtin_matcher, Aggregate, MatchOutcome, TierMatcher};

    const CHARGE_TYPES: [ChargeType; 2] = [ChargeType::Prepaid, ChargeType::PostpaidByHour];

    fn encloses(tier: &Aggregate, demand: &ResourceVector, gpu: bool) -> bool {
        demand.cpu <= tier.cpu && demand.mem <= tier.mem && (!gpu || demand.gpu <= tier.gpu)
    }

    /// Demands on a coarse grid covering every table's range
    fn demand_grid(architecture: Architecture) -> Vec<ResourceVector> {
        let cpus = [0.1, 0.25, 0.3, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.5, 8.0, 9.0, 12.0, 17.0, 33.0];
        let mems = [0.2, 0.5, 1.0, 1.7, 3.5, 8.0, 10.0, 24.5, 40.0, 64.0, 100.0];
        let gpus: &[f64] = if architecture.is_gpu() {
            &[0.0, 1.0, 2.0, 3.0, 8.0]
        } else {
            &[0.0]
        };

        let mut grid = Vec::new();
        for &cpu in &cpus {
            for &mem in &mems {
                for &gpu in gpus {
                    grid.push(ResourceVector::new(cpu, mem).with_gpu(gpu));
                }
            }
        }
        grid
    }

    fn for_every_table(mut check: impl FnMut(&TierMatcher, Architecture, ChargeType)) {
        let matcher = builtin_matcher().unwrap();
        for architecture in Architecture::ALL {
            for charge_type in CHARGE_TYPES {
                check(&matcher, architecture, charge_type);
            }
        }
    }

    #[test]
    fn test_fitted_tier_is_minimal_enclosing_tier() {
        for_every_table(|matcher, architecture, charge_type| {
            let table = matcher.catalog().table(architecture, charge_type);
            for demand in demand_grid(architecture) {
                let m = matcher.match_tier(&demand, charge_type, architecture);
                if m.outcome != MatchOutcome::Fitted {
                    continue;
                }
                assert!(encloses(&m.tier, &demand, architecture.is_gpu()));

                // nothing earlier in scan order encloses the demand
                let position = table
                    .aggregates()
                    .iter()
                    .position(|a| *a == m.tier)
                    .unwrap();
                for earlier in &table.aggregates()[..position] {
                    assert!(
                        !encloses(earlier, &demand, architecture.is_gpu()),
                        "{} picked {:?} for {:?} but {:?} also fits",
                        table.name(),
                        m.tier,
                        demand,
                        earlier
                    );
                }
            }
        });
    }

    #[test]
    fn test_unmatched_demand_saturates_at_ceiling() {
        for_every_table(|matcher, architecture, charge_type| {
            let table = matcher.catalog().table(architecture, charge_type);
            for demand in demand_grid(architecture) {
                let m = matcher.match_tier(&demand, charge_type, architecture);
                let fits_somewhere = table
                    .aggregates()
                    .iter()
                    .any(|a| encloses(a, &demand, architecture.is_gpu()));
                if !fits_somewhere {
                    assert_eq!(m.outcome, MatchOutcome::Ceiling);
                    assert_eq!(m.tier, table.ceiling());
                }
            }
        });
    }

    #[test]
    fn test_matching_a_tier_returns_it_unchanged() {
        for_every_table(|matcher, architecture, charge_type| {
            let table = matcher.catalog().table(architecture, charge_type);
            for tier in table.aggregates() {
                let demand = ResourceVector::new(tier.cpu, tier.mem).with_gpu(tier.gpu);
                let m = matcher.match_tier(&demand, charge_type, architecture);
                assert_eq!(m.tier, *tier);
                assert_eq!(m.outcome, MatchOutcome::Fitted);
            }
        });
    }

    #[test]
    fn test_rematching_result_is_stable() {
        for_every_table(|matcher, architecture, charge_type| {
            for demand in demand_grid(architecture) {
                let first = matcher.match_tier(&demand, charge_type, architecture);
                let again = matcher.match_tier(
                    &ResourceVector::new(first.tier.cpu, first.tier.mem).with_gpu(first.tier.gpu),
                    charge_type,
                    architecture,
                );
                assert_eq!(first.tier, again.tier);
            }
        });
    }

    #[test]
    fn test_unspecified_demand_maps_to_floor_everywhere() {
        for_every_table(|matcher, architecture, charge_type| {
            let m = matcher.match_tier(&ResourceVector::default(), charge_type, architecture);
            assert_eq!(m.outcome, MatchOutcome::Floor);
            assert_eq!(m.tier, matcher.catalog().table(architecture, charge_type).floor());
        });

        let matcher = builtin_matcher().unwrap();
        let m = matcher.match_tier(
            &ResourceVector::default(),
            ChargeType::Prepaid,
            Architecture::Amd,
        );
        assert_eq!(m.tier, Aggregate::new(1.0, 2.0));
    }

    #[test]
    fn test_selected_charge_type_drives_table_choice() {
        let matcher = builtin_matcher().unwrap();

        let m = matcher.match_demand(&ResourceVector::new(1.0, 3.5), None, Architecture::Intel);
        assert_eq!(m.charge_type, ChargeType::Prepaid);
        assert_eq!(m.tier, Aggregate::new(1.0, 4.0));

        // 0.5 cores only exist on the postpaid table
        let m = matcher.match_demand(&ResourceVector::new(0.5, 1.0), None, Architecture::Intel);
        assert_eq!(m.charge_type, ChargeType::PostpaidByHour);
        assert_eq!(m.tier, Aggregate::new(0.5, 1.0));

        // forcing prepaid rounds the same demand up to the prepaid floor row
        let m = matcher.match_demand(
            &ResourceVector::new(0.5, 1.0),
            Some(ChargeType::Prepaid),
            Architecture::Intel,
        );
        assert_eq!(m.charge_type, ChargeType::Prepaid);
        assert_eq!(m.tier, Aggregate::new(1.0, 1.0));
    }

    #[test]
    fn test_amd_ignores_charge_type() {
        let matcher = builtin_matcher().unwrap();
        for demand in demand_grid(Architecture::Amd) {
            let prepaid = matcher.match_tier(&demand, ChargeType::Prepaid, Architecture::Amd);
            let postpaid =
                matcher.match_tier(&demand, ChargeType::PostpaidByHour, Architecture::Amd);
            assert_eq!(prepaid.tier, postpaid.tier);
        }
    }
}
