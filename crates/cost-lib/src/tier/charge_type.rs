//! Prepaid vs postpaid selection heuristic

use crate::models::{ChargeType, ResourceVector};

/// Largest CPU step the vendor sells on prepaid billing
pub const PREPAID_CPU_CEILING: f64 = 8.0;

/// Smallest CPU step the vendor sells on prepaid billing
pub const PREPAID_CPU_FLOOR: f64 = 1.0;

/// Prepaid SKUs require a CPU:memory ratio above 1:4
pub const PREPAID_MIN_CPU_MEM_RATIO: f64 = 1.0 / 4.0;

/// Picks a charge type for a workload when the caller does not force one
#[derive(Debug, Clone, Copy)]
pub struct ChargeTypeSelector {
    prepaid_cpu_ceiling: f64,
}

impl ChargeTypeSelector {
    pub fn new(prepaid_cpu_ceiling: f64) -> Self {
        Self { prepaid_cpu_ceiling }
    }

    pub fn prepaid_cpu_ceiling(&self) -> f64 {
        self.prepaid_cpu_ceiling
    }

    /// Select the charge type for a demand.
    ///
    /// The comparison operators are load-bearing: reports downstream depend on
    /// the exact thresholds at `cpu == 1`, `cpu == ceiling` and `cpu/mem == 1/4`.
    pub fn select(&self, demand: &ResourceVector, forced: Option<ChargeType>) -> ChargeType {
        if let Some(charge_type) = forced {
            return charge_type;
        }

        let cpu = demand.cpu;
        let mem = demand.mem;
        if cpu > self.prepaid_cpu_ceiling {
            ChargeType::PostpaidByHour
        } else if cpu >= PREPAID_CPU_FLOOR
            && cpu <= self.prepaid_cpu_ceiling
            && cpu / mem > PREPAID_MIN_CPU_MEM_RATIO
        {
            ChargeType::Prepaid
        } else {
            ChargeType::PostpaidByHour
        }
    }
}

impl Default for ChargeTypeSelector {
    fn default() -> Self {
        Self::new(PREPAID_CPU_CEILING)
    }
}

/// Select a charge type with the reference vendor's thresholds
pub fn select_charge_type(demand: &ResourceVector, forced: Option<ChargeType>) -> ChargeType {
    ChargeTypeSelector::default().select(demand, forced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(cpu: f64, mem: f64) -> ChargeType {
        select_charge_type(&ResourceVector::new(cpu, mem), None)
    }

    #[test]
    fn test_forced_charge_type_wins() {
        let demand = ResourceVector::new(20.0, 10.0);
        assert_eq!(
            select_charge_type(&demand, Some(ChargeType::Prepaid)),
            ChargeType::Prepaid
        );
    }

    #[test]
    fn test_large_workloads_are_postpaid() {
        assert_eq!(select(20.0, 10.0), ChargeType::PostpaidByHour);
        assert_eq!(select(8.5, 8.0), ChargeType::PostpaidByHour);
    }

    #[test]
    fn test_cpu_heavy_workloads_are_prepaid() {
        assert_eq!(select(1.0, 3.5), ChargeType::Prepaid);
        assert_eq!(select(8.0, 16.0), ChargeType::Prepaid);
        // memory unspecified gives an infinite ratio
        assert_eq!(select(2.0, 0.0), ChargeType::Prepaid);
    }

    #[test]
    fn test_boundaries() {
        // cpu == 1 is inside the prepaid band
        assert_eq!(select(1.0, 2.0), ChargeType::Prepaid);
        // just below 1 core falls back to postpaid
        assert_eq!(select(0.999, 2.0), ChargeType::PostpaidByHour);
        // ratio exactly 1:4 is not strictly greater
        assert_eq!(select(1.0, 4.0), ChargeType::PostpaidByHour);
        assert_eq!(select(2.0, 8.0), ChargeType::PostpaidByHour);
        // cpu == ceiling is still prepaid
        assert_eq!(select(8.0, 31.0), ChargeType::Prepaid);
    }

    #[test]
    fn test_memory_heavy_workloads_are_postpaid() {
        assert_eq!(select(1.0, 8.0), ChargeType::PostpaidByHour);
        assert_eq!(select(0.5, 1.0), ChargeType::PostpaidByHour);
    }

    #[test]
    fn test_forcing_selected_type_is_idempotent() {
        let demands = [
            (0.25, 0.5),
            (1.0, 3.5),
            (1.0, 4.0),
            (4.0, 8.0),
            (8.0, 64.0),
            (12.0, 24.0),
            (20.0, 10.0),
        ];
        for (cpu, mem) in demands {
            let demand = ResourceVector::new(cpu, mem);
            let selected = select_charge_type(&demand, None);
            assert_eq!(select_charge_type(&demand, Some(selected)), selected);
        }
    }
}
