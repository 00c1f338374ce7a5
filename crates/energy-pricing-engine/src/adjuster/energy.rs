use energy_pricing_core::{ResourceType, ValidationIssue};

use super::{BulkTier, ResourceAdjuster};

/// Energy amounts below this may not cover a single transaction.
pub const MIN_USEFUL_ENERGY: f64 = 100.0;

const ENERGY_TIERS: &[BulkTier] = &[
    BulkTier {
        min_amount: 1_000_000.0,
        multiplier: 0.8,
    },
    BulkTier {
        min_amount: 500_000.0,
        multiplier: 0.9,
    },
    BulkTier {
        min_amount: 100_000.0,
        multiplier: 0.95,
    },
];

/// Adjuster for energy, priced in energy units.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyAdjuster;

impl ResourceAdjuster for EnergyAdjuster {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Energy
    }

    fn bulk_tiers(&self) -> &'static [BulkTier] {
        ENERGY_TIERS
    }

    fn soft_bound_warnings(&self, amount: f64) -> Vec<ValidationIssue> {
        if amount < MIN_USEFUL_ENERGY {
            vec![ValidationIssue::new(
                "amount",
                "low_energy_amount",
                format!("{amount} energy may be insufficient for one transaction"),
            )]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_tiers_do_not_compound() {
        let adjuster = EnergyAdjuster;
        assert_eq!(adjuster.bulk_multiplier(2_000_000.0), 0.8);
        assert_eq!(adjuster.bulk_multiplier(1_000_000.0), 0.8);
        assert_eq!(adjuster.bulk_multiplier(999_999.0), 0.9);
        assert_eq!(adjuster.bulk_multiplier(100_000.0), 0.95);
        assert_eq!(adjuster.bulk_multiplier(99_999.0), 1.0);
    }

    #[test]
    fn tiny_amount_warns() {
        assert_eq!(EnergyAdjuster.soft_bound_warnings(50.0).len(), 1);
        assert!(EnergyAdjuster.soft_bound_warnings(32_000.0).is_empty());
    }
}
