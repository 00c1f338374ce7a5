use energy_pricing_core::{ResourceType, ValidationIssue};

use super::{BulkTier, ResourceAdjuster};

const MIB: f64 = 1024.0 * 1024.0;

/// Bandwidth amounts (bytes) below this may not cover a single transaction.
pub const MIN_USEFUL_BANDWIDTH: f64 = 1024.0;

const BANDWIDTH_TIERS: &[BulkTier] = &[
    BulkTier {
        min_amount: 50.0 * MIB,
        multiplier: 0.8,
    },
    BulkTier {
        min_amount: 10.0 * MIB,
        multiplier: 0.9,
    },
    BulkTier {
        min_amount: MIB,
        multiplier: 0.95,
    },
];

/// Adjuster for bandwidth, priced in bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandwidthAdjuster;

impl ResourceAdjuster for BandwidthAdjuster {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Bandwidth
    }

    fn bulk_tiers(&self) -> &'static [BulkTier] {
        BANDWIDTH_TIERS
    }

    fn soft_bound_warnings(&self, amount: f64) -> Vec<ValidationIssue> {
        if amount < MIN_USEFUL_BANDWIDTH {
            vec![ValidationIssue::new(
                "amount",
                "low_bandwidth_amount",
                format!("{amount} bytes of bandwidth may be insufficient"),
            )]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjuster::NetworkLoad;
    use energy_pricing_core::CalculationInput;

    #[test]
    fn sixty_mib_gets_only_the_top_tier() {
        let input = CalculationInput::bandwidth(1, 60.0 * MIB);

        let adjustment = BandwidthAdjuster.adjust(1.0, &input, NetworkLoad::Medium);

        assert_eq!(adjustment.price, 0.8);
        assert_eq!(adjustment.applied.len(), 1);
        assert_eq!(adjustment.applied[0].multiplier, 0.8);
    }

    #[test]
    fn mid_tiers() {
        assert_eq!(BandwidthAdjuster.bulk_multiplier(10.0 * MIB), 0.9);
        assert_eq!(BandwidthAdjuster.bulk_multiplier(2.0 * MIB), 0.95);
        assert_eq!(BandwidthAdjuster.bulk_multiplier(1000.0), 1.0);
    }

    #[test]
    fn under_a_kilobyte_warns() {
        assert_eq!(BandwidthAdjuster.soft_bound_warnings(512.0)[0].code, "low_bandwidth_amount");
    }
}
