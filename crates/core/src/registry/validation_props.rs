//! Property tests for tier ladder validation.

use proptest::prelude::*;

use crate::tier::AccessTier;

use super::model::ModelEntry;
use super::validation::validate;
use super::Registry;

fn model(id: String, tier_required: AccessTier, base_cost: i64) -> ModelEntry {
    ModelEntry {
        display_name: id.clone(),
        id,
        tier_required,
        base_cost,
        daily_free_limit: 0,
        is_default: false,
    }
}

fn tier_strategy() -> impl Strategy<Value = AccessTier> {
    prop_oneof![Just(AccessTier::Free), Just(AccessTier::Paid)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A catalog is accepted exactly when every free entry is at or below
    /// the cheapest paid entry.
    #[test]
    fn prop_ladder_accepts_iff_monotonic(
        costs in prop::collection::vec((tier_strategy(), 0i64..100), 1..8),
    ) {
        let models: Vec<ModelEntry> = costs
            .iter()
            .enumerate()
            .map(|(i, (tier, cost))| model(format!("m{i}"), *tier, *cost))
            .collect();

        let paid_floor = costs
            .iter()
            .filter(|(tier, _)| *tier == AccessTier::Paid)
            .map(|(_, cost)| *cost)
            .min();
        let free_ceiling = costs
            .iter()
            .filter(|(tier, _)| *tier == AccessTier::Free)
            .map(|(_, cost)| *cost)
            .max();

        let monotonic = match (free_ceiling, paid_floor) {
            (Some(ceiling), Some(floor)) => ceiling <= floor,
            _ => true,
        };

        prop_assert_eq!(validate(&models, &[]).is_ok(), monotonic);
    }

    /// A validated catalog always resolves every entry it was built from.
    #[test]
    fn prop_registry_resolves_all_entries(
        costs in prop::collection::vec(0i64..50, 1..6),
    ) {
        // All entries on one tier: trivially monotonic.
        let models: Vec<ModelEntry> = costs
            .iter()
            .enumerate()
            .map(|(i, cost)| model(format!("m{i}"), AccessTier::Paid, *cost))
            .collect();

        let registry = Registry::new(models.clone(), vec![]).unwrap();
        for entry in &models {
            let action = registry.action(&entry.id).unwrap();
            prop_assert_eq!(action.cost, entry.base_cost);
            prop_assert_eq!(action.tier_required, entry.tier_required);
        }
    }
}
