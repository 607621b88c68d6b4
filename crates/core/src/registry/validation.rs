//! Load-time validation of registry configuration.
//!
//! A broken price ladder is a configuration bug that silently undercharges
//! users, so the registry refuses to load at all instead of limping along.

use std::collections::{BTreeMap, HashSet};

use crate::tier::AccessTier;

use super::error::RegistryError;
use super::model::ModelEntry;
use super::tool::ToolEntry;

/// Validates all registry invariants before the catalog is built.
pub(super) fn validate(models: &[ModelEntry], tools: &[ToolEntry]) -> Result<(), RegistryError> {
    let mut ids = HashSet::new();
    for id in models.iter().map(|m| &m.id).chain(tools.iter().map(|t| &t.id)) {
        if !ids.insert(id.as_str()) {
            return Err(RegistryError::DuplicateEntry(id.clone()));
        }
    }

    let mut defaults = HashSet::new();
    for model in models.iter().filter(|m| m.is_default) {
        if !defaults.insert(model.tier_required) {
            return Err(RegistryError::DuplicateDefault(model.tier_required));
        }
    }

    let model_costs: BTreeMap<&str, i64> =
        models.iter().map(|m| (m.id.as_str(), m.base_cost)).collect();

    for model in models {
        if model.base_cost < 0 {
            return Err(RegistryError::NegativeCost(model.id.clone()));
        }
        if model.daily_free_limit < 0 {
            return Err(RegistryError::NegativeLimit(model.id.clone()));
        }
    }

    for tool in tools {
        if tool.base_cost < 0 {
            return Err(RegistryError::NegativeCost(tool.id.clone()));
        }
        if tool.daily_free_limit < 0 {
            return Err(RegistryError::NegativeLimit(tool.id.clone()));
        }
        if let Some(model_id) = tool.model_id.as_deref() {
            if !model_costs.contains_key(model_id) {
                return Err(RegistryError::UnknownModel {
                    tool: tool.id.clone(),
                    model: model_id.to_string(),
                });
            }
        }
    }

    validate_tier_ladder(models, tools, &model_costs)
}

/// Effective billed cost of each entry, tagged with its required tier.
fn effective_costs<'a>(
    models: &'a [ModelEntry],
    tools: &'a [ToolEntry],
    model_costs: &BTreeMap<&str, i64>,
) -> Vec<(&'a str, AccessTier, i64)> {
    let model_entries = models
        .iter()
        .map(|m| (m.id.as_str(), m.tier_required, m.base_cost));
    let tool_entries = tools.iter().map(|t| {
        let model_cost = t
            .model_id
            .as_deref()
            .and_then(|id| model_costs.get(id))
            .copied()
            .unwrap_or(0);
        (t.id.as_str(), t.tier_required, t.base_cost + model_cost)
    });
    model_entries.chain(tool_entries).collect()
}

/// The ladder is monotonic: no entry requiring a lower tier may cost more
/// than the cheapest entry requiring a higher tier.
fn validate_tier_ladder(
    models: &[ModelEntry],
    tools: &[ToolEntry],
    model_costs: &BTreeMap<&str, i64>,
) -> Result<(), RegistryError> {
    let entries = effective_costs(models, tools, model_costs);

    let mut cheapest: BTreeMap<AccessTier, i64> = BTreeMap::new();
    for (_, tier, cost) in &entries {
        let slot = cheapest.entry(*tier).or_insert(i64::MAX);
        *slot = (*slot).min(*cost);
    }

    for (entry, tier, cost) in &entries {
        for (above, ceiling) in cheapest.range((
            std::ops::Bound::Excluded(*tier),
            std::ops::Bound::Unbounded,
        )) {
            if cost > ceiling {
                return Err(RegistryError::TierLadderViolation {
                    entry: (*entry).to_string(),
                    tier: *tier,
                    cost: *cost,
                    above: *above,
                    ceiling: *ceiling,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str, tier: AccessTier, cost: i64) -> ModelEntry {
        ModelEntry {
            id: id.to_string(),
            display_name: id.to_string(),
            tier_required: tier,
            base_cost: cost,
            daily_free_limit: 0,
            is_default: false,
        }
    }

    fn tool(id: &str, tier: AccessTier, cost: i64, model_id: Option<&str>) -> ToolEntry {
        ToolEntry {
            id: id.to_string(),
            description: String::new(),
            tier_required: tier,
            base_cost: cost,
            daily_free_limit: 0,
            model_id: model_id.map(str::to_string),
        }
    }

    #[test]
    fn test_monotonic_ladder_is_accepted() {
        let models = vec![
            model("mini", AccessTier::Free, 1),
            model("full", AccessTier::Paid, 3),
        ];
        assert!(validate(&models, &[]).is_ok());
    }

    #[test]
    fn test_free_entry_above_paid_floor_is_rejected() {
        let models = vec![
            model("mini", AccessTier::Free, 5),
            model("full", AccessTier::Paid, 3),
        ];
        let err = validate(&models, &[]).unwrap_err();
        assert!(matches!(err, RegistryError::TierLadderViolation { .. }));
    }

    #[test]
    fn test_tool_effective_cost_feeds_the_ladder() {
        // Tool itself is cheap but its bound model pushes the effective
        // cost above the paid floor.
        let models = vec![
            model("mini", AccessTier::Free, 1),
            model("full", AccessTier::Paid, 3),
        ];
        let tools = vec![tool("sketch", AccessTier::Free, 4, Some("mini"))];
        let err = validate(&models, &tools).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::TierLadderViolation { ref entry, .. } if entry == "sketch"
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected_across_kinds() {
        let models = vec![model("search", AccessTier::Free, 0)];
        let tools = vec![tool("search", AccessTier::Free, 0, None)];
        assert_eq!(
            validate(&models, &tools).unwrap_err(),
            RegistryError::DuplicateEntry("search".to_string())
        );
    }

    #[test]
    fn test_duplicate_defaults_rejected() {
        let mut a = model("a", AccessTier::Paid, 3);
        let mut b = model("b", AccessTier::Paid, 4);
        a.is_default = true;
        b.is_default = true;
        assert_eq!(
            validate(&[a, b], &[]).unwrap_err(),
            RegistryError::DuplicateDefault(AccessTier::Paid)
        );
    }

    #[test]
    fn test_dangling_model_reference_rejected() {
        let tools = vec![tool("sketch", AccessTier::Paid, 4, Some("missing"))];
        assert!(matches!(
            validate(&[], &tools).unwrap_err(),
            RegistryError::UnknownModel { .. }
        ));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let models = vec![model("mini", AccessTier::Free, -1)];
        assert_eq!(
            validate(&models, &[]).unwrap_err(),
            RegistryError::NegativeCost("mini".to_string())
        );
    }
}
