//! Static registry of priced models and tools.
//!
//! The registry is read-only input to the tier resolver: it is loaded once
//! at startup, validated, and never mutated at runtime. Each entry carries
//! the tier it requires, its base cost in credits, and an optional free
//! daily quota.

pub mod builtin;
pub mod error;
pub mod model;
pub mod tool;

mod validation;

#[cfg(test)]
mod validation_props;

pub use builtin::builtin;
pub use error::RegistryError;
pub use model::ModelEntry;
pub use tool::ToolEntry;

use std::collections::BTreeMap;

use crate::tier::AccessTier;

/// Resolved cost and gating data for a single action.
///
/// An action id names either a tool or a model invocation; the registry
/// flattens both into this shape for the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    /// The action id as the caller supplied it.
    pub action_id: String,
    /// Minimum tier required to run the action at all.
    pub tier_required: AccessTier,
    /// Total credit cost of one paid use.
    pub cost: i64,
    /// Free uses per UTC day (0 = paid only).
    pub daily_free_limit: i64,
}

/// Immutable catalog of registered models and tools.
#[derive(Debug, Clone)]
pub struct Registry {
    models: BTreeMap<String, ModelEntry>,
    tools: BTreeMap<String, ToolEntry>,
}

impl Registry {
    /// Builds a registry from entries, validating all load-time invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for duplicate ids, duplicate defaults,
    /// dangling tool → model references, negative costs/limits, or a
    /// non-monotonic tier ladder.
    pub fn new(models: Vec<ModelEntry>, tools: Vec<ToolEntry>) -> Result<Self, RegistryError> {
        validation::validate(&models, &tools)?;

        Ok(Self {
            models: models.into_iter().map(|m| (m.id.clone(), m)).collect(),
            tools: tools.into_iter().map(|t| (t.id.clone(), t)).collect(),
        })
    }

    /// Looks up a model by id.
    #[must_use]
    pub fn model(&self, id: &str) -> Option<&ModelEntry> {
        self.models.get(id)
    }

    /// Looks up a tool by id.
    #[must_use]
    pub fn tool(&self, id: &str) -> Option<&ToolEntry> {
        self.tools.get(id)
    }

    /// Resolves an action id (tool first, then model) to its cost entry.
    ///
    /// A tool bound to a model adds that model's base cost on top of its
    /// own, mirroring how the invocation is actually billed.
    #[must_use]
    pub fn action(&self, action_id: &str) -> Option<ActionEntry> {
        if let Some(tool) = self.tools.get(action_id) {
            let model_cost = tool
                .model_id
                .as_deref()
                .and_then(|id| self.models.get(id))
                .map_or(0, |m| m.base_cost);
            return Some(ActionEntry {
                action_id: tool.id.clone(),
                tier_required: tool.tier_required,
                cost: tool.base_cost + model_cost,
                daily_free_limit: tool.daily_free_limit,
            });
        }

        self.models.get(action_id).map(|model| ActionEntry {
            action_id: model.id.clone(),
            tier_required: model.tier_required,
            cost: model.base_cost,
            daily_free_limit: model.daily_free_limit,
        })
    }

    /// Returns the default orchestration model for a tier.
    #[must_use]
    pub fn default_model(&self, tier: AccessTier) -> Option<&ModelEntry> {
        self.models
            .values()
            .find(|m| m.is_default && m.tier_required == tier)
    }

    /// Iterates over all registered models.
    pub fn models(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.values()
    }

    /// Iterates over all registered tools.
    pub fn tools(&self) -> impl Iterator<Item = &ToolEntry> {
        self.tools.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_resolves_tool_with_model_cost() {
        let registry = builtin();
        let action = registry.action("render_image").unwrap();
        let tool = registry.tool("render_image").unwrap();
        let model = registry.model(tool.model_id.as_deref().unwrap()).unwrap();
        assert_eq!(action.cost, tool.base_cost + model.base_cost);
    }

    #[test]
    fn test_action_resolves_bare_model() {
        let registry = builtin();
        let action = registry.action("nimbus").unwrap();
        assert_eq!(action.cost, registry.model("nimbus").unwrap().base_cost);
    }

    #[test]
    fn test_unknown_action_is_none() {
        assert!(builtin().action("no_such_action").is_none());
    }

    #[test]
    fn test_each_tier_has_a_default_model() {
        let registry = builtin();
        assert!(registry.default_model(AccessTier::Free).is_some());
        assert!(registry.default_model(AccessTier::Paid).is_some());
    }
}
