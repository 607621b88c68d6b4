//! Registered tool entries.

use serde::{Deserialize, Serialize};

use crate::tier::AccessTier;

/// A tool the assistant can call, with its credit requirements.
///
/// Tools may be bound to a specific model; the model's base cost is then
/// added to the tool's own cost when the action is billed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    /// Stable tool identifier, e.g. `web_search`.
    pub id: String,
    /// Short description surfaced when access is denied.
    pub description: String,
    /// Minimum tier required to run the tool.
    pub tier_required: AccessTier,
    /// Credit cost on top of the bound model's cost.
    pub base_cost: i64,
    /// Free uses per UTC day (0 = paid only).
    #[serde(default)]
    pub daily_free_limit: i64,
    /// Model this tool runs on, or `None` for the orchestrator's model.
    #[serde(default)]
    pub model_id: Option<String>,
}
