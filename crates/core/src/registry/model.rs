//! Registered model entries.

use serde::{Deserialize, Serialize};

use crate::tier::AccessTier;

/// A model that can be invoked through the platform, with its credit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Stable model identifier, e.g. `nimbus-mini`.
    pub id: String,
    /// Human-readable name for surfacing to users.
    pub display_name: String,
    /// Minimum tier required to invoke this model.
    pub tier_required: AccessTier,
    /// Credit cost of one invocation.
    pub base_cost: i64,
    /// Free uses per UTC day (0 = paid only).
    #[serde(default)]
    pub daily_free_limit: i64,
    /// Whether this is the default orchestration model for its tier.
    #[serde(default)]
    pub is_default: bool,
}
