//! Registry validation errors.

use thiserror::Error;

use crate::tier::AccessTier;

/// Errors raised while validating registry configuration at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two entries share the same id.
    #[error("duplicate registry entry: {0}")]
    DuplicateEntry(String),

    /// More than one default model for the same tier.
    #[error("duplicate default model for tier {0}")]
    DuplicateDefault(AccessTier),

    /// A tool references a model that is not registered.
    #[error("tool '{tool}' references unknown model '{model}'")]
    UnknownModel {
        /// The tool with the dangling reference.
        tool: String,
        /// The referenced model id.
        model: String,
    },

    /// An entry has a negative base cost.
    #[error("entry '{0}' has a negative cost")]
    NegativeCost(String),

    /// An entry has a negative daily free limit.
    #[error("entry '{0}' has a negative daily free limit")]
    NegativeLimit(String),

    /// A lower-tier entry costs more than a higher tier's cheapest entry.
    #[error(
        "tier ladder violation: '{entry}' ({tier}) costs {cost}, \
         above the cheapest {above} entry at {ceiling}"
    )]
    TierLadderViolation {
        /// The offending entry id.
        entry: String,
        /// The tier the entry requires.
        tier: AccessTier,
        /// The entry's effective cost.
        cost: i64,
        /// The higher tier it undercuts.
        above: AccessTier,
        /// The cheapest cost offered at that higher tier.
        ceiling: i64,
    },
}
