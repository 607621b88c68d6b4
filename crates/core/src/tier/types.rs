//! Domain types for access tiers and credit check decisions.

use serde::{Deserialize, Serialize};

/// Access level gating which models/tools and limits apply.
///
/// The derived ordering (`Free < Paid`) is used by the registry's tier
/// ladder validation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// No credits anywhere; daily limits apply.
    Free,
    /// At least one pool holds credits.
    Paid,
}

impl AccessTier {
    /// Conversation context budget for orchestration at this tier,
    /// in messages.
    #[must_use]
    pub const fn context_messages(self) -> u32 {
        match self {
            Self::Free => 10,
            Self::Paid => 100,
        }
    }
}

impl std::fmt::Display for AccessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => f.write_str("free"),
            Self::Paid => f.write_str("paid"),
        }
    }
}

/// Which pool funds an allowed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditSource {
    /// Covered by the daily free quota; nothing is debited.
    Free,
    /// The shared chat pool is drawn on first.
    Chat,
    /// The personal user pool covers the cost (possibly after the chat
    /// pool is exhausted).
    User,
    /// The action is not allowed.
    Rejected,
}

/// Why a credit check rejected the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Combined pools cannot cover the cost.
    InsufficientCredits,
    /// The action's free daily quota is exhausted and credits cannot
    /// cover a paid use.
    DailyLimitExceeded,
}

/// Result of checking credit availability for an action.
///
/// Used both as a pre-check (can this run?) and to carry the cost the
/// caller should reserve on confirmed use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCheckResult {
    /// Whether the action may proceed.
    pub allowed: bool,
    /// Access tier derived from the current balances.
    pub tier: AccessTier,
    /// Credits the caller must reserve (0 for a free use).
    pub cost: i64,
    /// Which pool funds the action.
    pub source: CreditSource,
    /// Combined credits left after the cost is taken (paid uses only).
    pub credits_remaining: Option<i64>,
    /// Free uses left today after this one (free uses only).
    pub free_remaining: Option<i64>,
    /// Reason for rejection, when `allowed` is false.
    pub reject_reason: Option<RejectReason>,
}

impl CreditCheckResult {
    /// Whether this is a free-quota use (no credits deducted).
    #[must_use]
    pub fn is_free_use(&self) -> bool {
        matches!(self.source, CreditSource::Free)
    }

    /// Whether this use draws on paid credits.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        matches!(self.source, CreditSource::Chat | CreditSource::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(AccessTier::Free < AccessTier::Paid);
    }

    #[test]
    fn test_context_budget_by_tier() {
        assert_eq!(AccessTier::Free.context_messages(), 10);
        assert_eq!(AccessTier::Paid.context_messages(), 100);
    }
}
