//! Pure credit check decisions.
//!
//! The resolver never mutates anything: it is a function of the current
//! balances, the registry entry for the action, and today's usage count.
//! A stale read here is acceptable because the subsequent `Reserve` is the
//! true gate and re-validates balances under row locks.

use crate::registry::ActionEntry;

use super::types::{AccessTier, CreditCheckResult, CreditSource, RejectReason};

/// Stateless resolver mapping balances + registry data to a decision.
pub struct TierResolver;

impl TierResolver {
    /// Derives the access tier from the two pool balances.
    ///
    /// Paid as soon as either pool holds credits.
    #[must_use]
    pub fn access_tier(chat_balance: i64, user_balance: i64) -> AccessTier {
        if chat_balance > 0 || user_balance > 0 {
            AccessTier::Paid
        } else {
            AccessTier::Free
        }
    }

    /// Checks whether an action may run and what it would cost.
    ///
    /// Decision order mirrors how credits are consumed:
    /// 1. Free daily quota, when the action has one and it is not exhausted
    /// 2. Paid use funded by the chat pool first, user pool second
    /// 3. Rejection with a reason the caller can surface
    #[must_use]
    pub fn resolve(
        action: &ActionEntry,
        chat_balance: i64,
        user_balance: i64,
        used_today: i64,
    ) -> CreditCheckResult {
        let tier = Self::access_tier(chat_balance, user_balance);

        if action.daily_free_limit > 0 && used_today < action.daily_free_limit {
            return CreditCheckResult {
                allowed: true,
                tier,
                cost: 0,
                source: CreditSource::Free,
                credits_remaining: None,
                free_remaining: Some(action.daily_free_limit - used_today - 1),
                reject_reason: None,
            };
        }

        let combined = chat_balance + user_balance;
        if tier >= action.tier_required && combined >= action.cost {
            let source = if chat_balance > 0 {
                CreditSource::Chat
            } else {
                CreditSource::User
            };
            return CreditCheckResult {
                allowed: true,
                tier,
                cost: action.cost,
                source,
                credits_remaining: Some(combined - action.cost),
                free_remaining: None,
                reject_reason: None,
            };
        }

        let reject_reason = if action.daily_free_limit > 0 {
            RejectReason::DailyLimitExceeded
        } else {
            RejectReason::InsufficientCredits
        };

        CreditCheckResult {
            allowed: false,
            tier,
            cost: action.cost,
            source: CreditSource::Rejected,
            credits_remaining: Some(combined),
            free_remaining: Some(0),
            reject_reason: Some(reject_reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::tier::types::AccessTier;

    fn paid_action(cost: i64) -> ActionEntry {
        ActionEntry {
            action_id: "render_image".to_string(),
            tier_required: AccessTier::Paid,
            cost,
            daily_free_limit: 0,
        }
    }

    fn limited_action(cost: i64, limit: i64) -> ActionEntry {
        ActionEntry {
            action_id: "web_search".to_string(),
            tier_required: AccessTier::Free,
            cost,
            daily_free_limit: limit,
        }
    }

    #[rstest]
    #[case(0, 0, AccessTier::Free)]
    #[case(1, 0, AccessTier::Paid)]
    #[case(0, 1, AccessTier::Paid)]
    #[case(5, 5, AccessTier::Paid)]
    fn test_access_tier(#[case] chat: i64, #[case] user: i64, #[case] expected: AccessTier) {
        assert_eq!(TierResolver::access_tier(chat, user), expected);
    }

    #[test]
    fn test_free_quota_wins_even_with_credits() {
        let result = TierResolver::resolve(&limited_action(3, 10), 50, 50, 2);
        assert!(result.allowed);
        assert!(result.is_free_use());
        assert_eq!(result.cost, 0);
        assert_eq!(result.free_remaining, Some(7));
    }

    #[test]
    fn test_exhausted_quota_falls_back_to_credits() {
        let result = TierResolver::resolve(&limited_action(3, 10), 50, 0, 10);
        assert!(result.allowed);
        assert!(result.is_paid());
        assert_eq!(result.cost, 3);
        assert_eq!(result.source, CreditSource::Chat);
        assert_eq!(result.credits_remaining, Some(47));
    }

    #[test]
    fn test_exhausted_quota_without_credits_reports_limit() {
        let result = TierResolver::resolve(&limited_action(3, 10), 0, 0, 10);
        assert!(!result.allowed);
        assert_eq!(result.reject_reason, Some(RejectReason::DailyLimitExceeded));
        assert_eq!(result.source, CreditSource::Rejected);
    }

    #[test]
    fn test_paid_action_allowed_across_pools() {
        // The chat pool covers part of the cost; the user pool covers the
        // rest, matching what Reserve will actually split.
        let result = TierResolver::resolve(&paid_action(8), 5, 10, 0);
        assert!(result.allowed);
        assert_eq!(result.source, CreditSource::Chat);
        assert_eq!(result.credits_remaining, Some(7));
    }

    #[test]
    fn test_paid_action_user_pool_only() {
        let result = TierResolver::resolve(&paid_action(8), 0, 10, 0);
        assert!(result.allowed);
        assert_eq!(result.source, CreditSource::User);
        assert_eq!(result.credits_remaining, Some(2));
    }

    #[test]
    fn test_paid_action_rejected_without_credits() {
        let result = TierResolver::resolve(&paid_action(8), 2, 3, 0);
        assert!(!result.allowed);
        assert_eq!(result.tier, AccessTier::Paid);
        assert_eq!(
            result.reject_reason,
            Some(RejectReason::InsufficientCredits)
        );
        assert_eq!(result.credits_remaining, Some(5));
    }

    #[test]
    fn test_free_user_cannot_run_paid_only_action() {
        let result = TierResolver::resolve(&paid_action(8), 0, 0, 0);
        assert!(!result.allowed);
        assert_eq!(result.tier, AccessTier::Free);
        assert_eq!(
            result.reject_reason,
            Some(RejectReason::InsufficientCredits)
        );
    }

    #[test]
    fn test_zero_cost_paid_gated_action_needs_paid_tier() {
        let action = ActionEntry {
            action_id: "priority_queue".to_string(),
            tier_required: AccessTier::Paid,
            cost: 0,
            daily_free_limit: 0,
        };
        let rejected = TierResolver::resolve(&action, 0, 0, 0);
        assert!(!rejected.allowed);

        let allowed = TierResolver::resolve(&action, 1, 0, 0);
        assert!(allowed.allowed);
        assert_eq!(allowed.cost, 0);
    }
}
