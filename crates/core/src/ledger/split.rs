//! The dual-pool split algorithm.
//!
//! A paid action draws from the shared chat pool first and the personal user
//! pool second. The split is computed up front from both balances so the
//! caller can apply it all-or-nothing: either both portions are affordable
//! or nothing is debited at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a reservation's cost is divided across the two pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSplit {
    /// Portion drawn from the shared chat pool.
    pub chat_portion: i64,
    /// Portion drawn from the personal user pool.
    pub user_portion: i64,
}

/// Errors from computing a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SplitError {
    /// The requested cost is zero or negative.
    #[error("reservation cost must be positive, got {0}")]
    InvalidCost(i64),

    /// The combined pools cannot cover the cost.
    #[error(
        "insufficient credits: cost {cost} exceeds chat {chat_balance} + user {user_balance}"
    )]
    InsufficientCredits {
        /// The requested cost.
        cost: i64,
        /// Balance of the chat pool at decision time.
        chat_balance: i64,
        /// Balance of the user pool at decision time.
        user_balance: i64,
    },
}

impl PoolSplit {
    /// Splits `cost` across the two pools, chat pool first.
    ///
    /// `chat_balance` is 0 when the conversation has no shared pool (a
    /// private chat), which charges the whole cost to the user pool.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::InvalidCost`] for a non-positive cost and
    /// [`SplitError::InsufficientCredits`] when the remainder after draining
    /// the chat pool exceeds the user balance.
    pub fn compute(cost: i64, chat_balance: i64, user_balance: i64) -> Result<Self, SplitError> {
        if cost <= 0 {
            return Err(SplitError::InvalidCost(cost));
        }

        let chat_portion = cost.min(chat_balance.max(0));
        let user_portion = cost - chat_portion;

        if user_portion > user_balance.max(0) {
            return Err(SplitError::InsufficientCredits {
                cost,
                chat_balance,
                user_balance,
            });
        }

        Ok(Self {
            chat_portion,
            user_portion,
        })
    }

    /// Total amount covered by both portions.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.chat_portion + self.user_portion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_pool_is_drained_first() {
        let split = PoolSplit::compute(8, 5, 10).unwrap();
        assert_eq!(split.chat_portion, 5);
        assert_eq!(split.user_portion, 3);
    }

    #[test]
    fn test_chat_pool_covers_whole_cost() {
        let split = PoolSplit::compute(4, 20, 0).unwrap();
        assert_eq!(split.chat_portion, 4);
        assert_eq!(split.user_portion, 0);
    }

    #[test]
    fn test_missing_chat_pool_charges_user() {
        let split = PoolSplit::compute(8, 0, 10).unwrap();
        assert_eq!(split.chat_portion, 0);
        assert_eq!(split.user_portion, 8);
    }

    #[test]
    fn test_insufficient_combined_balance() {
        let err = PoolSplit::compute(8, 2, 3).unwrap_err();
        assert_eq!(
            err,
            SplitError::InsufficientCredits {
                cost: 8,
                chat_balance: 2,
                user_balance: 3,
            }
        );
    }

    #[test]
    fn test_exact_combined_balance_is_allowed() {
        let split = PoolSplit::compute(5, 2, 3).unwrap();
        assert_eq!(split.chat_portion, 2);
        assert_eq!(split.user_portion, 3);
    }

    #[test]
    fn test_non_positive_cost_is_rejected() {
        assert_eq!(
            PoolSplit::compute(0, 10, 10).unwrap_err(),
            SplitError::InvalidCost(0)
        );
        assert_eq!(
            PoolSplit::compute(-3, 10, 10).unwrap_err(),
            SplitError::InvalidCost(-3)
        );
    }

    #[test]
    fn test_negative_balances_are_treated_as_empty() {
        // Balances come from checked storage and cannot go negative; a
        // defensive caller still gets a sane split.
        let err = PoolSplit::compute(1, -5, -5).unwrap_err();
        assert!(matches!(err, SplitError::InsufficientCredits { .. }));
    }
}
