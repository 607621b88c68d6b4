//! Property tests for the dual-pool split algorithm.

use proptest::prelude::*;

use super::split::{PoolSplit, SplitError};

fn balance_strategy() -> impl Strategy<Value = i64> {
    0i64..1_000_000
}

fn cost_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Portions always sum to the requested cost.
    #[test]
    fn prop_portions_sum_to_cost(
        cost in cost_strategy(),
        chat in balance_strategy(),
        user in balance_strategy(),
    ) {
        if let Ok(split) = PoolSplit::compute(cost, chat, user) {
            prop_assert_eq!(split.total(), cost);
        }
    }

    /// The chat pool is always consumed first, up to its balance.
    #[test]
    fn prop_chat_pool_consumed_first(
        cost in cost_strategy(),
        chat in balance_strategy(),
        user in balance_strategy(),
    ) {
        if let Ok(split) = PoolSplit::compute(cost, chat, user) {
            prop_assert_eq!(split.chat_portion, cost.min(chat));
        }
    }

    /// No portion ever exceeds its pool's balance or goes negative.
    #[test]
    fn prop_portions_within_balances(
        cost in cost_strategy(),
        chat in balance_strategy(),
        user in balance_strategy(),
    ) {
        if let Ok(split) = PoolSplit::compute(cost, chat, user) {
            prop_assert!(split.chat_portion >= 0);
            prop_assert!(split.user_portion >= 0);
            prop_assert!(split.chat_portion <= chat);
            prop_assert!(split.user_portion <= user);
        }
    }

    /// The split fails exactly when the combined pools cannot cover the cost.
    #[test]
    fn prop_insufficient_iff_combined_short(
        cost in cost_strategy(),
        chat in balance_strategy(),
        user in balance_strategy(),
    ) {
        let result = PoolSplit::compute(cost, chat, user);
        if cost > chat + user {
            let is_insufficient =
                matches!(result, Err(SplitError::InsufficientCredits { .. }));
            prop_assert!(is_insufficient);
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
