//! Daily usage counters for free-tier rate limits.
//!
//! Counters are keyed by (account, action, UTC day). A day boundary starts
//! a fresh row; finished days are never mutated, which keeps the table
//! append-only over time and safe to read without locks.

use chrono::{NaiveDate, Utc};
use scrip_shared::AccountRef;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::daily_usage;

use super::account::{AccountError, AccountStore};
use super::retry::{is_transient_conflict, RetryPolicy};

/// Error types for usage counter operations.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// Store contention outlasted the bounded retry loop.
    #[error("concurrency conflict after {attempts} attempts, safe to retry")]
    ConcurrencyConflict {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Account-level failure.
    #[error(transparent)]
    Account(#[from] AccountError),
}

impl From<sea_orm::DbErr> for UsageError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Account(AccountError::Database(err))
    }
}

/// The current UTC calendar day.
#[must_use]
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Repository for per-day usage counters.
pub struct UsageCounter {
    db: DatabaseConnection,
    retry: RetryPolicy,
}

impl UsageCounter {
    /// Creates a new usage counter.
    #[must_use]
    pub const fn new(db: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { db, retry }
    }

    /// Reads the count for a day without locking; 0 when absent.
    pub async fn get_daily_usage(
        &self,
        account: AccountRef,
        action_id: &str,
        day: NaiveDate,
    ) -> Result<i64, UsageError> {
        let Some(row) = AccountStore::find_by_ref(&self.db, account).await? else {
            return Ok(0);
        };

        let found = daily_usage::Entity::find()
            .filter(daily_usage::Column::AccountId.eq(row.id))
            .filter(daily_usage::Column::ActionId.eq(action_id))
            .filter(daily_usage::Column::Day.eq(day))
            .one(&self.db)
            .await?;

        Ok(found.map_or(0, |row| row.count))
    }

    /// Atomically increments the day's counter if it is under `limit`.
    ///
    /// Returns the counter value and whether the use was admitted. Call
    /// this only on confirmed use; a denied check must not consume quota.
    pub async fn increment_if_under_limit(
        &self,
        account: AccountRef,
        action_id: &str,
        limit: i64,
        day: NaiveDate,
    ) -> Result<(i64, bool), UsageError> {
        if limit <= 0 {
            return Ok((0, false));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_increment(account, action_id, limit, day).await {
                Err(UsageError::Account(AccountError::Database(err)))
                    if is_transient_conflict(&err) =>
                {
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            account = %account,
                            action = action_id,
                            attempts = attempt,
                            "usage increment exhausted conflict retries"
                        );
                        return Err(UsageError::ConcurrencyConflict { attempts: attempt });
                    }
                    tokio::time::sleep(self.retry.backoff_delay(attempt)).await;
                }
                other => return other,
            }
        }
    }

    async fn try_increment(
        &self,
        account: AccountRef,
        action_id: &str,
        limit: i64,
        day: NaiveDate,
    ) -> Result<(i64, bool), UsageError> {
        let txn = self.db.begin().await?;
        let account_row = AccountStore::lock_or_create(&txn, account).await?;

        let existing = Self::lock_row(&txn, account_row.id, action_id, day).await?;
        let (count, allowed) = admit(existing.as_ref().map(|row| row.count), limit);

        match existing {
            None if allowed => {
                let now = Utc::now().into();
                let row = daily_usage::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    account_id: Set(account_row.id),
                    action_id: Set(action_id.to_string()),
                    day: Set(day),
                    count: Set(count),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                row.insert(&txn).await?;
            }
            Some(row) if allowed => {
                let mut active: daily_usage::ActiveModel = row.into();
                active.count = Set(count);
                active.updated_at = Set(Utc::now().into());
                active.update(&txn).await?;
            }
            _ => {}
        }

        txn.commit().await?;
        debug!(
            account = %account,
            action = action_id,
            %day,
            count,
            allowed,
            "daily usage checked"
        );
        Ok((count, allowed))
    }

    async fn lock_row(
        txn: &DatabaseTransaction,
        account_id: Uuid,
        action_id: &str,
        day: NaiveDate,
    ) -> Result<Option<daily_usage::Model>, UsageError> {
        let found = daily_usage::Entity::find()
            .filter(daily_usage::Column::AccountId.eq(account_id))
            .filter(daily_usage::Column::ActionId.eq(action_id))
            .filter(daily_usage::Column::Day.eq(day))
            .lock_exclusive()
            .one(txn)
            .await?;
        Ok(found)
    }
}

/// The increment-and-check decision table.
///
/// Returns the counter value after the decision and whether the use was
/// admitted. The counter is only advanced on admission.
pub(crate) fn admit(current: Option<i64>, limit: i64) -> (i64, bool) {
    match current {
        _ if limit <= 0 => (current.unwrap_or(0), false),
        None => (1, true),
        Some(count) if count >= limit => (count, false),
        Some(count) => (count + 1, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_sequence_hits_limit() {
        // Four consecutive uses against a limit of 3.
        let mut current = None;
        let mut decisions = Vec::new();
        for _ in 0..4 {
            let (count, allowed) = admit(current, 3);
            if allowed {
                current = Some(count);
            }
            decisions.push(allowed);
        }
        assert_eq!(decisions, vec![true, true, true, false]);
        assert_eq!(current, Some(3));
    }

    #[test]
    fn test_admit_fresh_day_starts_at_one() {
        assert_eq!(admit(None, 3), (1, true));
    }

    #[test]
    fn test_admit_at_limit_does_not_advance() {
        assert_eq!(admit(Some(3), 3), (3, false));
        assert_eq!(admit(Some(5), 3), (5, false));
    }

    #[test]
    fn test_admit_zero_limit_is_paid_only() {
        assert_eq!(admit(None, 0), (0, false));
        assert_eq!(admit(Some(2), 0), (2, false));
    }
}
