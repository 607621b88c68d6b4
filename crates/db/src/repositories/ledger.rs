//! Ledger engine: atomic reserve and release across the two pools.
//!
//! A reservation debits the chat pool first and the user pool second, all
//! inside one store transaction with both account rows locked in a fixed
//! order. Nothing is written unless the whole cost is covered, so no
//! intermediate state is ever observable. Releasing records compensating
//! refunds and is idempotent.

use scrip_core::ledger::{keys, PoolSplit, SplitError};
use scrip_shared::AccountRef;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{accounts, sea_orm_active_enums::TransactionKind};

use super::account::{AccountError, AccountStore, Posting};
use super::retry::{is_transient_conflict, RetryPolicy};

/// Error types for reserve/release operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Combined pools cannot cover the requested cost. Never retried: this
    /// is a business decision, not a transient fault.
    #[error(
        "insufficient credits: cost {cost} exceeds chat {chat_balance} + user {user_balance}"
    )]
    InsufficientCredits {
        /// The requested cost.
        cost: i64,
        /// Chat pool balance at decision time.
        chat_balance: i64,
        /// User pool balance at decision time.
        user_balance: i64,
    },

    /// Non-positive reservation cost.
    #[error("invalid reservation cost: {0}")]
    InvalidCost(i64),

    /// Same idempotency key replayed with a different cost.
    #[error("idempotency key '{key}' was already used for a different reservation")]
    IdempotencyMismatch {
        /// The conflicting key.
        key: String,
    },

    /// Store contention outlasted the bounded retry loop. Safe to retry
    /// from the top: reserve is idempotent on the caller's key.
    #[error("concurrency conflict after {attempts} attempts, safe to retry")]
    ConcurrencyConflict {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Account-level failure.
    #[error(transparent)]
    Account(#[from] AccountError),
}

impl From<sea_orm::DbErr> for LedgerError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Account(AccountError::Database(err))
    }
}

/// Input for a reservation.
#[derive(Debug, Clone)]
pub struct ReserveInput {
    /// Shared chat pool; absent in private conversations, which charges
    /// the whole cost to the user pool.
    pub chat: Option<AccountRef>,
    /// Personal user pool.
    pub user: AccountRef,
    /// Externally computed credit cost.
    pub cost: i64,
    /// Caller-stable key for this logical attempt; reused on retries.
    pub idempotency_key: String,
    /// Action being billed, for the audit trail.
    pub action_id: Option<String>,
}

/// One debit leg of a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationLeg {
    /// The pool this leg debited.
    pub account: AccountRef,
    /// The logged debit row.
    pub transaction_id: Uuid,
    /// Key the debit was recorded under; the release key derives from it.
    pub idempotency_key: String,
    /// Magnitude debited (positive).
    pub amount: i64,
}

/// Handle for a pending spend that can be compensated.
///
/// Committed by default: on action success no further call is needed. On
/// failure the caller releases it, and releasing twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// The caller's key for this logical attempt.
    pub idempotency_key: String,
    /// Debit legs, in the fixed account lock order.
    pub legs: Vec<ReservationLeg>,
}

impl Reservation {
    /// Total credits held by this reservation.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.legs.iter().map(|leg| leg.amount).sum()
    }
}

/// Engine for atomic reserve/release operations.
pub struct LedgerEngine {
    db: DatabaseConnection,
    retry: RetryPolicy,
}

impl LedgerEngine {
    /// Creates a new ledger engine.
    #[must_use]
    pub const fn new(db: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { db, retry }
    }

    /// Reserves `cost` credits against the chat pool first, user pool
    /// second.
    ///
    /// All-or-nothing: if the remainder after draining the chat pool
    /// exceeds the user balance, nothing is written and both balances are
    /// unchanged. Replaying the same idempotency key reconstructs the
    /// original reservation from the logged legs without new writes.
    pub async fn reserve(&self, input: &ReserveInput) -> Result<Reservation, LedgerError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_reserve(input).await {
                Err(LedgerError::Account(AccountError::Database(err)))
                    if is_transient_conflict(&err) =>
                {
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            key = %input.idempotency_key,
                            attempts = attempt,
                            "reserve exhausted conflict retries"
                        );
                        return Err(LedgerError::ConcurrencyConflict { attempts: attempt });
                    }
                    tokio::time::sleep(self.retry.backoff_delay(attempt)).await;
                }
                other => return other,
            }
        }
    }

    async fn try_reserve(&self, input: &ReserveInput) -> Result<Reservation, LedgerError> {
        if input.cost <= 0 {
            return Err(LedgerError::InvalidCost(input.cost));
        }

        let txn = self.db.begin().await?;

        // Lock both rows in ascending (kind, external_id) order; chat sorts
        // before user, so this matches the construction order below and
        // prevents lock-order deadlocks between concurrent reservations.
        let chat_row = match input.chat {
            Some(chat) => Some(AccountStore::lock_or_create(&txn, chat).await?),
            None => None,
        };
        let user_row = AccountStore::lock_or_create(&txn, input.user).await?;

        if let Some(reservation) =
            Self::find_existing(&txn, input, chat_row.as_ref(), &user_row).await?
        {
            txn.commit().await?;
            info!(key = %input.idempotency_key, "reserve replayed existing reservation");
            return Ok(reservation);
        }

        let chat_balance = chat_row.as_ref().map_or(0, |row| row.balance);
        let split =
            PoolSplit::compute(input.cost, chat_balance, user_row.balance).map_err(
                |err| match err {
                    SplitError::InvalidCost(cost) => LedgerError::InvalidCost(cost),
                    SplitError::InsufficientCredits {
                        cost,
                        chat_balance,
                        user_balance,
                    } => LedgerError::InsufficientCredits {
                        cost,
                        chat_balance,
                        user_balance,
                    },
                },
            )?;

        let mut planned: Vec<(AccountRef, &accounts::Model, i64, String)> = Vec::with_capacity(2);
        if let (Some(account), Some(row)) = (input.chat, chat_row.as_ref()) {
            planned.push((
                account,
                row,
                split.chat_portion,
                keys::chat_leg(&input.idempotency_key),
            ));
        }
        planned.push((
            input.user,
            &user_row,
            split.user_portion,
            keys::user_leg(&input.idempotency_key),
        ));

        let mut legs = Vec::with_capacity(planned.len());
        for (account, row, portion, key) in planned {
            if portion == 0 {
                continue;
            }
            let outcome = AccountStore::post(
                &txn,
                row,
                &Posting {
                    amount: -portion,
                    kind: TransactionKind::Debit,
                    idempotency_key: key.clone(),
                    reference_id: None,
                    action_id: input.action_id.clone(),
                },
            )
            .await?;
            legs.push(ReservationLeg {
                account,
                transaction_id: outcome.transaction_id,
                idempotency_key: key,
                amount: portion,
            });
        }

        txn.commit().await?;

        info!(
            key = %input.idempotency_key,
            cost = input.cost,
            chat_portion = split.chat_portion,
            user_portion = split.user_portion,
            "credits reserved"
        );

        Ok(Reservation {
            idempotency_key: input.idempotency_key.clone(),
            legs,
        })
    }

    /// Reconstructs a reservation already logged under the input's key.
    async fn find_existing(
        txn: &DatabaseTransaction,
        input: &ReserveInput,
        chat_row: Option<&accounts::Model>,
        user_row: &accounts::Model,
    ) -> Result<Option<Reservation>, LedgerError> {
        let mut legs = Vec::with_capacity(2);

        if let (Some(account), Some(row)) = (input.chat, chat_row) {
            let key = keys::chat_leg(&input.idempotency_key);
            if let Some(logged) = AccountStore::find_by_key(txn, row.id, &key).await? {
                legs.push(ReservationLeg {
                    account,
                    transaction_id: logged.id,
                    idempotency_key: key,
                    amount: -logged.amount,
                });
            }
        }

        let key = keys::user_leg(&input.idempotency_key);
        if let Some(logged) = AccountStore::find_by_key(txn, user_row.id, &key).await? {
            legs.push(ReservationLeg {
                account: input.user,
                transaction_id: logged.id,
                idempotency_key: key,
                amount: -logged.amount,
            });
        }

        if legs.is_empty() {
            return Ok(None);
        }

        let reservation = Reservation {
            idempotency_key: input.idempotency_key.clone(),
            legs,
        };
        verify_replay_total(&reservation, input.cost)?;
        Ok(Some(reservation))
    }

    /// Releases a reservation by recording compensating refunds.
    ///
    /// Idempotent: each compensation is keyed off its leg's key, so a
    /// second release finds the keys already logged and writes nothing.
    pub async fn release(&self, reservation: &Reservation) -> Result<(), LedgerError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_release(reservation).await {
                Err(LedgerError::Account(AccountError::Database(err)))
                    if is_transient_conflict(&err) =>
                {
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            key = %reservation.idempotency_key,
                            attempts = attempt,
                            "release exhausted conflict retries"
                        );
                        return Err(LedgerError::ConcurrencyConflict { attempts: attempt });
                    }
                    tokio::time::sleep(self.retry.backoff_delay(attempt)).await;
                }
                other => return other,
            }
        }
    }

    async fn try_release(&self, reservation: &Reservation) -> Result<(), LedgerError> {
        let txn = self.db.begin().await?;

        // Lock in the same fixed order as reserve, regardless of how the
        // caller assembled the legs.
        let mut legs: Vec<&ReservationLeg> = reservation.legs.iter().collect();
        legs.sort_by_key(|leg| leg.account);

        for leg in legs {
            let row = AccountStore::lock_or_create(&txn, leg.account).await?;
            let outcome = AccountStore::post(
                &txn,
                &row,
                &Posting {
                    amount: leg.amount,
                    kind: TransactionKind::Refund,
                    idempotency_key: keys::release(&leg.idempotency_key),
                    reference_id: Some(leg.transaction_id),
                    action_id: None,
                },
            )
            .await?;

            if outcome.applied {
                info!(
                    account = %leg.account,
                    amount = leg.amount,
                    "reservation leg released"
                );
            }
        }

        txn.commit().await?;
        Ok(())
    }
}

/// A replayed reservation must hold exactly the cost the caller asked for;
/// anything else means the key was reused for a different request.
fn verify_replay_total(reservation: &Reservation, cost: i64) -> Result<(), LedgerError> {
    if reservation.total() == cost {
        Ok(())
    } else {
        Err(LedgerError::IdempotencyMismatch {
            key: reservation.idempotency_key.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(account: AccountRef, amount: i64) -> ReservationLeg {
        ReservationLeg {
            account,
            transaction_id: Uuid::new_v4(),
            idempotency_key: format!("tx1:{}", account.kind),
            amount,
        }
    }

    #[test]
    fn test_reservation_total_sums_legs() {
        let reservation = Reservation {
            idempotency_key: "tx1".to_string(),
            legs: vec![leg(AccountRef::chat(1), 5), leg(AccountRef::user(2), 3)],
        };
        assert_eq!(reservation.total(), 8);
    }

    #[test]
    fn test_replay_with_matching_cost_passes() {
        let reservation = Reservation {
            idempotency_key: "tx1".to_string(),
            legs: vec![leg(AccountRef::user(2), 4)],
        };
        assert!(verify_replay_total(&reservation, 4).is_ok());
    }

    #[test]
    fn test_replay_with_different_cost_fails_fast() {
        let reservation = Reservation {
            idempotency_key: "tx1".to_string(),
            legs: vec![leg(AccountRef::chat(1), 5), leg(AccountRef::user(2), 3)],
        };
        let err = verify_replay_total(&reservation, 9).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::IdempotencyMismatch { ref key } if key == "tx1"
        ));
    }
}
