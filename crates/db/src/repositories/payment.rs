//! Payment intake: idempotent top-ups and clamped refunds.
//!
//! Purchases are keyed by the payment provider's charge id, so a retried
//! webhook can never double-credit. Refunds never drive a balance negative:
//! whatever the pool can still return is refunded and the already-spent
//! remainder is written off as an audit row instead of becoming debt.

use scrip_core::ledger::keys;
use scrip_shared::AccountRef;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{accounts, credit_transactions, sea_orm_active_enums::TransactionKind};

use super::account::{AccountError, AccountStore, Posting};
use super::retry::{is_transient_conflict, RetryPolicy};

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Refund target does not exist.
    #[error("transaction not found: {0}")]
    TransactionNotFound(Uuid),

    /// Refund target is not a purchase.
    #[error("transaction {0} is not a refundable purchase")]
    NotRefundable(Uuid),

    /// The purchase was already refunded.
    #[error("purchase {0} was already refunded")]
    AlreadyRefunded(Uuid),

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

impl From<sea_orm::DbErr> for PaymentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Account(AccountError::Database(err))
    }
}

/// Outcome of refunding a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundOutcome {
    /// Credits actually returned to the payer.
    pub refunded: i64,
    /// Already-spent credits recorded as a writeoff.
    pub written_off: i64,
    /// Account balance after the refund.
    pub balance: i64,
}

/// Repository for credit purchases and refunds.
pub struct PaymentIntake {
    db: DatabaseConnection,
    retry: RetryPolicy,
}

impl PaymentIntake {
    /// Creates a new payment intake.
    #[must_use]
    pub const fn new(db: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { db, retry }
    }

    /// Credits a purchased pack to an account.
    ///
    /// The idempotency key is `purchase:<charge id>`, so replaying the
    /// provider's webhook returns the original balance without applying
    /// again.
    pub async fn purchase(
        &self,
        account: AccountRef,
        amount: i64,
        external_charge_id: &str,
    ) -> Result<i64, PaymentError> {
        if amount <= 0 {
            return Err(AccountError::InvalidAmount(amount).into());
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_purchase(account, amount, external_charge_id).await {
                Err(PaymentError::Account(AccountError::Database(err)))
                    if is_transient_conflict(&err) =>
                {
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            charge = external_charge_id,
                            attempts = attempt,
                            "purchase exhausted conflict retries"
                        );
                        return Err(PaymentError::ConcurrencyConflict { attempts: attempt });
                    }
                    tokio::time::sleep(self.retry.backoff_delay(attempt)).await;
                }
                other => return other,
            }
        }
    }

    async fn try_purchase(
        &self,
        account: AccountRef,
        amount: i64,
        external_charge_id: &str,
    ) -> Result<i64, PaymentError> {
        let txn = self.db.begin().await?;
        let row = AccountStore::lock_or_create(&txn, account).await?;
        let outcome = AccountStore::post(
            &txn,
            &row,
            &Posting {
                amount,
                kind: TransactionKind::Purchase,
                idempotency_key: keys::purchase(external_charge_id),
                reference_id: None,
                action_id: None,
            },
        )
        .await?;
        txn.commit().await?;

        if outcome.applied {
            info!(
                account = %account,
                amount,
                charge = external_charge_id,
                balance = outcome.balance,
                "credits purchased"
            );
        } else {
            info!(
                charge = external_charge_id,
                "duplicate purchase webhook ignored"
            );
        }

        Ok(outcome.balance)
    }

    /// Refunds a purchase, clamping to what the pool still holds.
    ///
    /// Fails with [`PaymentError::AlreadyRefunded`] if a refund already
    /// references the purchase. The shortfall between the purchase amount
    /// and the refundable balance is recorded as a balance-neutral
    /// writeoff row.
    pub async fn refund(&self, original_transaction_id: Uuid) -> Result<RefundOutcome, PaymentError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_refund(original_transaction_id).await {
                Err(PaymentError::Account(AccountError::Database(err)))
                    if is_transient_conflict(&err) =>
                {
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            original = %original_transaction_id,
                            attempts = attempt,
                            "refund exhausted conflict retries"
                        );
                        return Err(PaymentError::ConcurrencyConflict { attempts: attempt });
                    }
                    tokio::time::sleep(self.retry.backoff_delay(attempt)).await;
                }
                other => return other,
            }
        }
    }

    async fn try_refund(&self, original_id: Uuid) -> Result<RefundOutcome, PaymentError> {
        let txn = self.db.begin().await?;

        let original = credit_transactions::Entity::find_by_id(original_id)
            .one(&txn)
            .await?
            .ok_or(PaymentError::TransactionNotFound(original_id))?;

        if original.kind != TransactionKind::Purchase {
            return Err(PaymentError::NotRefundable(original_id));
        }

        // Lock the account before probing refund state so a concurrent
        // refund of the same purchase serializes behind us.
        let account = AccountStore::lock_by_id(&txn, original.account_id).await?;

        let already_refunded = credit_transactions::Entity::find()
            .filter(credit_transactions::Column::ReferenceId.eq(original.id))
            .filter(credit_transactions::Column::Kind.eq(TransactionKind::Refund))
            .one(&txn)
            .await?
            .is_some();
        if already_refunded {
            return Err(PaymentError::AlreadyRefunded(original_id));
        }

        let (refunded, written_off) = clamp_refund(original.amount, account.balance);

        let refund_outcome = AccountStore::post(
            &txn,
            &account,
            &Posting {
                amount: -refunded,
                kind: TransactionKind::Refund,
                idempotency_key: keys::refund_of(&original.idempotency_key),
                reference_id: Some(original.id),
                action_id: None,
            },
        )
        .await?;

        if written_off > 0 {
            let account_after = accounts::Model {
                balance: refund_outcome.balance,
                ..account
            };
            AccountStore::post(
                &txn,
                &account_after,
                &Posting {
                    amount: -written_off,
                    kind: TransactionKind::Writeoff,
                    idempotency_key: keys::writeoff_of(&original.idempotency_key),
                    reference_id: Some(original.id),
                    action_id: None,
                },
            )
            .await?;
        }

        txn.commit().await?;

        info!(
            original = %original_id,
            refunded,
            written_off,
            balance = refund_outcome.balance,
            "purchase refunded"
        );

        Ok(RefundOutcome {
            refunded,
            written_off,
            balance: refund_outcome.balance,
        })
    }
}

/// Splits a purchase amount into the returnable part and the shortfall.
///
/// Refunding never drives the balance negative: only what the pool still
/// holds can be returned.
pub(crate) fn clamp_refund(original_amount: i64, balance: i64) -> (i64, i64) {
    let refunded = original_amount.min(balance.max(0)).max(0);
    (refunded, original_amount - refunded)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(50, 10, 10, 40)] // spent 40 of the purchase: partial refund + writeoff
    #[case(50, 100, 50, 0)] // nothing spent: full refund
    #[case(50, 0, 0, 50)] // everything spent: full writeoff
    #[case(50, 50, 50, 0)] // exact balance
    fn test_clamp_refund(
        #[case] original: i64,
        #[case] balance: i64,
        #[case] refunded: i64,
        #[case] written_off: i64,
    ) {
        assert_eq!(clamp_refund(original, balance), (refunded, written_off));
    }

    #[test]
    fn test_clamp_refund_never_returns_negative() {
        let (refunded, written_off) = clamp_refund(50, -3);
        assert_eq!(refunded, 0);
        assert_eq!(written_off, 50);
    }

    mod props {
        use proptest::prelude::*;

        use super::super::clamp_refund;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            /// Refund and writeoff always account for the full purchase,
            /// and the refund never exceeds what the pool holds.
            #[test]
            fn prop_clamp_refund_conserves_amount(
                original in 0i64..1_000_000,
                balance in 0i64..1_000_000,
            ) {
                let (refunded, written_off) = clamp_refund(original, balance);
                prop_assert_eq!(refunded + written_off, original);
                prop_assert!(refunded >= 0);
                prop_assert!(written_off >= 0);
                prop_assert!(refunded <= balance);
            }
        }
    }
}
