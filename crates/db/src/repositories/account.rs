//! Account store: balances plus the append-only transaction log.
//!
//! `post` is the single write path for every balance mutation in the
//! system. It runs against a row the caller has locked in the current
//! store transaction and guarantees exactly one logged row per
//! (account, idempotency key), ever: a replay returns the first result
//! unchanged instead of applying again.

use chrono::Utc;
use scrip_shared::{AccountRef, PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{
    accounts, credit_transactions,
    sea_orm_active_enums::{AccountKind, TransactionKind},
};

/// Error types for account store operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The delta would drive the balance negative.
    #[error("insufficient credits: need {required}, have {available}")]
    InsufficientCredits {
        /// Credits the posting tried to take.
        required: i64,
        /// Balance at decision time.
        available: i64,
    },

    /// Same idempotency key replayed with a different posting.
    #[error("idempotency key '{key}' was already used with a different posting")]
    IdempotencyMismatch {
        /// The conflicting key.
        key: String,
    },

    /// Amount fails basic validation for the operation.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// Account row not found by internal id.
    #[error("account not found: {0}")]
    AccountNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// A single balance mutation to record.
#[derive(Debug, Clone)]
pub struct Posting {
    /// Signed credit delta; positive = credit, negative = debit. For
    /// writeoff rows this records the shortfall without moving the balance.
    pub amount: i64,
    /// Classification of the mutation.
    pub kind: TransactionKind,
    /// Stable key making this posting at-most-once per account.
    pub idempotency_key: String,
    /// Row this posting reverses, if any.
    pub reference_id: Option<Uuid>,
    /// Action billed by this posting, for the audit trail.
    pub action_id: Option<String>,
}

/// Outcome of applying a posting.
#[derive(Debug, Clone, Copy)]
pub struct PostingOutcome {
    /// Balance after the posting (or after its original application,
    /// when replayed).
    pub balance: i64,
    /// False when the key had already been applied and nothing was written.
    pub applied: bool,
    /// The logged transaction row.
    pub transaction_id: Uuid,
}

/// Repository for account rows and their transaction log.
#[derive(Debug, Clone)]
pub struct AccountStore {
    db: DatabaseConnection,
}

impl AccountStore {
    /// Creates a new account store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reads a balance without locking; 0 for accounts never referenced.
    ///
    /// May be slightly stale under concurrency, which is fine for
    /// resolution: the subsequent reserve re-validates under locks.
    pub async fn get_balance(&self, account: AccountRef) -> Result<i64, AccountError> {
        let found = Self::find_by_ref(&self.db, account).await?;
        Ok(found.map_or(0, |row| row.balance))
    }

    /// Applies one posting in its own store transaction.
    pub async fn apply_delta(
        &self,
        account: AccountRef,
        posting: Posting,
    ) -> Result<PostingOutcome, AccountError> {
        let txn = self.db.begin().await?;
        let row = Self::lock_or_create(&txn, account).await?;
        let outcome = Self::post(&txn, &row, &posting).await?;
        txn.commit().await?;
        Ok(outcome)
    }

    /// Recent-first transaction history for an account.
    pub async fn list_transactions(
        &self,
        account: AccountRef,
        page: PageRequest,
    ) -> Result<PageResponse<credit_transactions::Model>, AccountError> {
        let Some(row) = Self::find_by_ref(&self.db, account).await? else {
            return Ok(PageResponse::new(vec![], page, 0));
        };

        let query = credit_transactions::Entity::find()
            .filter(credit_transactions::Column::AccountId.eq(row.id))
            .order_by_desc(credit_transactions::Column::CreatedAt);

        let total = query.clone().count(&self.db).await?;
        let data = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Finds an account row by its external reference, without locking.
    pub(crate) async fn find_by_ref<C: sea_orm::ConnectionTrait>(
        conn: &C,
        account: AccountRef,
    ) -> Result<Option<accounts::Model>, AccountError> {
        let found = accounts::Entity::find()
            .filter(accounts::Column::Kind.eq(AccountKind::from(account.kind)))
            .filter(accounts::Column::ExternalId.eq(account.external_id))
            .one(conn)
            .await?;
        Ok(found)
    }

    /// Locks the account row `FOR UPDATE`, creating it with balance 0 on
    /// first reference.
    ///
    /// A concurrent first reference loses the insert race with a unique
    /// violation; the caller's conflict retry replays this lookup and finds
    /// the winner's row.
    pub(crate) async fn lock_or_create(
        txn: &DatabaseTransaction,
        account: AccountRef,
    ) -> Result<accounts::Model, AccountError> {
        let found = accounts::Entity::find()
            .filter(accounts::Column::Kind.eq(AccountKind::from(account.kind)))
            .filter(accounts::Column::ExternalId.eq(account.external_id))
            .lock_exclusive()
            .one(txn)
            .await?;

        if let Some(row) = found {
            return Ok(row);
        }

        let now = Utc::now().into();
        let row = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(account.kind.into()),
            external_id: Set(account.external_id),
            balance: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        debug!(account = %account, "creating account on first reference");
        Ok(row.insert(txn).await?)
    }

    /// Locks an account row by internal id.
    pub(crate) async fn lock_by_id(
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<accounts::Model, AccountError> {
        accounts::Entity::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(AccountError::AccountNotFound(id))
    }

    /// Finds a logged transaction by (account, idempotency key).
    pub(crate) async fn find_by_key(
        txn: &DatabaseTransaction,
        account_id: Uuid,
        key: &str,
    ) -> Result<Option<credit_transactions::Model>, AccountError> {
        let found = credit_transactions::Entity::find()
            .filter(credit_transactions::Column::AccountId.eq(account_id))
            .filter(credit_transactions::Column::IdempotencyKey.eq(key))
            .one(txn)
            .await?;
        Ok(found)
    }

    /// Records a posting against an account row.
    ///
    /// The caller must hold the row lock in this transaction and pass the
    /// current row state; `post` checks the idempotency key, applies the
    /// balance change, and appends the log row in one go.
    pub(crate) async fn post(
        txn: &DatabaseTransaction,
        account: &accounts::Model,
        posting: &Posting,
    ) -> Result<PostingOutcome, AccountError> {
        if let Some(existing) = Self::find_by_key(txn, account.id, &posting.idempotency_key).await?
        {
            if existing.amount != posting.amount || existing.kind != posting.kind {
                return Err(AccountError::IdempotencyMismatch {
                    key: posting.idempotency_key.clone(),
                });
            }
            debug!(
                account = %account.id,
                key = %posting.idempotency_key,
                "posting replayed, returning logged outcome"
            );
            return Ok(PostingOutcome {
                balance: existing.balance_after,
                applied: false,
                transaction_id: existing.id,
            });
        }

        let new_balance = next_balance(posting.kind, account.balance, posting.amount)?;

        if new_balance != account.balance {
            let mut active: accounts::ActiveModel = account.clone().into();
            active.balance = Set(new_balance);
            active.updated_at = Set(Utc::now().into());
            active.update(txn).await?;
        }

        let row = credit_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account.id),
            kind: Set(posting.kind),
            amount: Set(posting.amount),
            balance_after: Set(new_balance),
            idempotency_key: Set(posting.idempotency_key.clone()),
            reference_id: Set(posting.reference_id),
            action_id: Set(posting.action_id.clone()),
            created_at: Set(Utc::now().into()),
        };
        let inserted = row.insert(txn).await?;

        debug!(
            account = %account.id,
            kind = ?posting.kind,
            amount = posting.amount,
            balance = new_balance,
            "posting applied"
        );

        Ok(PostingOutcome {
            balance: new_balance,
            applied: true,
            transaction_id: inserted.id,
        })
    }
}

/// Computes the balance a posting leaves behind.
///
/// Writeoff rows are audit-only and leave the balance untouched; any other
/// posting must keep the balance at or above zero.
pub(crate) fn next_balance(
    kind: TransactionKind,
    current: i64,
    amount: i64,
) -> Result<i64, AccountError> {
    if !kind.affects_balance() {
        return Ok(current);
    }

    let next = current
        .checked_add(amount)
        .ok_or(AccountError::InvalidAmount(amount))?;
    if next < 0 {
        return Err(AccountError::InsufficientCredits {
            required: -amount,
            available: current,
        });
    }
    Ok(next)
}
