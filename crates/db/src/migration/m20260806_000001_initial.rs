//! Initial database migration.
//!
//! Creates the credit schema: enums, accounts, the append-only transaction
//! log, and daily usage counters.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(DAILY_USAGE_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Account pools
CREATE TYPE credit_account_kind AS ENUM ('chat', 'user');

-- Transaction log classification
CREATE TYPE credit_transaction_kind AS ENUM (
    'purchase',
    'debit',
    'refund',
    'writeoff'
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE credit_accounts (
    id UUID PRIMARY KEY,
    kind credit_account_kind NOT NULL,
    external_id BIGINT NOT NULL,
    -- Cached running total of the transaction log; the CHECK backs the
    -- never-negative invariant at the storage layer too.
    balance BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_credit_accounts_ref UNIQUE (kind, external_id)
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE credit_transactions (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES credit_accounts(id) ON DELETE CASCADE,
    kind credit_transaction_kind NOT NULL,
    amount BIGINT NOT NULL,
    balance_after BIGINT NOT NULL,
    idempotency_key TEXT NOT NULL,
    reference_id UUID REFERENCES credit_transactions(id),
    action_id TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    -- At most one row per (account, key): replays return the first result.
    CONSTRAINT uq_credit_transactions_idempotency UNIQUE (account_id, idempotency_key)
);

CREATE INDEX idx_credit_transactions_account_created
    ON credit_transactions (account_id, created_at DESC);

CREATE INDEX idx_credit_transactions_reference
    ON credit_transactions (reference_id)
    WHERE reference_id IS NOT NULL;
";

const DAILY_USAGE_SQL: &str = r"
CREATE TABLE daily_usage (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES credit_accounts(id) ON DELETE CASCADE,
    action_id TEXT NOT NULL,
    day DATE NOT NULL,
    count BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_daily_usage UNIQUE (account_id, action_id, day)
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS daily_usage;
DROP TABLE IF EXISTS credit_transactions;
DROP TABLE IF EXISTS credit_accounts;
DROP TYPE IF EXISTS credit_transaction_kind;
DROP TYPE IF EXISTS credit_account_kind;
";
