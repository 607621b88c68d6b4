//! Bounded retry for transient store conflicts.
//!
//! Row locks and the serializable machinery below us occasionally abort a
//! transaction instead of blocking. Those aborts are a storage concern, not
//! a business one: every write path in this crate is idempotent, so the
//! whole operation can simply run again. Business failures (insufficient
//! credits, exhausted limits) are never retried here.

use std::time::Duration;

use scrip_shared::LedgerConfig;
use sea_orm::{DbErr, RuntimeErr, SqlErr};

/// SQLSTATE codes Postgres reports for lock and serialization contention.
const CONFLICT_SQLSTATES: [&str; 3] = ["40001", "40P01", "55P03"];

/// Bounded retry policy for conflicting store transactions.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts before surfacing a concurrency conflict.
    pub max_attempts: u32,
    /// Base backoff between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Builds a policy from application configuration.
    #[must_use]
    pub const fn from_config(config: &LedgerConfig) -> Self {
        Self {
            max_attempts: config.max_conflict_attempts,
            backoff: Duration::from_millis(config.conflict_backoff_ms),
        }
    }

    /// Linear backoff: attempt 1 waits the base, attempt 2 twice that.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt.max(1))
    }
}

/// Extracts the SQLSTATE from a database-reported error, if any.
fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return None,
    };
    let RuntimeErr::SqlxError(sqlx_err) = runtime else {
        return None;
    };
    let sqlx::Error::Database(db_err) = sqlx_err else {
        return None;
    };
    db_err.code().map(|code| code.into_owned())
}

/// Whether the error is transient contention worth retrying.
///
/// Unique-key races are included: every write path derives stable
/// idempotency keys, so a retry after losing an insert race collapses into
/// replaying the row the winner committed.
#[must_use]
pub fn is_transient_conflict(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    sqlstate(err)
        .as_deref()
        .is_some_and(|code| CONFLICT_SQLSTATES.contains(&code))
}
