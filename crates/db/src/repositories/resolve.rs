//! Read-only credit checks combining balances, registry, and usage.
//!
//! Resolution never mutates anything and takes no locks; the decision it
//! returns is advisory and the subsequent reserve is the true gate.

use std::sync::Arc;

use scrip_core::registry::Registry;
use scrip_core::tier::{AccessTier, CreditCheckResult, TierResolver};
use scrip_shared::AccountRef;
use sea_orm::DatabaseConnection;
use tracing::debug;

use super::account::{AccountError, AccountStore};
use super::retry::RetryPolicy;
use super::usage::{today_utc, UsageCounter, UsageError};

/// Error types for credit resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The action id is not in the registry: a caller programming error.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The registry has no default model for the resolved tier.
    #[error("no default model for tier {0}")]
    NoDefaultModel(AccessTier),

    /// Account-level failure.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Usage counter failure.
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Orchestration parameters derived from the current balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Access tier derived from the balances.
    pub tier: AccessTier,
    /// Default model to orchestrate with at this tier.
    pub model_id: String,
    /// Conversation context budget, in messages.
    pub context_messages: u32,
}

/// Read-only resolver over the account store, usage counters, and registry.
pub struct CreditResolver {
    accounts: AccountStore,
    usage: UsageCounter,
    registry: Arc<Registry>,
}

impl CreditResolver {
    /// Creates a new resolver sharing the given connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, registry: Arc<Registry>) -> Self {
        Self {
            accounts: AccountStore::new(db.clone()),
            usage: UsageCounter::new(db, RetryPolicy::default()),
            registry,
        }
    }

    /// Checks whether an action may run and what it would cost.
    ///
    /// The free daily quota follows the user, not the chat: the usage
    /// counter is consulted against the user's account.
    pub async fn resolve(
        &self,
        chat: Option<AccountRef>,
        user: AccountRef,
        action_id: &str,
    ) -> Result<CreditCheckResult, ResolveError> {
        let action = self
            .registry
            .action(action_id)
            .ok_or_else(|| ResolveError::UnknownAction(action_id.to_string()))?;

        let chat_balance = match chat {
            Some(chat) => self.accounts.get_balance(chat).await?,
            None => 0,
        };
        let user_balance = self.accounts.get_balance(user).await?;

        let used_today = if action.daily_free_limit > 0 {
            self.usage
                .get_daily_usage(user, action_id, today_utc())
                .await?
        } else {
            0
        };

        let result = TierResolver::resolve(&action, chat_balance, user_balance, used_today);
        debug!(
            action = action_id,
            user = %user,
            allowed = result.allowed,
            cost = result.cost,
            tier = %result.tier,
            "credit check resolved"
        );
        Ok(result)
    }

    /// Picks the orchestration model and context budget for a conversation.
    pub async fn orchestrator_config(
        &self,
        chat: Option<AccountRef>,
        user: AccountRef,
    ) -> Result<OrchestratorConfig, ResolveError> {
        let chat_balance = match chat {
            Some(chat) => self.accounts.get_balance(chat).await?,
            None => 0,
        };
        let user_balance = self.accounts.get_balance(user).await?;

        let tier = TierResolver::access_tier(chat_balance, user_balance);
        let model = self
            .registry
            .default_model(tier)
            .ok_or(ResolveError::NoDefaultModel(tier))?;

        Ok(OrchestratorConfig {
            tier,
            model_id: model.id.clone(),
            context_messages: tier.context_messages(),
        })
    }
}
