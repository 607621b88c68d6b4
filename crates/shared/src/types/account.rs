//! Account references for the two credit pools.
//!
//! Every spendable balance belongs to exactly one account, identified by the
//! pool it lives in (shared chat pool or personal user pool) and the
//! collaborator-scoped numeric id of its owner.

use serde::{Deserialize, Serialize};

/// Which pool an account belongs to.
///
/// The derived ordering is load-bearing: operations that touch both pools
/// lock account rows in ascending `(kind, external_id)` order, so `Chat`
/// must sort before `User`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Shared pool funded for a whole chat.
    Chat,
    /// Personal pool owned by a single user.
    User,
}

impl AccountKind {
    /// Returns the lowercase name used in logs and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a credit account as seen by collaborators.
///
/// The `external_id` is whatever stable numeric id the surrounding platform
/// assigns to the chat or user; the ledger never interprets it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountRef {
    /// The pool this account belongs to.
    pub kind: AccountKind,
    /// Collaborator-scoped owner id.
    pub external_id: i64,
}

impl AccountRef {
    /// References the shared pool of a chat.
    #[must_use]
    pub const fn chat(external_id: i64) -> Self {
        Self {
            kind: AccountKind::Chat,
            external_id,
        }
    }

    /// References the personal pool of a user.
    #[must_use]
    pub const fn user(external_id: i64) -> Self {
        Self {
            kind: AccountKind::User,
            external_id,
        }
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.external_id)
    }
}
