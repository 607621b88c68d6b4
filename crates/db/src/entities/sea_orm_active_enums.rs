//! `SeaORM` active enums for the credit schema.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which pool a persisted account belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "credit_account_kind"
)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Shared pool funded for a whole chat.
    #[sea_orm(string_value = "chat")]
    Chat,
    /// Personal pool owned by a single user.
    #[sea_orm(string_value = "user")]
    User,
}

impl From<scrip_shared::AccountKind> for AccountKind {
    fn from(kind: scrip_shared::AccountKind) -> Self {
        match kind {
            scrip_shared::AccountKind::Chat => Self::Chat,
            scrip_shared::AccountKind::User => Self::User,
        }
    }
}

impl From<AccountKind> for scrip_shared::AccountKind {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Chat => Self::Chat,
            AccountKind::User => Self::User,
        }
    }
}

/// Classification of a logged balance mutation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "credit_transaction_kind"
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Credits bought through the payment provider.
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// Credits spent on a metered action.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Compensation for a released reservation or a refunded purchase.
    #[sea_orm(string_value = "refund")]
    Refund,
    /// Audit record of a refund shortfall; never moves the balance.
    #[sea_orm(string_value = "writeoff")]
    Writeoff,
}

impl TransactionKind {
    /// Whether rows of this kind move the account balance.
    #[must_use]
    pub const fn affects_balance(self) -> bool {
        !matches!(self, Self::Writeoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_writeoffs_are_balance_neutral() {
        assert!(TransactionKind::Purchase.affects_balance());
        assert!(TransactionKind::Debit.affects_balance());
        assert!(TransactionKind::Refund.affects_balance());
        assert!(!TransactionKind::Writeoff.affects_balance());
    }

    #[test]
    fn test_account_kind_round_trips_through_shared() {
        for kind in [scrip_shared::AccountKind::Chat, scrip_shared::AccountKind::User] {
            let db_kind = AccountKind::from(kind);
            assert_eq!(scrip_shared::AccountKind::from(db_kind), kind);
        }
    }
}
