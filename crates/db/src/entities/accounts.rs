//! `SeaORM` Entity for the credit_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AccountKind;

/// A persisted credit account: one row per (kind, external id).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_accounts")]
pub struct Model {
    /// Internal primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Which pool this account is.
    pub kind: AccountKind,
    /// Collaborator-scoped owner id.
    pub external_id: i64,
    /// Cached running total of the transaction log; never negative.
    pub balance: i64,
    /// Row creation time.
    pub created_at: DateTimeWithTimeZone,
    /// Last balance mutation time.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::credit_transactions::Entity")]
    CreditTransactions,
    #[sea_orm(has_many = "super::daily_usage::Entity")]
    DailyUsage,
}

impl Related<super::credit_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditTransactions.def()
    }
}

impl Related<super::daily_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyUsage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
