//! `SeaORM` Entity for the credit_transactions table.
//!
//! The transaction log is append-only and is the source of truth for every
//! balance; `credit_accounts.balance` is a cached running total maintained
//! in the same store transaction as each insert here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TransactionKind;

/// One immutable balance mutation record.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_transactions")]
pub struct Model {
    /// Internal primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The account this row belongs to.
    pub account_id: Uuid,
    /// Classification of the mutation.
    pub kind: TransactionKind,
    /// Signed credit delta; positive = credit, negative = debit. Writeoff
    /// rows record the shortfall without moving the balance.
    pub amount: i64,
    /// Balance after this row was applied.
    pub balance_after: i64,
    /// Caller-derived key; unique per account.
    pub idempotency_key: String,
    /// Row this one reverses (refund/writeoff), if any.
    pub reference_id: Option<Uuid>,
    /// Action billed by this row, for the audit trail.
    pub action_id: Option<String>,
    /// Commit time; total order per account.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
