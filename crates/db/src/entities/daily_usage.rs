//! `SeaORM` Entity for the daily_usage table.
//!
//! One row per (account, action, UTC day). Rows for past days are never
//! mutated once their day ends, so concurrent readers need no locks there.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Usage counter row for one account, action, and calendar day.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_usage")]
pub struct Model {
    /// Internal primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The account whose quota is tracked.
    pub account_id: Uuid,
    /// The metered action.
    pub action_id: String,
    /// UTC calendar day this row counts.
    pub day: Date,
    /// Uses so far on `day`; never decremented.
    pub count: i64,
    /// Row creation time.
    pub created_at: DateTimeWithTimeZone,
    /// Last increment time.
    pub updated_at: DateTimeWithTimeZone,
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
