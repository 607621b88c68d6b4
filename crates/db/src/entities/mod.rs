//! `SeaORM` entity definitions for the credit schema.

pub mod accounts;
pub mod credit_transactions;
pub mod daily_usage;
pub mod sea_orm_active_enums;
