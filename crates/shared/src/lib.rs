//! Shared types and configuration for Scrip.
//!
//! This crate provides common types used across all other crates:
//! - Account references for the two credit pools
//! - Pagination types for transaction history queries
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LedgerConfig};
pub use types::{AccountKind, AccountRef, PageRequest, PageResponse};
