//! Dual-pool ledger logic.
//!
//! This module implements the pure parts of the ledger engine:
//! - The split algorithm dividing a cost across the chat and user pools
//! - Idempotency key derivation for reservation legs and compensations

pub mod keys;
pub mod split;

#[cfg(test)]
mod split_props;

pub use split::{PoolSplit, SplitError};
