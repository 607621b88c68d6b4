//! Repository abstractions for data access.
//!
//! Repositories provide the ledger's operations over the store, hiding the
//! `SeaORM` implementation details from the rest of the application. Every
//! mutating operation runs in a single store transaction with explicit row
//! locking and retries transient conflicts a bounded number of times.

pub mod account;
pub mod ledger;
pub mod payment;
pub mod resolve;
pub mod retry;
pub mod usage;

pub use account::{AccountError, AccountStore, Posting, PostingOutcome};
pub use ledger::{LedgerEngine, LedgerError, Reservation, ReservationLeg, ReserveInput};
pub use payment::{PaymentError, PaymentIntake, RefundOutcome};
pub use resolve::{CreditResolver, OrchestratorConfig, ResolveError};
pub use retry::RetryPolicy;
pub use usage::{today_utc, UsageCounter, UsageError};
