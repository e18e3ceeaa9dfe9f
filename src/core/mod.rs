//! Core domain types: records, identifiers, due evaluation, retry tracking.

pub mod due;
pub mod retry;
pub mod transaction;
pub mod types;

pub use due::{DueEvaluator, DEFAULT_INTERVAL_MINUTES, FIRE_WINDOW_SECONDS};
pub use retry::{FailureOutcome, RetryPolicy, RetryTracker};
pub use transaction::{RecurringTransaction, TransactionState};
pub use types::{SubmissionId, TransactionCode};
