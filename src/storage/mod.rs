//! Storage abstraction for recurring-transaction records.
//!
//! The scheduler consumes storage through the `TransactionStore` trait;
//! the backing persistence lives outside this service. An in-memory
//! backend is provided for tests and local runs.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::core::transaction::{RecurringTransaction, TransactionState};
use crate::core::types::TransactionCode;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A duplicate record code was detected.
    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    /// Storage lock was poisoned.
    #[error("storage lock poisoned")]
    LockPoisoned,

    /// Generic storage error.
    #[error("storage error: {0}")]
    Other(String),
}

/// Store of recurring-transaction records.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// All records regardless of state.
    async fn find_all(&self) -> Result<Vec<RecurringTransaction>, StorageError>;

    /// All records in the active state.
    async fn find_active(&self) -> Result<Vec<RecurringTransaction>, StorageError>;

    /// Look up a record by code.
    async fn find_by_code(
        &self,
        code: &TransactionCode,
    ) -> Result<RecurringTransaction, StorageError>;

    /// Active records whose legacy pay day matches `day` and whose end
    /// date, if any, is on or after `on_or_after`.
    async fn find_by_pay_day(
        &self,
        day: u32,
        on_or_after: NaiveDate,
    ) -> Result<Vec<RecurringTransaction>, StorageError>;

    /// Persist a new record.
    async fn save(&self, tx: RecurringTransaction) -> Result<(), StorageError>;

    /// Replace an existing record.
    async fn update(&self, tx: RecurringTransaction) -> Result<(), StorageError>;

    /// Change a record's lifecycle state.
    async fn update_state(
        &self,
        code: &TransactionCode,
        state: TransactionState,
    ) -> Result<(), StorageError>;

    /// Post-execution bookkeeping hook, invoked after each successful
    /// submission.
    async fn record_execution(
        &self,
        code: &TransactionCode,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}
