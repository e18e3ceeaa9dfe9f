//! In-memory store implementation.
//!
//! Thread-safe backend for tests and local development. Data is not
//! persisted across restarts.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use super::{StorageError, TransactionStore};
use crate::core::transaction::{RecurringTransaction, TransactionState};
use crate::core::types::TransactionCode;

/// In-memory transaction store backed by RwLock-guarded maps.
pub struct InMemoryStore {
    records: RwLock<HashMap<TransactionCode, RecurringTransaction>>,
    executions: RwLock<Vec<(TransactionCode, DateTime<Utc>)>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            executions: RwLock::new(Vec::new()),
        }
    }

    /// Recorded executions, oldest first. For inspection in tests.
    pub fn executions(&self) -> Vec<(TransactionCode, DateTime<Utc>)> {
        self.executions.read().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<RecurringTransaction>, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut result: Vec<_> = records.values().cloned().collect();
        result.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
        Ok(result)
    }

    async fn find_active(&self) -> Result<Vec<RecurringTransaction>, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut result: Vec<_> = records.values().filter(|t| t.is_active()).cloned().collect();
        result.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
        Ok(result)
    }

    async fn find_by_code(
        &self,
        code: &TransactionCode,
    ) -> Result<RecurringTransaction, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        records
            .get(code)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("transaction: {}", code)))
    }

    async fn find_by_pay_day(
        &self,
        day: u32,
        on_or_after: NaiveDate,
    ) -> Result<Vec<RecurringTransaction>, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut result: Vec<_> = records
            .values()
            .filter(|t| t.is_active())
            .filter(|t| t.pay_day_of_month == Some(day))
            .filter(|t| t.end_date.map_or(true, |end| end >= on_or_after))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
        Ok(result)
    }

    async fn save(&self, tx: RecurringTransaction) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        if records.contains_key(&tx.code) {
            return Err(StorageError::DuplicateCode(tx.code.to_string()));
        }
        records.insert(tx.code.clone(), tx);
        Ok(())
    }

    async fn update(&self, tx: RecurringTransaction) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        if !records.contains_key(&tx.code) {
            return Err(StorageError::NotFound(format!("transaction: {}", tx.code)));
        }
        records.insert(tx.code.clone(), tx);
        Ok(())
    }

    async fn update_state(
        &self,
        code: &TransactionCode,
        state: TransactionState,
    ) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        let tx = records
            .get_mut(code)
            .ok_or_else(|| StorageError::NotFound(format!("transaction: {}", code)))?;
        tx.state = state;
        Ok(())
    }

    async fn record_execution(
        &self,
        code: &TransactionCode,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut executions = self
            .executions
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        executions.push((code.clone(), at));
        Ok(())
    }
}
