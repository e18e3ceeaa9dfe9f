pub mod api;
pub mod client;
pub mod config;
pub mod core;
pub mod events;
pub mod scheduler;
pub mod storage;

pub use client::{HttpPaymentClient, PaymentClient, PaymentPayload, SubmitError};
pub use config::{Config, ConfigError, load_seed_records};
pub use core::due::{DEFAULT_INTERVAL_MINUTES, DueEvaluator};
pub use core::retry::{FailureOutcome, RetryPolicy, RetryTracker};
pub use core::transaction::{RecurringTransaction, TransactionState};
pub use core::types::{SubmissionId, TransactionCode};
pub use events::{Event, EventBus, EventHandler};
pub use scheduler::{ExecutionOutcome, Scheduler, SchedulerError, SchedulerHandle, SchedulerState};
pub use storage::{InMemoryStore, StorageError, TransactionStore};
