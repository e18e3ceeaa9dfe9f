use thiserror::Error;
use tokio::sync::oneshot;

use crate::client::SubmitError;
use crate::core::types::{SubmissionId, TransactionCode};
use crate::storage::StorageError;

/// Errors that can occur during scheduler operations.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionCode),

    #[error("Transaction {0} is not active")]
    InvalidState(TransactionCode),

    #[error("Transaction {0} is past its end date")]
    Expired(TransactionCode),

    #[error("Submission failed: {0}")]
    Submit(#[from] SubmitError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Channel communication error: {0}")]
    ChannelError(String),
}

/// Current state of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Scheduler is not running.
    Stopped,
    /// Scheduler is running and evaluating records each tick.
    Running,
    /// Scheduler is running but ticks are suspended.
    Paused,
}

/// Result of one manually triggered record in a batch run.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub code: TransactionCode,
    pub submission: Option<SubmissionId>,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn success(code: TransactionCode, submission: SubmissionId) -> Self {
        Self {
            code,
            submission: Some(submission),
            error: None,
        }
    }

    pub fn failure(code: TransactionCode, error: String) -> Self {
        Self {
            code,
            submission: None,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Commands sent from handles to the scheduler loop.
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Submit one transaction immediately, bypassing the due evaluation.
    Trigger {
        code: TransactionCode,
        response: oneshot::Sender<Result<SubmissionId, SchedulerError>>,
    },
    /// Submit every active transaction whose pay day matches today.
    TriggerDueToday {
        response: oneshot::Sender<Result<Vec<ExecutionOutcome>, SchedulerError>>,
    },
    /// Suspend periodic ticks.
    Pause { response: oneshot::Sender<()> },
    /// Resume periodic ticks.
    Resume { response: oneshot::Sender<()> },
    /// Stop the scheduler loop.
    Shutdown { response: oneshot::Sender<()> },
}
