//! Scheduler engine implementation.
//!
//! The scheduler is responsible for:
//! - Evaluating which recurring records are due each tick
//! - Submitting payments for due records
//! - Bounded retries with cancellation on budget exhaustion
//! - Manual triggers
//! - Pause and resume functionality
//! - Event emission

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::{PaymentClient, PaymentPayload};
use crate::core::due::DueEvaluator;
use crate::core::retry::{FailureOutcome, RetryPolicy, RetryTracker};
use crate::core::transaction::{RecurringTransaction, TransactionState};
use crate::core::types::{SubmissionId, TransactionCode};
use crate::events::{Event, EventBus};
use crate::storage::{StorageError, TransactionStore};

use super::handle::{COMMAND_CHANNEL_BUFFER, SchedulerHandle};
use super::types::{ExecutionOutcome, SchedulerCommand, SchedulerError, SchedulerState};

/// Main scheduler for recurring-transaction execution.
///
/// Due and retry memories live on the scheduler value itself and move into
/// the run loop when it starts, so a restart begins with a clean slate.
pub struct Scheduler<S: TransactionStore, C: PaymentClient> {
    /// Record storage backend.
    store: Arc<S>,
    /// Outbound payment client.
    client: Arc<C>,
    /// Event bus for emitting events.
    event_bus: Arc<EventBus>,
    /// Tick interval for evaluating records.
    tick_interval: Duration,
    /// Last-success baselines and due decisions.
    due: DueEvaluator,
    /// Failure counts and retry timing.
    retry: RetryTracker,
}

impl<S: TransactionStore + 'static, C: PaymentClient + 'static> Scheduler<S, C> {
    /// Create a new scheduler with the given storage and payment client.
    pub fn new(store: S, client: C) -> Self {
        Self::with_shared(Arc::new(store), Arc::new(client))
    }

    /// Create a new scheduler over shared storage and client (for testing).
    pub fn with_shared(store: Arc<S>, client: Arc<C>) -> Self {
        Self {
            store,
            client,
            event_bus: Arc::new(EventBus::new()),
            tick_interval: Duration::from_secs(15),
            due: DueEvaluator::new(),
            retry: RetryTracker::new(RetryPolicy::default()),
        }
    }

    /// Set the event bus.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Arc::new(event_bus);
        self
    }

    /// Set the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryTracker::new(policy);
        self
    }

    /// Set the interval substituted for records without one, in minutes.
    pub fn with_default_interval(mut self, minutes: i64) -> Self {
        self.due = DueEvaluator::with_default_interval(minutes);
        self
    }

    /// Get the event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Start the scheduler and return a handle for controlling it.
    pub fn start(self) -> (SchedulerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_BUFFER);
        let state = Arc::new(RwLock::new(SchedulerState::Running));

        let handle = SchedulerHandle {
            command_tx,
            state: Arc::clone(&state),
        };

        let scheduler_task = tokio::spawn(async move {
            self.run(command_rx, state).await;
        });

        (handle, scheduler_task)
    }

    /// Main scheduler loop.
    async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<SchedulerCommand>,
        state: Arc<RwLock<SchedulerState>>,
    ) {
        let mut interval = tokio::time::interval(self.tick_interval);
        // A tick that overruns is delayed, never replayed in a burst.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let current_state = *state.read().await;
                    if current_state == SchedulerState::Running {
                        self.process_tick(Utc::now()).await;
                    }
                }

                Some(command) = command_rx.recv() => {
                    match command {
                        SchedulerCommand::Trigger { code, response } => {
                            let result = self.trigger_single(&code).await;
                            let _ = response.send(result);
                        }
                        SchedulerCommand::TriggerDueToday { response } => {
                            let result = self.trigger_due_today().await;
                            let _ = response.send(result);
                        }
                        SchedulerCommand::Pause { response } => {
                            let mut s = state.write().await;
                            *s = SchedulerState::Paused;
                            tracing::info!("Scheduler paused");
                            let _ = response.send(());
                        }
                        SchedulerCommand::Resume { response } => {
                            let mut s = state.write().await;
                            *s = SchedulerState::Running;
                            tracing::info!("Scheduler resumed");
                            let _ = response.send(());
                        }
                        SchedulerCommand::Shutdown { response } => {
                            let mut s = state.write().await;
                            *s = SchedulerState::Stopped;
                            tracing::info!("Scheduler stopped");
                            let _ = response.send(());
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Evaluate every active record once.
    ///
    /// A record with an outstanding failure is owned by the retry path for
    /// the tick; the due evaluation is not consulted for it. A record can
    /// therefore be submitted at most once per tick.
    async fn process_tick(&mut self, now: DateTime<Utc>) {
        let records = match self.store.find_active().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load active records, skipping tick");
                return;
            }
        };

        let live: HashSet<TransactionCode> = records.iter().map(|r| r.code.clone()).collect();
        self.due.prune(&live);
        self.retry.prune(&live);

        let processed = records.len();
        let mut submitted = 0;

        for record in &records {
            let should_submit = if self.retry.is_tracking(&record.code) {
                self.retry.should_retry_now(&record.code, now)
            } else {
                self.due.is_due(&record.code, record.interval_minutes, now)
            };

            if should_submit {
                submitted += 1;
                self.execute_record(record, now).await;
            }
        }

        tracing::debug!(processed, submitted, "Tick completed");
        self.event_bus
            .emit(Event::tick_completed(processed, submitted))
            .await;
    }

    /// Submit one record and record the outcome in the scheduler memories.
    async fn execute_record(&mut self, record: &RecurringTransaction, now: DateTime<Utc>) {
        let payload =
            PaymentPayload::from_transaction(record, now, self.due.default_interval_minutes());
        let submission_id = payload.submission_id.clone();

        self.event_bus
            .emit(Event::submission_started(
                record.code.clone(),
                submission_id.clone(),
            ))
            .await;

        match self.client.submit(&payload).await {
            Ok(()) => {
                tracing::info!(code = %record.code, submission_id = %submission_id, "Submission accepted");
                self.on_success(&record.code, now).await;
                self.event_bus
                    .emit(Event::submission_succeeded(
                        record.code.clone(),
                        submission_id,
                    ))
                    .await;
            }
            Err(e) => {
                self.on_failure(&record.code, now, &e.to_string()).await;
            }
        }
    }

    /// Success bookkeeping shared by the tick and manual paths.
    async fn on_success(&mut self, code: &TransactionCode, now: DateTime<Utc>) {
        self.retry.record_success(code);
        self.due.record_success(code, now);

        if let Err(e) = self.store.record_execution(code, now).await {
            tracing::warn!(code = %code, error = %e, "Failed to record execution");
        }
    }

    /// Failure bookkeeping: schedule a retry or cancel the record.
    async fn on_failure(&mut self, code: &TransactionCode, now: DateTime<Utc>, error: &str) {
        match self.retry.record_failure(code, now) {
            FailureOutcome::RetryScheduled { attempt } => {
                let next_attempt_at = self.retry.next_attempt_at(code).unwrap_or(now);
                tracing::warn!(code = %code, attempt, %next_attempt_at, error, "Submission failed, retry scheduled");
                self.event_bus
                    .emit(Event::submission_failed(
                        code.clone(),
                        attempt,
                        error.to_string(),
                    ))
                    .await;
                self.event_bus
                    .emit(Event::retry_scheduled(code.clone(), attempt, next_attempt_at))
                    .await;
            }
            FailureOutcome::Cancelled => {
                let attempts = self.retry.policy().max_attempts + 1;
                tracing::error!(code = %code, attempts, error, "Retry budget exhausted, cancelling record");
                self.event_bus
                    .emit(Event::submission_failed(
                        code.clone(),
                        attempts,
                        error.to_string(),
                    ))
                    .await;
                self.event_bus
                    .emit(Event::transaction_cancelled(code.clone(), attempts))
                    .await;

                // The in-memory cancellation stands even if persistence fails.
                if let Err(e) = self
                    .store
                    .update_state(code, TransactionState::Cancelled)
                    .await
                {
                    tracing::error!(code = %code, error = %e, "Failed to persist cancellation");
                }
            }
        }
    }

    /// Submit a single record immediately, bypassing the due evaluation.
    ///
    /// Rejects records that are not active or whose end date has passed.
    async fn trigger_single(
        &mut self,
        code: &TransactionCode,
    ) -> Result<SubmissionId, SchedulerError> {
        let record = match self.store.find_by_code(code).await {
            Ok(record) => record,
            Err(StorageError::NotFound(_)) => {
                return Err(SchedulerError::TransactionNotFound(code.clone()));
            }
            Err(e) => return Err(SchedulerError::Storage(e)),
        };

        if !record.is_active() {
            return Err(SchedulerError::InvalidState(code.clone()));
        }

        let now = Utc::now();
        if record.is_expired(now.date_naive()) {
            return Err(SchedulerError::Expired(code.clone()));
        }

        self.submit_now(&record, now).await
    }

    /// Submit every active record whose pay day matches today.
    ///
    /// One record's failure never stops the rest of the batch.
    async fn trigger_due_today(&mut self) -> Result<Vec<ExecutionOutcome>, SchedulerError> {
        let now = Utc::now();
        let today = now.date_naive();
        let records = self
            .store
            .find_by_pay_day(chrono::Datelike::day(&today), today)
            .await?;

        let mut outcomes = Vec::with_capacity(records.len());
        for record in &records {
            match self.submit_now(record, now).await {
                Ok(submission_id) => {
                    outcomes.push(ExecutionOutcome::success(record.code.clone(), submission_id));
                }
                Err(e) => {
                    tracing::warn!(code = %record.code, error = %e, "Manual batch submission failed");
                    outcomes.push(ExecutionOutcome::failure(record.code.clone(), e.to_string()));
                }
            }
        }

        Ok(outcomes)
    }

    /// Submit a record outside the tick loop and do the success bookkeeping.
    ///
    /// Manual submissions do not feed the retry tracker; the caller sees
    /// the error directly instead.
    async fn submit_now(
        &mut self,
        record: &RecurringTransaction,
        now: DateTime<Utc>,
    ) -> Result<SubmissionId, SchedulerError> {
        let payload =
            PaymentPayload::from_transaction(record, now, self.due.default_interval_minutes());
        let submission_id = payload.submission_id.clone();

        self.event_bus
            .emit(Event::submission_started(
                record.code.clone(),
                submission_id.clone(),
            ))
            .await;

        match self.client.submit(&payload).await {
            Ok(()) => {
                tracing::info!(code = %record.code, submission_id = %submission_id, "Manual submission accepted");
                self.on_success(&record.code, now).await;
                self.event_bus
                    .emit(Event::submission_succeeded(
                        record.code.clone(),
                        submission_id.clone(),
                    ))
                    .await;
                Ok(submission_id)
            }
            Err(e) => {
                tracing::warn!(code = %record.code, error = %e, "Manual submission failed");
                self.event_bus
                    .emit(Event::submission_failed(
                        record.code.clone(),
                        1,
                        e.to_string(),
                    ))
                    .await;
                Err(SchedulerError::Submit(e))
            }
        }
    }
}
