//! Lifecycle events and event handling.
//!
//! The scheduler emits an event for each submission attempt and outcome,
//! giving operators visibility into the execution loop without coupling it
//! to any particular sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::core::types::{SubmissionId, TransactionCode};

/// Lifecycle events emitted during scheduling and submission.
#[derive(Debug, Clone)]
pub enum Event {
    /// A payment submission has been sent to the external service.
    SubmissionStarted {
        code: TransactionCode,
        submission_id: SubmissionId,
        timestamp: Instant,
    },

    /// A submission was accepted by the external service.
    SubmissionSucceeded {
        code: TransactionCode,
        submission_id: SubmissionId,
        timestamp: Instant,
    },

    /// A submission failed.
    SubmissionFailed {
        code: TransactionCode,
        /// The attempt number that just failed (1-indexed).
        attempt: u32,
        error: String,
        timestamp: Instant,
    },

    /// A failed record will be retried after the policy wait.
    RetryScheduled {
        code: TransactionCode,
        /// The attempt number that just failed (1-indexed).
        attempt: u32,
        /// Earliest time the next attempt may fire.
        next_attempt_at: DateTime<Utc>,
        timestamp: Instant,
    },

    /// A record exhausted its retry budget and was cancelled.
    TransactionCancelled {
        code: TransactionCode,
        /// Total failed attempts before cancellation.
        attempts: u32,
        timestamp: Instant,
    },

    /// A scheduler tick finished.
    TickCompleted {
        /// Active records examined this tick.
        processed: usize,
        /// Records submitted this tick.
        submitted: usize,
        timestamp: Instant,
    },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::SubmissionStarted { timestamp, .. } => *timestamp,
            Event::SubmissionSucceeded { timestamp, .. } => *timestamp,
            Event::SubmissionFailed { timestamp, .. } => *timestamp,
            Event::RetryScheduled { timestamp, .. } => *timestamp,
            Event::TransactionCancelled { timestamp, .. } => *timestamp,
            Event::TickCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// Create a SubmissionStarted event.
    pub fn submission_started(code: TransactionCode, submission_id: SubmissionId) -> Self {
        Event::SubmissionStarted {
            code,
            submission_id,
            timestamp: Instant::now(),
        }
    }

    /// Create a SubmissionSucceeded event.
    pub fn submission_succeeded(code: TransactionCode, submission_id: SubmissionId) -> Self {
        Event::SubmissionSucceeded {
            code,
            submission_id,
            timestamp: Instant::now(),
        }
    }

    /// Create a SubmissionFailed event.
    pub fn submission_failed(code: TransactionCode, attempt: u32, error: String) -> Self {
        Event::SubmissionFailed {
            code,
            attempt,
            error,
            timestamp: Instant::now(),
        }
    }

    /// Create a RetryScheduled event.
    pub fn retry_scheduled(
        code: TransactionCode,
        attempt: u32,
        next_attempt_at: DateTime<Utc>,
    ) -> Self {
        Event::RetryScheduled {
            code,
            attempt,
            next_attempt_at,
            timestamp: Instant::now(),
        }
    }

    /// Create a TransactionCancelled event.
    pub fn transaction_cancelled(code: TransactionCode, attempts: u32) -> Self {
        Event::TransactionCancelled {
            code,
            attempts,
            timestamp: Instant::now(),
        }
    }

    /// Create a TickCompleted event.
    pub fn tick_completed(processed: usize, submitted: usize) -> Self {
        Event::TickCompleted {
            processed,
            submitted,
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Mutex;

    /// Test handler that records received events.
    struct RecordingHandler {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        async fn events(&self) -> Vec<Event> {
            self.events.lock().await.clone()
        }
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(&self, event: &Event) {
            self.events.lock().await.push(event.clone());
        }
    }

    /// Test handler that counts events.
    struct CountingHandler {
        count: AtomicU32,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: &Event) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn code(s: &str) -> TransactionCode {
        TransactionCode::new(s)
    }

    #[tokio::test]
    async fn test_emit_reaches_registered_handler() {
        let bus = EventBus::new();
        let handler = RecordingHandler::new();
        bus.register(handler.clone()).await;

        bus.emit(Event::submission_started(code("r1"), SubmissionId::new()))
            .await;

        let events = handler.events().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::SubmissionStarted { .. }));
    }

    #[tokio::test]
    async fn test_emit_reaches_all_handlers() {
        let bus = EventBus::new();
        let a = Arc::new(CountingHandler {
            count: AtomicU32::new(0),
        });
        let b = Arc::new(CountingHandler {
            count: AtomicU32::new(0),
        });
        bus.register(a.clone()).await;
        bus.register(b.clone()).await;

        bus.emit(Event::tick_completed(3, 1)).await;

        assert_eq!(a.count.load(Ordering::SeqCst), 1);
        assert_eq!(b.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_emit_with_no_handlers_is_fine() {
        let bus = EventBus::new();
        bus.emit(Event::retry_scheduled(code("r1"), 2, Utc::now()))
            .await;
        assert_eq!(bus.handler_count().await, 0);
    }

    #[tokio::test]
    async fn test_event_fields() {
        let bus = EventBus::new();
        let handler = RecordingHandler::new();
        bus.register(handler.clone()).await;

        bus.emit(Event::submission_failed(
            code("r1"),
            2,
            "status 500".to_string(),
        ))
        .await;
        bus.emit(Event::transaction_cancelled(code("r1"), 3)).await;

        let events = handler.events().await;
        match &events[0] {
            Event::SubmissionFailed { code, attempt, error, .. } => {
                assert_eq!(code.as_str(), "r1");
                assert_eq!(*attempt, 2);
                assert_eq!(error, "status 500");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match &events[1] {
            Event::TransactionCancelled { attempts, .. } => assert_eq!(*attempts, 3),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
