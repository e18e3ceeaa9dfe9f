//! Retry policy and per-record retry tracking.
//!
//! Failed submissions get a bounded number of retries with a fixed wait
//! between attempts. Exhausting the budget is terminal for the record: the
//! caller persists a cancelled state and tracking is cleared.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::types::TransactionCode;

/// Retry policy for failed submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of failed attempts tolerated before cancellation.
    pub max_attempts: u32,

    /// Fixed wait between a failure and the next retry.
    #[serde(with = "serde_duration")]
    pub wait: Duration,
}

impl RetryPolicy {
    /// Create a policy with explicit limits.
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self { max_attempts, wait }
    }
}

impl Default for RetryPolicy {
    /// Default policy: three attempts, one minute apart.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait: Duration::from_secs(60),
        }
    }
}

/// Outcome of recording a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The failure stays within budget; retry after the policy wait.
    RetryScheduled {
        /// Attempt number that just failed (1-indexed).
        attempt: u32,
    },
    /// The budget is exhausted; the record must be cancelled.
    Cancelled,
}

/// Per-record failure state.
#[derive(Debug, Clone, Copy)]
struct FailureState {
    attempts: u32,
    last_failure: DateTime<Utc>,
}

/// Tracks failed submissions and decides when to retry.
///
/// Owns the retry memory for one scheduler instance. The attempt counter
/// and last-failure timestamp for a code are set and cleared together.
#[derive(Debug)]
pub struct RetryTracker {
    policy: RetryPolicy,
    failures: HashMap<TransactionCode, FailureState>,
}

impl RetryTracker {
    /// Create a tracker with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            failures: HashMap::new(),
        }
    }

    /// The tracker's policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Whether a code has an outstanding failure being tracked.
    pub fn is_tracking(&self, code: &TransactionCode) -> bool {
        self.failures.contains_key(code)
    }

    /// Failed attempts recorded for a code.
    pub fn attempts(&self, code: &TransactionCode) -> u32 {
        self.failures.get(code).map(|s| s.attempts).unwrap_or(0)
    }

    /// Whether a tracked code is ready for its next retry at `now`.
    ///
    /// True iff a failure is on record and at least the policy wait has
    /// elapsed since it.
    pub fn should_retry_now(&self, code: &TransactionCode, now: DateTime<Utc>) -> bool {
        self.next_attempt_at(code).map_or(false, |at| now >= at)
    }

    /// When a tracked code becomes eligible for its next retry.
    ///
    /// `None` when the code has no outstanding failure.
    pub fn next_attempt_at(&self, code: &TransactionCode) -> Option<DateTime<Utc>> {
        let state = self.failures.get(code)?;
        let wait = ChronoDuration::from_std(self.policy.wait).unwrap_or(ChronoDuration::zero());
        Some(state.last_failure + wait)
    }

    /// Record a failed submission for a code.
    ///
    /// Increments the attempt counter. Within budget the failure timestamp
    /// is refreshed and a retry is scheduled; past the budget tracking is
    /// cleared and the record must be cancelled by the caller.
    pub fn record_failure(&mut self, code: &TransactionCode, now: DateTime<Utc>) -> FailureOutcome {
        let attempts = self.attempts(code) + 1;

        if attempts > self.policy.max_attempts {
            self.failures.remove(code);
            return FailureOutcome::Cancelled;
        }

        self.failures.insert(
            code.clone(),
            FailureState {
                attempts,
                last_failure: now,
            },
        );
        FailureOutcome::RetryScheduled { attempt: attempts }
    }

    /// Forget all failure history for a code.
    ///
    /// No-op when the code is not tracked.
    pub fn record_success(&mut self, code: &TransactionCode) {
        self.failures.remove(code);
    }

    /// Drop tracking for codes no longer in the live set.
    pub fn prune(&mut self, live: &HashSet<TransactionCode>) {
        self.failures.retain(|code, _| live.contains(code));
    }

    /// Number of codes with outstanding failures.
    pub fn tracked(&self) -> usize {
        self.failures.len()
    }
}

/// Serde helper: Duration as whole seconds, matching the config format.
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
