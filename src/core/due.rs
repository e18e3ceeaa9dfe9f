//! Due-date evaluation for recurring transactions.
//!
//! A record is due once its configured interval has elapsed since its last
//! successful execution. Records seen for the first time are armed rather
//! than fired, so a full interval always passes between process start and
//! the first automatic execution.

use chrono::{DateTime, Duration, Timelike, Utc};
use std::collections::{HashMap, HashSet};

use super::types::TransactionCode;

/// Interval substituted when a record carries no usable interval, in minutes.
pub const DEFAULT_INTERVAL_MINUTES: i64 = 30;

/// Largest configured interval treated as usable, in minutes (one year).
///
/// Values above this overflow chrono date arithmetic; they are handled
/// like absent intervals.
pub const MAX_INTERVAL_MINUTES: i64 = 366 * 24 * 60;

/// Leading window of each minute inside which a due record may fire.
///
/// The scheduler ticks more often than once a minute; restricting fires to
/// the first seconds of a minute keeps a due record from being submitted
/// twice inside the same due minute.
pub const FIRE_WINDOW_SECONDS: u32 = 30;

/// Evaluates whether records are due and remembers last-success baselines.
///
/// Owns the execution memory for one scheduler instance; entries live only
/// for the process lifetime and are lost on restart.
#[derive(Debug)]
pub struct DueEvaluator {
    /// Last successful execution per record code.
    baselines: HashMap<TransactionCode, DateTime<Utc>>,
    /// Interval substituted for absent or non-positive configured intervals.
    default_interval: Duration,
}

impl DueEvaluator {
    /// Create an evaluator with the standard default interval.
    pub fn new() -> Self {
        Self::with_default_interval(DEFAULT_INTERVAL_MINUTES)
    }

    /// Create an evaluator with a custom default interval in minutes.
    ///
    /// Out-of-range values fall back to the standard default.
    pub fn with_default_interval(minutes: i64) -> Self {
        let minutes = if (1..=MAX_INTERVAL_MINUTES).contains(&minutes) {
            minutes
        } else {
            DEFAULT_INTERVAL_MINUTES
        };
        Self {
            baselines: HashMap::new(),
            default_interval: Duration::minutes(minutes),
        }
    }

    /// The default interval in minutes.
    pub fn default_interval_minutes(&self) -> i64 {
        self.default_interval.num_minutes()
    }

    /// Decide whether a record is due at `now`.
    ///
    /// First observation of a code arms it: the current time becomes the
    /// baseline and the record is not due this tick. Afterwards the record
    /// is due once `baseline + interval` has passed, but only inside the
    /// leading fire window of the minute.
    pub fn is_due(
        &mut self,
        code: &TransactionCode,
        interval_minutes: Option<i64>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(last) = self.baselines.get(code) else {
            self.baselines.insert(code.clone(), now);
            return false;
        };

        let next_due = *last + self.effective_interval(interval_minutes);
        now >= next_due && now.second() < FIRE_WINDOW_SECONDS
    }

    /// Record a successful execution, moving the baseline forward.
    pub fn record_success(&mut self, code: &TransactionCode, at: DateTime<Utc>) {
        self.baselines.insert(code.clone(), at);
    }

    /// Last successful execution recorded for a code, if any.
    pub fn last_success(&self, code: &TransactionCode) -> Option<DateTime<Utc>> {
        self.baselines.get(code).copied()
    }

    /// Drop baselines for codes no longer in the live set.
    ///
    /// Called each tick with the current active codes so the memory does
    /// not grow with deactivated records.
    pub fn prune(&mut self, live: &HashSet<TransactionCode>) {
        self.baselines.retain(|code, _| live.contains(code));
    }

    /// Number of tracked baselines.
    pub fn tracked(&self) -> usize {
        self.baselines.len()
    }

    fn effective_interval(&self, interval_minutes: Option<i64>) -> Duration {
        match interval_minutes {
            Some(m) if (1..=MAX_INTERVAL_MINUTES).contains(&m) => Duration::minutes(m),
            _ => self.default_interval,
        }
    }
}

impl Default for DueEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
