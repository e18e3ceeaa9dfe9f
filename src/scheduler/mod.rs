//! Scheduler engine for recurring-transaction execution.
//!
//! This module provides the main scheduling loop that evaluates records
//! each tick, submits due payments, and handles retries and cancellation.

mod engine;
mod handle;
mod types;

pub use engine::Scheduler;
pub use handle::SchedulerHandle;
pub use types::{ExecutionOutcome, SchedulerError, SchedulerState};
