//! API response types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::transaction::RecurringTransaction;
use crate::scheduler::{ExecutionOutcome, SchedulerState};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Scheduler state response.
#[derive(Debug, Serialize)]
pub struct SchedulerStateResponse {
    pub state: String,
    pub is_running: bool,
    pub is_paused: bool,
}

impl From<SchedulerState> for SchedulerStateResponse {
    fn from(state: SchedulerState) -> Self {
        Self {
            state: format!("{:?}", state).to_lowercase(),
            is_running: state == SchedulerState::Running,
            is_paused: state == SchedulerState::Paused,
        }
    }
}

/// Recurring transaction representation for API responses.
///
/// Card data is reduced to its last four digits.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub code: String,
    pub amount: Decimal,
    pub currency: String,
    pub country: String,
    pub brand: String,
    pub card_last_four: Option<String>,
    pub state: String,
    pub interval_minutes: Option<i64>,
    pub pay_day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<&RecurringTransaction> for TransactionResponse {
    fn from(tx: &RecurringTransaction) -> Self {
        let card_last_four = tx.card_number.map(|n| {
            let digits = n.to_string();
            let cut = digits.len().saturating_sub(4);
            digits[cut..].to_string()
        });

        Self {
            code: tx.code.to_string(),
            amount: tx.amount,
            currency: tx.currency.clone(),
            country: tx.country.clone(),
            brand: tx.brand.clone(),
            card_last_four,
            state: tx.state.as_str().to_string(),
            interval_minutes: tx.interval_minutes,
            pay_day_of_month: tx.pay_day_of_month,
            start_date: tx.start_date,
            end_date: tx.end_date,
        }
    }
}

/// List of transactions response.
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
    pub count: usize,
}

/// Manual trigger response.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub submission_id: String,
    pub code: String,
    pub message: String,
}

/// Outcome of one record in a batch run.
#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
    pub code: String,
    pub submission_id: Option<String>,
    pub error: Option<String>,
}

impl From<&ExecutionOutcome> for OutcomeResponse {
    fn from(outcome: &ExecutionOutcome) -> Self {
        Self {
            code: outcome.code.to_string(),
            submission_id: outcome.submission.as_ref().map(|s| s.to_string()),
            error: outcome.error.clone(),
        }
    }
}

/// Batch run response.
#[derive(Debug, Serialize)]
pub struct BatchRunResponse {
    pub outcomes: Vec<OutcomeResponse>,
    pub count: usize,
    pub submitted: usize,
}

/// Simple message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
