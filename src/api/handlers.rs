//! API request handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use crate::core::due::MAX_INTERVAL_MINUTES;
use crate::core::transaction::RecurringTransaction;
use crate::core::types::TransactionCode;
use crate::scheduler::SchedulerHandle;
use crate::storage::TransactionStore;

use super::errors::ApiError;
use super::responses::{
    BatchRunResponse, HealthResponse, MessageResponse, OutcomeResponse, SchedulerStateResponse,
    TransactionListResponse, TransactionResponse, TriggerResponse,
};

/// Largest amount a recurring record may carry.
const MAX_AMOUNT: u32 = 100_000;

/// Shared application state for API handlers.
pub struct ApiState<S: TransactionStore> {
    pub handle: SchedulerHandle,
    pub store: Arc<S>,
}

impl<S: TransactionStore> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

/// Request body for creating a recurring transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub brand: String,
    pub card_number: Option<u64>,
    pub card_expiry: Option<NaiveDate>,
    pub cvv: Option<String>,
    #[serde(default)]
    pub swift_code: String,
    #[serde(default)]
    pub iban: String,
    pub interval_minutes: Option<i64>,
    pub pay_day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl CreateTransactionRequest {
    /// Check the request against the record constraints.
    fn validate(&self, today: NaiveDate) -> Result<(), ApiError> {
        if self.amount <= Decimal::ZERO {
            return Err(ApiError::BadRequest("amount must be positive".to_string()));
        }
        if self.amount > Decimal::from(MAX_AMOUNT) {
            return Err(ApiError::BadRequest(format!(
                "amount must not exceed {}",
                MAX_AMOUNT
            )));
        }
        if let Some(end) = self.end_date {
            if end <= self.start_date {
                return Err(ApiError::BadRequest(
                    "end date must be after start date".to_string(),
                ));
            }
        }
        if let Some(day) = self.pay_day_of_month {
            if !(1..=31).contains(&day) {
                return Err(ApiError::BadRequest(
                    "pay day must be between 1 and 31".to_string(),
                ));
            }
        }
        if let Some(minutes) = self.interval_minutes {
            if minutes <= 0 {
                return Err(ApiError::BadRequest(
                    "interval must be positive".to_string(),
                ));
            }
            if minutes > MAX_INTERVAL_MINUTES {
                return Err(ApiError::BadRequest(format!(
                    "interval must not exceed {} minutes",
                    MAX_INTERVAL_MINUTES
                )));
            }
        }
        if let Some(expiry) = self.card_expiry {
            if expiry < today {
                return Err(ApiError::BadRequest(
                    "card expiry must be in the future".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Build a new active record with a freshly generated code.
    fn into_record(self) -> RecurringTransaction {
        let mut tx = RecurringTransaction::new(
            TransactionCode::generate(),
            self.amount,
            self.currency,
            self.start_date,
        )
        .with_country(self.country)
        .with_brand(self.brand)
        .with_bank(self.swift_code, self.iban);

        tx.card_number = self.card_number;
        tx.card_expiry = self.card_expiry;
        tx.cvv = self.cvv;
        tx.interval_minutes = self.interval_minutes;
        tx.pay_day_of_month = self.pay_day_of_month;
        tx.end_date = self.end_date;
        tx
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Get scheduler state.
pub async fn get_scheduler_state<S: TransactionStore + 'static>(
    State(state): State<ApiState<S>>,
) -> Json<SchedulerStateResponse> {
    let scheduler_state = state.handle.state().await;
    Json(SchedulerStateResponse::from(scheduler_state))
}

/// Pause the scheduler.
pub async fn pause_scheduler<S: TransactionStore + 'static>(
    State(state): State<ApiState<S>>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.handle.pause().await?;
    Ok(Json(MessageResponse {
        message: "scheduler paused".to_string(),
    }))
}

/// Resume the scheduler.
pub async fn resume_scheduler<S: TransactionStore + 'static>(
    State(state): State<ApiState<S>>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.handle.resume().await?;
    Ok(Json(MessageResponse {
        message: "scheduler resumed".to_string(),
    }))
}

/// List all recurring transactions.
pub async fn list_transactions<S: TransactionStore + 'static>(
    State(state): State<ApiState<S>>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let records = state.store.find_all().await?;
    let transactions: Vec<TransactionResponse> =
        records.iter().map(TransactionResponse::from).collect();
    let count = transactions.len();
    Ok(Json(TransactionListResponse {
        transactions,
        count,
    }))
}

/// Get a specific recurring transaction.
pub async fn get_transaction<S: TransactionStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(code): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let code = TransactionCode::new(&code);
    let record = state.store.find_by_code(&code).await?;
    Ok(Json(TransactionResponse::from(&record)))
}

/// Create a recurring transaction.
pub async fn create_transaction<S: TransactionStore + 'static>(
    State(state): State<ApiState<S>>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    request.validate(Utc::now().date_naive())?;

    let record = request.into_record();
    let response = TransactionResponse::from(&record);
    state.store.save(record).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Submit every active transaction whose pay day matches today.
pub async fn run_due_today<S: TransactionStore + 'static>(
    State(state): State<ApiState<S>>,
) -> Result<Json<BatchRunResponse>, ApiError> {
    let outcomes = state.handle.trigger_due_today().await?;
    let submitted = outcomes.iter().filter(|o| o.succeeded()).count();
    let outcomes: Vec<OutcomeResponse> = outcomes.iter().map(OutcomeResponse::from).collect();
    let count = outcomes.len();
    Ok(Json(BatchRunResponse {
        outcomes,
        count,
        submitted,
    }))
}

/// Submit a single transaction immediately.
pub async fn run_transaction<S: TransactionStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(code): Path<String>,
) -> Result<Json<TriggerResponse>, ApiError> {
    let submission_id = state.handle.trigger(code.as_str()).await?;
    Ok(Json(TriggerResponse {
        submission_id: submission_id.to_string(),
        code: code.clone(),
        message: format!("transaction '{}' submitted", code),
    }))
}
