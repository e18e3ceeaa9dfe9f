//! Common test utilities shared across integration tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use recurrente::{PaymentClient, PaymentPayload, RecurringTransaction, SubmitError};
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted outcome for one submission.
#[derive(Clone, Copy)]
pub enum Script {
    Accept,
    Reject(u16),
}

/// Payment client that follows a script and records every payload.
///
/// An exhausted script accepts everything.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Script>>,
    submissions: Mutex<Vec<PaymentPayload>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            submissions: Mutex::new(Vec::new()),
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn submissions(&self) -> Vec<PaymentPayload> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentClient for ScriptedClient {
    async fn submit(&self, payload: &PaymentPayload) -> Result<(), SubmitError> {
        self.submissions.lock().unwrap().push(payload.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(Script::Reject(code)) => Err(SubmitError::Status { code }),
            _ => Ok(()),
        }
    }
}

/// A complete active record with a 30 minute interval.
pub fn sample_record(code: &str) -> RecurringTransaction {
    RecurringTransaction::new(
        code,
        dec!(49.99),
        "USD",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    )
    .with_country("EC")
    .with_brand("VISA")
    .with_card(
        4532015112830366,
        NaiveDate::from_ymd_opt(2027, 6, 30).unwrap(),
        "321",
    )
    .with_bank("BANKECXXXXX", "EC0123456789")
    .with_interval(30)
}
