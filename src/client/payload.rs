//! Outbound payment payload construction.
//!
//! Maps a stored recurring-transaction record to the one-shot payment
//! request the external transaction service accepts. Missing or malformed
//! card data is substituted with fixed placeholders and reported as a
//! data-quality event; submission still proceeds.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::core::due::MAX_INTERVAL_MINUTES;
use crate::core::transaction::RecurringTransaction;
use crate::core::types::{SubmissionId, TransactionCode};

/// Transaction-type marker for scheduled recurring payments.
pub const TRANSACTION_TYPE_RECURRING: &str = "PAG";

/// Initial state every submission is created in.
pub const INITIAL_STATE: &str = "PEN";

/// Placeholder card number used when the record carries none.
pub const PLACEHOLDER_CARD_NUMBER: &str = "4111111111111111";

/// Placeholder expiry used when the record carries none.
pub const PLACEHOLDER_EXPIRY: &str = "12/25";

/// Placeholder CVV used when the stored value is absent or non-numeric.
pub const PLACEHOLDER_CVV: i32 = 123;

/// One-shot payment request sent to the external transaction service.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentPayload {
    /// Freshly generated identifier for this submission.
    pub submission_id: SubmissionId,
    /// Record code plus a random suffix, for correlation on the far side.
    pub reference: String,
    /// Fixed marker for scheduled recurring payments.
    pub transaction_type: &'static str,
    /// Initial payment state.
    pub state: &'static str,
    /// When the payload was built.
    pub executed_at: DateTime<Utc>,
    pub brand: String,
    pub amount: Decimal,
    pub currency: String,
    pub country: String,
    /// Card number as digits.
    pub card_number: String,
    /// Expiry formatted MM/YY.
    pub card_expiry: String,
    pub swift_code: String,
    pub iban: String,
    pub cvv: i32,
    /// Effective execution interval in minutes.
    pub interval_minutes: i64,
}

impl PaymentPayload {
    /// Build a payload from a stored record.
    ///
    /// `default_interval` replaces an absent or non-positive configured
    /// interval, mirroring the due evaluator's substitution.
    pub fn from_transaction(
        tx: &RecurringTransaction,
        now: DateTime<Utc>,
        default_interval: i64,
    ) -> Self {
        let card_number = match tx.card_number {
            Some(number) => number.to_string(),
            None => {
                tracing::warn!(code = %tx.code, "card number missing, substituting placeholder");
                PLACEHOLDER_CARD_NUMBER.to_string()
            }
        };

        let card_expiry = match tx.card_expiry {
            Some(expiry) => format!("{:02}/{:02}", expiry.month(), expiry.year() % 100),
            None => {
                tracing::warn!(code = %tx.code, "card expiry missing, substituting placeholder");
                PLACEHOLDER_EXPIRY.to_string()
            }
        };

        let cvv = match tx.cvv.as_deref() {
            Some(raw) if !raw.is_empty() => match raw.parse::<i32>() {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!(code = %tx.code, "stored CVV is not numeric, substituting placeholder");
                    PLACEHOLDER_CVV
                }
            },
            _ => {
                tracing::warn!(code = %tx.code, "CVV missing, substituting placeholder");
                PLACEHOLDER_CVV
            }
        };

        let interval_minutes = match tx.interval_minutes {
            Some(m) if (1..=MAX_INTERVAL_MINUTES).contains(&m) => m,
            _ => {
                tracing::warn!(code = %tx.code, "interval missing or out of range, substituting default");
                default_interval
            }
        };

        Self {
            submission_id: SubmissionId::new(),
            reference: correlation_reference(&tx.code),
            transaction_type: TRANSACTION_TYPE_RECURRING,
            state: INITIAL_STATE,
            executed_at: now,
            brand: tx.brand.clone(),
            amount: tx.amount,
            currency: tx.currency.clone(),
            country: tx.country.clone(),
            card_number,
            card_expiry,
            swift_code: tx.swift_code.clone(),
            iban: tx.iban.clone(),
            cvv,
            interval_minutes,
        }
    }
}

/// Correlation reference: record code plus a five-character random suffix.
fn correlation_reference(code: &TransactionCode) -> String {
    let mut buf = Uuid::encode_buffer();
    let simple = Uuid::new_v4().simple().encode_lower(&mut buf);
    format!("{}-{}", code, &simple[..5])
}
