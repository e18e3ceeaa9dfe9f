//! Recurring-transaction record model.
//!
//! Records are owned by the storage collaborator; the scheduler reads them
//! and only ever writes back a lifecycle-state change.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::TransactionCode;

/// Lifecycle state of a recurring-transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    /// Record is eligible for scheduled execution.
    Active,
    /// Record has been deactivated by an operator.
    Inactive,
    /// Record has been soft-deleted.
    Deleted,
    /// Record was cancelled after exhausting its retry budget.
    Cancelled,
}

impl TransactionState {
    /// Short wire code for the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Active => "ACT",
            TransactionState::Inactive => "INA",
            TransactionState::Deleted => "DEL",
            TransactionState::Cancelled => "CAN",
        }
    }
}

/// A stored recurring-payment obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransaction {
    /// Unique record code, immutable once created.
    pub code: TransactionCode,
    /// Payment amount.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// ISO country code.
    pub country: String,
    /// Card brand.
    pub brand: String,
    /// Card number; absent values get a placeholder at submission time.
    pub card_number: Option<u64>,
    /// Card expiry date.
    pub card_expiry: Option<NaiveDate>,
    /// Card verification value, stored as received.
    pub cvv: Option<String>,
    /// SWIFT code of the acquiring bank.
    pub swift_code: String,
    /// IBAN of the charged account.
    pub iban: String,
    /// Lifecycle state.
    pub state: TransactionState,
    /// Execution interval in minutes; absent or non-positive values fall
    /// back to the scheduler's default.
    pub interval_minutes: Option<i64>,
    /// Legacy calendar field: day of month the payment was scheduled on.
    /// Only the manual "run all due today" path consults it.
    pub pay_day_of_month: Option<u32>,
    /// First date the obligation applies.
    pub start_date: NaiveDate,
    /// Last date the obligation applies, if bounded.
    pub end_date: Option<NaiveDate>,
}

impl RecurringTransaction {
    /// Create a new active record with the required fields.
    pub fn new(
        code: impl Into<TransactionCode>,
        amount: Decimal,
        currency: impl Into<String>,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            code: code.into(),
            amount,
            currency: currency.into(),
            country: String::new(),
            brand: String::new(),
            card_number: None,
            card_expiry: None,
            cvv: None,
            swift_code: String::new(),
            iban: String::new(),
            state: TransactionState::Active,
            interval_minutes: None,
            pay_day_of_month: None,
            start_date,
            end_date: None,
        }
    }

    /// Builder: set the country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Builder: set the card brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    /// Builder: set the card number, expiry, and CVV.
    pub fn with_card(
        mut self,
        number: u64,
        expiry: NaiveDate,
        cvv: impl Into<String>,
    ) -> Self {
        self.card_number = Some(number);
        self.card_expiry = Some(expiry);
        self.cvv = Some(cvv.into());
        self
    }

    /// Builder: set the bank routing details.
    pub fn with_bank(mut self, swift: impl Into<String>, iban: impl Into<String>) -> Self {
        self.swift_code = swift.into();
        self.iban = iban.into();
        self
    }

    /// Builder: set the execution interval in minutes.
    pub fn with_interval(mut self, minutes: i64) -> Self {
        self.interval_minutes = Some(minutes);
        self
    }

    /// Builder: set the legacy pay day of month.
    pub fn with_pay_day(mut self, day: u32) -> Self {
        self.pay_day_of_month = Some(day);
        self
    }

    /// Builder: set the end date.
    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Builder: set the lifecycle state.
    pub fn with_state(mut self, state: TransactionState) -> Self {
        self.state = state;
        self
    }

    /// Whether the record is eligible for execution.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Whether the record's end date has passed.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.end_date, Some(end) if end < today)
    }
}
