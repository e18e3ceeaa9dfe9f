//! Outbound payment submission.
//!
//! The `PaymentClient` trait is the seam to the external transaction
//! service. Failures come back as values, not panics or exceptions; retry
//! policy lives entirely in the scheduler's retry tracker.

mod http;
mod payload;

pub use http::HttpPaymentClient;
pub use payload::{
    PaymentPayload, INITIAL_STATE, PLACEHOLDER_CARD_NUMBER, PLACEHOLDER_CVV, PLACEHOLDER_EXPIRY,
    TRANSACTION_TYPE_RECURRING,
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a payment submission.
///
/// Both variants are transient from the scheduler's point of view and
/// drive the retry tracker.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Could not reach the payment service or the call timed out.
    #[error("communication failure: {0}")]
    Communication(#[from] reqwest::Error),

    /// The payment service answered with a non-success status.
    #[error("payment service returned status {code}")]
    Status {
        /// HTTP status code of the response.
        code: u16,
    },
}

/// Client for submitting one-shot payment requests.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Submit a payload to the payment service.
    ///
    /// A 2xx response is success; anything else, including communication
    /// faults, is an error. No retries happen at this level.
    async fn submit(&self, payload: &PaymentPayload) -> Result<(), SubmitError>;
}
