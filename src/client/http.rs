//! HTTP implementation of the payment client.

use async_trait::async_trait;
use std::time::Duration;

use super::payload::PaymentPayload;
use super::{PaymentClient, SubmitError};

/// Default bound on a single submission call.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Payment client that POSTs payloads to the transaction service as JSON.
pub struct HttpPaymentClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPaymentClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SubmitError> {
        Self::with_timeout(base_url, DEFAULT_SUBMIT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// The submission endpoint URL.
    fn endpoint(&self) -> String {
        format!("{}/v1/transactions", self.base_url)
    }
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    async fn submit(&self, payload: &PaymentPayload) -> Result<(), SubmitError> {
        let response = self
            .http
            .post(self.endpoint())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                submission_id = %payload.submission_id,
                reference = %payload.reference,
                "submission accepted"
            );
            Ok(())
        } else {
            Err(SubmitError::Status {
                code: status.as_u16(),
            })
        }
    }
}
