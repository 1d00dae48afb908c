//! Relay HTTP client
//!
//! Thin typed client over the coordinating relay's REST API. The relay is
//! semi-trusted store-and-forward infrastructure: it never needs to
//! understand threshold resolution, only to persist and return
//! contributions. Any non-success response surfaces the relay's error body
//! verbatim; callers abort rather than retry, because partial-signature
//! submission is not idempotent across retries.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use super::types::{
    CancelRequest, CreateRequest, IssueRequest, IssueResponse, PendingTx, SignRequest,
};
use crate::crypto::{Address, CompactSignature};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors returned by relay calls
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("relay transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success response; `body` is the relay's error payload, unchanged
    #[error("relay error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Client for the coordinating relay
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    /// Create a new client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, RelayError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Create with a custom timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Register a pending transaction with its first signature
    pub async fn create(&self, request: &CreateRequest) -> Result<PendingTx, RelayError> {
        let url = format!("{}/multisig", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        Self::parse(response).await
    }

    /// List pending transactions for an alias
    ///
    /// `signature` authenticates the caller: a recoverable signature over
    /// `SHA256(alias || timestamp)`, from which the relay recovers the
    /// caller's address and checks group membership.
    pub async fn list(
        &self,
        alias: &Address,
        signature: &CompactSignature,
        timestamp: &str,
    ) -> Result<Vec<PendingTx>, RelayError> {
        let url = format!(
            "{}/multisig/{}?signature={}&timestamp={}",
            self.base_url, alias, signature, timestamp
        );
        let response = self.client.get(&url).send().await?;
        Self::parse(response).await
    }

    /// Add one signer's contribution to a pending transaction
    pub async fn sign(&self, id: &str, request: &SignRequest) -> Result<PendingTx, RelayError> {
        let url = format!("{}/multisig/{}", self.base_url, id);
        let response = self.client.put(&url).json(request).send().await?;
        Self::parse(response).await
    }

    /// Submit the assembled signed transaction for broadcast
    pub async fn issue(&self, request: &IssueRequest) -> Result<IssueResponse, RelayError> {
        let url = format!("{}/multisig/issue", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        Self::parse(response).await
    }

    /// Cancel a pending transaction
    pub async fn cancel(&self, request: &CancelRequest) -> Result<(), RelayError> {
        let url = format!("{}/multisig/cancel", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RelayError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn api_error(response: reqwest::Response) -> RelayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RelayError::Api { status, body }
    }
}
