//! Ledger node client
//!
//! Fetches threshold-group definitions from the ledger node's JSON-RPC
//! platform endpoint. This is the [`AliasLookup`] used for live resolution:
//! definitions are fetched freshly on every call because aliases can be
//! re-pointed between ledger states.

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::crypto::Address;
use crate::multisig::{AliasLookup, OwnerGroup, ResolveError};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// JSON-RPC path of the platform endpoint
const PLATFORM_ENDPOINT: &str = "/ext/bc/P";

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: AliasParams<'a>,
}

#[derive(Serialize)]
struct AliasParams<'a> {
    address: &'a str,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<AliasResult>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

/// Group definition as returned by the node; numeric fields arrive as
/// strings on this endpoint
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AliasResult {
    #[serde(default)]
    #[allow(dead_code)]
    memo: String,
    addresses: Vec<Address>,
    threshold: String,
    #[serde(default)]
    locktime: Option<String>,
}

impl AliasResult {
    fn into_group(self) -> Result<OwnerGroup, ResolveError> {
        let threshold: u32 = self
            .threshold
            .parse()
            .map_err(|_| ResolveError::Lookup(format!("threshold is not a number: {}", self.threshold)))?;
        let locktime: u64 = match &self.locktime {
            Some(raw) => raw
                .parse()
                .map_err(|_| ResolveError::Lookup(format!("locktime is not a number: {}", raw)))?,
            None => 0,
        };
        Ok(OwnerGroup::new(self.addresses, threshold, locktime)?)
    }
}

/// JSON-RPC client for the ledger node
pub struct NodeClient {
    client: Client,
    base_url: String,
}

impl NodeClient {
    /// Create a new client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ResolveError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Create with a custom timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ResolveError::Lookup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetch the group definition behind an alias address
    ///
    /// Returns `Ok(None)` when the node reports the address is not a
    /// registered alias; the only domain error this endpoint produces.
    pub async fn get_multisig_alias(
        &self,
        address: &Address,
    ) -> Result<Option<OwnerGroup>, ResolveError> {
        let url = format!("{}{}", self.base_url, PLATFORM_ENDPOINT);
        let address_text = address.to_string();
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "platform.getMultisigAlias",
            params: AliasParams {
                address: &address_text,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ResolveError::Lookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ResolveError::Lookup(format!(
                "node returned status {}",
                response.status()
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::Lookup(e.to_string()))?;

        if let Some(error) = body.error {
            log::debug!("alias lookup for {} failed: {}", address, error.message);
            return Ok(None);
        }

        match body.result {
            Some(result) => Ok(Some(result.into_group()?)),
            None => Ok(None),
        }
    }
}

impl AliasLookup for NodeClient {
    fn lookup<'a>(
        &'a self,
        address: &'a Address,
    ) -> BoxFuture<'a, Result<Option<OwnerGroup>, ResolveError>> {
        Box::pin(self.get_multisig_alias(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_alias_result_parsing() {
        let a = KeyPair::generate().address();
        let b = KeyPair::generate().address();
        let json = format!(
            r#"{{"memo":"", "addresses":["{a}","{b}"], "threshold":"2", "locktime":"0"}}"#
        );

        let result: AliasResult = serde_json::from_str(&json).unwrap();
        let group = result.into_group().unwrap();
        assert_eq!(group.threshold, 2);
        assert_eq!(group.members, vec![a, b]);
        assert_eq!(group.locktime, 0);
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let a = KeyPair::generate().address();
        let json = format!(r#"{{"addresses":["{a}"], "threshold":"two"}}"#);

        let result: AliasResult = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            result.into_group(),
            Err(ResolveError::Lookup(_))
        ));
    }

    #[test]
    fn test_rpc_error_body_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"alias not found"}}"#;
        let response: RpcResponse = serde_json::from_str(json).unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().message, "alias not found");
    }
}
