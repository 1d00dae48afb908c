//! Relay wire types
//!
//! Request and response bodies of the coordinating relay's REST API. All
//! binary payloads cross the wire as hex-encoded strings; the relay treats
//! them as opaque blobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{Address, CompactSignature};

/// Body of `POST /multisig`: the first signer registers a pending
/// transaction
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Group alias whose members will sign
    pub alias: Address,
    /// Hex-encoded unsigned transaction body
    pub unsigned_tx: String,
    /// The creator's signature over the signing digest
    pub signature: CompactSignature,
    /// Hex-encoded output-owner structure, stored alongside the body
    pub output_owners: String,
    /// Opaque hex metadata, e.g. an out-of-band signature for the issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    /// Unix timestamp after which the pending object expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
}

/// Body of `PUT /multisig/{id}`: one more signer contributes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRequest {
    pub signature: CompactSignature,
}

/// Body of `POST /multisig/issue`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Hex-encoded signed transaction
    pub signed_tx: String,
    /// The issuer's signature over SHA256(signed transaction bytes)
    pub signature: CompactSignature,
}

/// Response of `POST /multisig/issue`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IssueResponse {
    #[serde(rename = "txID")]
    pub tx_id: String,
}

/// Body of `POST /multisig/cancel`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CancelRequest {
    pub id: String,
    pub timestamp: String,
    pub signature: CompactSignature,
}

/// One owner row of a pending transaction: the address and, once the owner
/// has signed, their hex-encoded signature
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingOwner {
    pub address: Address,
    #[serde(default)]
    pub signature: String,
}

impl PendingOwner {
    /// Whether this owner has contributed a signature
    pub fn has_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

/// A pending multisig transaction as stored by the relay
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTx {
    /// Hex of SHA256(unsigned transaction bytes)
    pub id: String,
    pub alias: Address,
    pub threshold: u32,
    /// Ledger transaction id, set once issued
    #[serde(default)]
    pub transaction_id: String,
    /// Hex-encoded unsigned transaction body
    pub unsigned_tx: String,
    /// Hex-encoded output-owner structure
    pub output_owners: String,
    /// Opaque hex metadata as supplied at creation
    #[serde(default)]
    pub metadata: String,
    /// Top-level owners with their collected signatures
    pub owners: Vec<PendingOwner>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl PendingTx {
    /// Number of owners that have signed so far
    pub fn signed_count(&self) -> usize {
        self.owners.iter().filter(|o| o.has_signed()).count()
    }

    /// Whether this pending object has been issued to the ledger
    pub fn is_issued(&self) -> bool {
        !self.transaction_id.is_empty()
    }

    /// Whether the expiration deadline has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration, Some(deadline) if deadline <= now)
    }
}
