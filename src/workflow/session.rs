//! Signing session
//!
//! Drives one signer's side of the coordination workflow against the relay:
//! registering a pending transaction, contributing signatures, deciding the
//! current workflow state, and finally resolving, assembling and issuing the
//! signed transaction. Every step is an independent, restartable request
//! against the relay's persisted state; nothing is held in memory between
//! steps.

use chrono::{DateTime, Utc};
use log::{debug, info};
use thiserror::Error;

use crate::crypto::{
    recover_address, sha256, Address, CompactSignature, KeyError, KeyPair,
};
use crate::multisig::{
    assemble, build_signature_indices, signing_digest, AliasLookup, AliasResolver, AssembleError,
    BuildError, Credential, ResolveError, ResolvedOwner, SignatureContribution, SignatureStore,
    StoreError, DEFAULT_MAX_DEPTH,
};
use crate::relay::{
    CancelRequest, CreateRequest, IssueRequest, PendingTx, RelayClient, RelayError, SignRequest,
};
use crate::workflow::state::WorkflowState;

/// Errors surfaced by the coordination workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("invalid hex in relay payload: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("signature recorded for {0} does not verify against that address")]
    SignatureMismatch(Address),
    #[error("pending transaction {0} has expired")]
    Expired(String),
}

/// One signer's handle on the coordination workflow
pub struct SigningSession<L> {
    relay: RelayClient,
    lookup: L,
    keypair: KeyPair,
    max_depth: usize,
}

impl<L: AliasLookup> SigningSession<L> {
    /// Create a session for one signer
    pub fn new(relay: RelayClient, lookup: L, keypair: KeyPair) -> Self {
        Self {
            relay,
            lookup,
            keypair,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the alias resolution depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The signer's own address
    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// Register a pending transaction at the relay with this signer's
    /// signature as the first contribution
    pub async fn create(
        &self,
        alias: &Address,
        unsigned_tx: &[u8],
        output_owners: &[u8],
        metadata: Option<&[u8]>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<PendingTx, WorkflowError> {
        let digest = signing_digest(unsigned_tx, output_owners);
        let signature = self.keypair.sign(&digest)?;

        let request = CreateRequest {
            alias: *alias,
            unsigned_tx: hex::encode(unsigned_tx),
            signature,
            output_owners: hex::encode(output_owners),
            metadata: metadata.map(hex::encode),
            expiration: expiration.map(|t| t.timestamp()),
        };

        let pending = self.relay.create(&request).await?;
        info!(
            "registered pending tx {} for alias {} ({} owners)",
            pending.id,
            alias,
            pending.owners.len()
        );
        Ok(pending)
    }

    /// List pending transactions for an alias
    ///
    /// Authenticates with a short-lived token: a signature over
    /// `SHA256(alias || timestamp)`, not the transaction signature itself.
    pub async fn list_pending(&self, alias: &Address) -> Result<Vec<PendingTx>, WorkflowError> {
        let timestamp = Utc::now().timestamp().to_string();
        let token = self.auth_token(&format!("{}{}", alias, timestamp))?;
        Ok(self.relay.list(alias, &token, &timestamp).await?)
    }

    /// Contribute this signer's signature to a pending transaction
    pub async fn add_signature(&self, pending: &PendingTx) -> Result<PendingTx, WorkflowError> {
        let digest = self.pending_digest(pending)?;
        let signature = self.keypair.sign(&digest)?;

        let updated = self
            .relay
            .sign(&pending.id, &SignRequest { signature })
            .await?;
        info!(
            "signed pending tx {} ({}/{} owners signed)",
            updated.id,
            updated.signed_count(),
            updated.owners.len()
        );
        Ok(updated)
    }

    /// Resolve the pending transaction's ownership tree from current ledger
    /// state
    pub async fn resolve_owners(&self, pending: &PendingTx) -> Result<ResolvedOwner, WorkflowError> {
        let resolver = AliasResolver::with_max_depth(&self.lookup, self.max_depth);
        Ok(resolver.resolve_alias(&pending.alias).await?)
    }

    /// Assemble the signed transaction from the relay-held contributions
    ///
    /// `extra` carries contributions that did not travel as owner rows, such
    /// as a signature embedded in the pending object's metadata. Fails with
    /// `ThresholdNotMet` until enough contributions are present.
    pub async fn finalize(
        &self,
        pending: &PendingTx,
        extra: &[SignatureContribution],
    ) -> Result<Vec<u8>, WorkflowError> {
        if pending.is_expired(Utc::now()) {
            return Err(WorkflowError::Expired(pending.id.clone()));
        }

        let unsigned_tx = hex::decode(&pending.unsigned_tx)?;
        let output_owners = hex::decode(&pending.output_owners)?;
        let digest = signing_digest(&unsigned_tx, &output_owners);

        let tree = self.resolve_owners(pending).await?;
        let store = Self::collect_store(pending, &digest, extra)?;

        let slots = build_signature_indices(&tree, &store)?;
        let credential = Credential::from_slots(&slots, &store)?;

        debug!(
            "assembled credential for {} with {} signatures",
            pending.id,
            credential.entries.len()
        );
        Ok(assemble(&unsigned_tx, &[credential]))
    }

    /// Issue the assembled signed transaction through the relay
    pub async fn issue(&self, signed_tx: &[u8]) -> Result<String, WorkflowError> {
        let digest = sha256(signed_tx);
        let signature = self.keypair.sign(&digest)?;

        let response = self
            .relay
            .issue(&IssueRequest {
                signed_tx: hex::encode(signed_tx),
                signature,
            })
            .await?;
        info!("issued signed tx, ledger id {}", response.tx_id);
        Ok(response.tx_id)
    }

    /// Cancel a pending transaction
    pub async fn cancel(&self, id: &str) -> Result<(), WorkflowError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.auth_token(&format!("{}{}", id, timestamp))?;

        self.relay
            .cancel(&CancelRequest {
                id: id.to_string(),
                timestamp,
                signature,
            })
            .await?;
        info!("cancelled pending tx {}", id);
        Ok(())
    }

    /// Determine the workflow state of a pending transaction
    ///
    /// The relay does not understand threshold resolution, so whether the
    /// threshold is reached is decided here by resolving the ownership tree
    /// and attempting an index build over the collected signatures.
    pub async fn status(&self, pending: &PendingTx) -> Result<WorkflowState, WorkflowError> {
        if pending.is_issued() {
            return Ok(WorkflowState::Issued);
        }
        if pending.is_expired(Utc::now()) {
            return Ok(WorkflowState::Expired);
        }

        let unsigned_tx = hex::decode(&pending.unsigned_tx)?;
        let output_owners = hex::decode(&pending.output_owners)?;
        let digest = signing_digest(&unsigned_tx, &output_owners);

        let tree = self.resolve_owners(pending).await?;
        let store = Self::collect_store(pending, &digest, &[])?;

        match build_signature_indices(&tree, &store) {
            Ok(_) => Ok(WorkflowState::ThresholdReached),
            Err(BuildError::ThresholdNotMet { .. }) if pending.signed_count() > 1 => {
                Ok(WorkflowState::PartiallySigned)
            }
            Err(BuildError::ThresholdNotMet { .. }) => Ok(WorkflowState::Created),
        }
    }

    /// Parse the pending object's metadata as a signature contribution from
    /// `address`
    pub fn metadata_contribution(
        pending: &PendingTx,
        address: Address,
    ) -> Result<SignatureContribution, WorkflowError> {
        let signature = CompactSignature::from_hex(&pending.metadata)?;
        Ok(SignatureContribution::new(address, signature))
    }

    /// Build the signature store from the relay-held owner rows plus any
    /// extra contributions, verifying each signature against its claimed
    /// address (a tampered relay row must not survive into a credential)
    fn collect_store(
        pending: &PendingTx,
        digest: &[u8],
        extra: &[SignatureContribution],
    ) -> Result<SignatureStore, WorkflowError> {
        let mut store = SignatureStore::new();

        for owner in pending.owners.iter().filter(|o| o.has_signed()) {
            let signature = CompactSignature::from_hex(&owner.signature)?;
            let recovered = recover_address(digest, &signature)?;
            if recovered != owner.address {
                return Err(WorkflowError::SignatureMismatch(owner.address));
            }
            store.add(SignatureContribution::new(owner.address, signature))?;
        }

        for contribution in extra {
            let recovered = recover_address(digest, &contribution.signature)?;
            if recovered != contribution.address {
                return Err(WorkflowError::SignatureMismatch(contribution.address));
            }
            store.add(*contribution)?;
        }

        Ok(store)
    }

    fn auth_token(&self, payload: &str) -> Result<CompactSignature, WorkflowError> {
        Ok(self.keypair.sign(&sha256(payload.as_bytes()))?)
    }

    fn pending_digest(&self, pending: &PendingTx) -> Result<Vec<u8>, WorkflowError> {
        let unsigned_tx = hex::decode(&pending.unsigned_tx)?;
        let output_owners = hex::decode(&pending.output_owners)?;
        Ok(signing_digest(&unsigned_tx, &output_owners))
    }
}
