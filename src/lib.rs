//! quorumsig: threshold signature collection for UTXO ledgers
//!
//! This crate implements the client side of M-of-N multisig spending:
//! - Alias resolution: ownership groups whose members are themselves group
//!   aliases are expanded into a concrete tree, with cycle detection
//! - Signature collection: partial signatures from independent signers are
//!   accumulated through a semi-trusted coordinating relay
//! - Credential assembly: the collected set is turned into the ordered,
//!   index-tagged signature layout the on-chain verifier expects
//!
//! # Example
//!
//! ```ignore
//! use quorumsig::crypto::KeyPair;
//! use quorumsig::node::NodeClient;
//! use quorumsig::relay::RelayClient;
//! use quorumsig::workflow::SigningSession;
//!
//! let relay = RelayClient::new("http://relay:8080/v1")?;
//! let node = NodeClient::new("http://node:9650")?;
//! let session = SigningSession::new(relay, node, KeyPair::generate());
//!
//! // first signer registers the pending transaction
//! let pending = session.create(&alias, &unsigned_tx, &owners, None, None).await?;
//!
//! // other signers contribute over time
//! let pending = session.add_signature(&pending).await?;
//!
//! // once the threshold is met, any holder assembles and issues
//! let signed = session.finalize(&pending, &[]).await?;
//! let tx_id = session.issue(&signed).await?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod multisig;
pub mod node;
pub mod relay;
pub mod workflow;

// Re-export commonly used types
pub use config::Config;
pub use crypto::{Address, CompactSignature, KeyPair};
pub use multisig::{
    assemble, build_signature_indices, signing_digest, AliasLookup, AliasResolver, Credential,
    OwnerGroup, ResolvedOwner, SignatureContribution, SignatureStore, StaticAliasLookup,
};
pub use node::NodeClient;
pub use relay::{PendingTx, RelayClient, RelayError};
pub use workflow::{SigningSession, WorkflowError, WorkflowState};
