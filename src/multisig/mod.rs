//! Threshold multisig core
//!
//! Implements the generic signature-collection pipeline every transaction
//! type reuses: alias-style ownership groups are resolved into a concrete
//! tree, partial signatures are accumulated as they arrive from independent
//! signers, and the collected set is turned into the ordered, index-tagged
//! credential layout the verifier walks.
//!
//! # Example
//!
//! ```ignore
//! use quorumsig::multisig::{AliasResolver, SignatureStore, build_signature_indices, Credential, assemble};
//!
//! let resolver = AliasResolver::new(&lookup);
//! let tree = resolver.resolve_alias(&alias).await?;
//!
//! let mut store = SignatureStore::new();
//! store.add(contribution_a)?;
//! store.add(contribution_b)?;
//!
//! let slots = build_signature_indices(&tree, &store)?;
//! let credential = Credential::from_slots(&slots, &store)?;
//! let signed = assemble(&unsigned_tx, &[credential]);
//! ```

pub mod credential;
pub mod group;
pub mod indices;
pub mod resolver;
pub mod store;

pub use credential::{
    assemble, rebind_output_owners, signing_digest, AssembleError, Credential, CredentialEntry,
    CODEC_VERSION, MULTISIG_CREDENTIAL_TYPE_ID,
};
pub use group::{GroupError, OwnerGroup};
pub use indices::{build_signature_indices, BuildError, SignatureSlot};
pub use resolver::{
    AliasLookup, AliasResolver, ResolveError, ResolvedOwner, StaticAliasLookup, DEFAULT_MAX_DEPTH,
};
pub use store::{SignatureContribution, SignatureStore, StoreError};
