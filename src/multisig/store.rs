//! Signature collection
//!
//! Accumulates partial signatures contributed asynchronously by independent
//! signers. The store is a pure address-keyed map and is commutative:
//! contributions may arrive in any order and from multiple sources, so
//! re-adding an identical contribution is a no-op while a differing signature
//! for an already-present address is a conflict (a silent overwrite could
//! mask a tampered relay response).

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::crypto::{Address, CompactSignature};

/// Errors related to signature collection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflicting signature for address {0}")]
    ConflictingSignature(Address),
}

/// A single signature from one signer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureContribution {
    /// Address of the signing key
    pub address: Address,
    /// Recoverable signature over the transaction digest
    pub signature: CompactSignature,
}

impl SignatureContribution {
    pub fn new(address: Address, signature: CompactSignature) -> Self {
        Self { address, signature }
    }
}

/// Accumulated signatures, keyed by signer address
#[derive(Clone, Debug, Default)]
pub struct SignatureStore {
    signatures: HashMap<Address, CompactSignature>,
}

impl SignatureStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contribution
    ///
    /// Idempotent for identical contributions; fails with
    /// [`StoreError::ConflictingSignature`] if a different signature is
    /// already present for the address.
    pub fn add(&mut self, contribution: SignatureContribution) -> Result<(), StoreError> {
        match self.signatures.get(&contribution.address) {
            Some(existing) if *existing == contribution.signature => Ok(()),
            Some(_) => Err(StoreError::ConflictingSignature(contribution.address)),
            None => {
                self.signatures
                    .insert(contribution.address, contribution.signature);
                Ok(())
            }
        }
    }

    /// Merge contributions from another source
    pub fn merge<I>(&mut self, contributions: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = SignatureContribution>,
    {
        for contribution in contributions {
            self.add(contribution)?;
        }
        Ok(())
    }

    /// Get the signature collected for an address, if any
    pub fn get(&self, address: &Address) -> Option<&CompactSignature> {
        self.signatures.get(address)
    }

    /// Check whether an address has contributed
    pub fn contains(&self, address: &Address) -> bool {
        self.signatures.contains_key(address)
    }

    /// The set of addresses that have contributed signatures
    pub fn addresses_with_signatures(&self) -> HashSet<Address> {
        self.signatures.keys().copied().collect()
    }

    /// Number of collected signatures
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Whether the store holds no signatures
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sha256, KeyPair};

    fn contribution(kp: &KeyPair, message: &[u8]) -> SignatureContribution {
        let signature = kp.sign(&sha256(message)).unwrap();
        SignatureContribution::new(kp.address(), signature)
    }

    #[test]
    fn test_add_and_get() {
        let kp = KeyPair::generate();
        let c = contribution(&kp, b"digest");

        let mut store = SignatureStore::new();
        store.add(c).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&kp.address()), Some(&c.signature));
        assert!(store.contains(&kp.address()));
    }

    #[test]
    fn test_idempotent_re_add() {
        let kp = KeyPair::generate();
        let c = contribution(&kp, b"digest");

        let mut store = SignatureStore::new();
        store.add(c).unwrap();
        store.add(c).unwrap();

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_conflicting_signature_rejected() {
        let kp = KeyPair::generate();
        let first = contribution(&kp, b"digest one");
        let second = contribution(&kp, b"digest two");
        assert_ne!(first.signature, second.signature);

        let mut store = SignatureStore::new();
        store.add(first).unwrap();

        let result = store.add(second);
        assert!(
            matches!(result, Err(StoreError::ConflictingSignature(a)) if a == kp.address())
        );
        // The original signature is untouched
        assert_eq!(store.get(&kp.address()), Some(&first.signature));
    }

    #[test]
    fn test_merge_from_multiple_sources() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let c1 = contribution(&kp1, b"digest");
        let c2 = contribution(&kp2, b"digest");

        let mut store = SignatureStore::new();
        store.merge(vec![c1, c2]).unwrap();
        // Overlapping merge with an already-known contribution
        store.merge(vec![c2]).unwrap();

        assert_eq!(store.len(), 2);
        let addresses = store.addresses_with_signatures();
        assert!(addresses.contains(&kp1.address()));
        assert!(addresses.contains(&kp2.address()));
    }
}
