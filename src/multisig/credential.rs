//! Credential assembly
//!
//! Turns the ordered signature slots into the byte layout the verifier
//! expects and appends it to the unsigned transaction. Assembly is pure and
//! deterministic: identical inputs always produce identical output bytes.
//!
//! Signed transaction layout (all integers big-endian):
//!
//! ```text
//! unsigned transaction bytes
//! codec version        u16
//! credential count     u32
//! per credential:
//!   type id            u32
//!   entry count        u32
//!   per entry:
//!     member index     u32
//!     signature        65 bytes
//! ```

use thiserror::Error;

use crate::crypto::{sha256, Address, CompactSignature};
use crate::multisig::indices::SignatureSlot;
use crate::multisig::store::SignatureStore;

/// Codec version written ahead of the credential block
pub const CODEC_VERSION: u16 = 0;

/// Type id of a threshold-group credential
pub const MULTISIG_CREDENTIAL_TYPE_ID: u32 = 0x0000_000a;

/// Errors that can occur during credential assembly
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("no collected signature for address {0}")]
    MissingSignature(Address),
}

/// One index-tagged signature inside a credential
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialEntry {
    /// The leaf's member index within its immediate group
    pub index: u32,
    pub signature: CompactSignature,
}

/// An ordered, index-tagged signature list authorizing one credential slot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credential {
    pub entries: Vec<CredentialEntry>,
}

impl Credential {
    /// Pair the ordered slots produced by the index builder with their
    /// collected signatures
    pub fn from_slots(
        slots: &[SignatureSlot],
        store: &SignatureStore,
    ) -> Result<Self, AssembleError> {
        let mut entries = Vec::with_capacity(slots.len());
        for slot in slots {
            let signature = store
                .get(&slot.address)
                .ok_or(AssembleError::MissingSignature(slot.address))?;
            entries.push(CredentialEntry {
                index: slot.member_index(),
                signature: *signature,
            });
        }
        Ok(Self { entries })
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MULTISIG_CREDENTIAL_TYPE_ID.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&entry.index.to_be_bytes());
            out.extend_from_slice(entry.signature.as_bytes());
        }
    }
}

/// Combine the unsigned transaction with its credentials into the final
/// signed transaction bytes
pub fn assemble(unsigned_tx: &[u8], credentials: &[Credential]) -> Vec<u8> {
    let mut out = Vec::with_capacity(unsigned_tx.len() + 6 + credentials.len() * 8);
    out.extend_from_slice(unsigned_tx);
    out.extend_from_slice(&CODEC_VERSION.to_be_bytes());
    out.extend_from_slice(&(credentials.len() as u32).to_be_bytes());
    for credential in credentials {
        credential.write_to(&mut out);
    }
    out
}

/// Re-attach the output-owner structure to the unsigned transaction body
///
/// The owner structure travels separately from the unsigned body over the
/// relay, so every signer binds it back before hashing. Using one function on
/// both the creating and the reconstructing side guarantees all parties sign
/// identical bytes.
pub fn rebind_output_owners(unsigned_tx: &[u8], output_owners: &[u8]) -> Vec<u8> {
    let mut bound = Vec::with_capacity(unsigned_tx.len() + output_owners.len());
    bound.extend_from_slice(unsigned_tx);
    bound.extend_from_slice(output_owners);
    bound
}

/// The digest every signer signs: SHA-256 over the owner-bound transaction
pub fn signing_digest(unsigned_tx: &[u8], output_owners: &[u8]) -> Vec<u8> {
    sha256(&rebind_output_owners(unsigned_tx, output_owners))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::multisig::store::SignatureContribution;

    fn slot(path: Vec<u32>, address: Address) -> SignatureSlot {
        SignatureSlot { path, address }
    }

    #[test]
    fn test_assemble_layout() {
        let kp = KeyPair::generate();
        let digest = signing_digest(b"unsigned", b"owners");
        let signature = kp.sign(&digest).unwrap();

        let mut store = SignatureStore::new();
        store
            .add(SignatureContribution::new(kp.address(), signature))
            .unwrap();

        let slots = vec![slot(vec![2], kp.address())];
        let credential = Credential::from_slots(&slots, &store).unwrap();
        let signed = assemble(b"unsigned", &[credential]);

        let body = b"unsigned".len();
        assert_eq!(&signed[..body], b"unsigned");
        // codec version 0
        assert_eq!(&signed[body..body + 2], &[0, 0]);
        // one credential
        assert_eq!(&signed[body + 2..body + 6], &[0, 0, 0, 1]);
        // type id
        assert_eq!(&signed[body + 6..body + 10], &[0, 0, 0, 0x0a]);
        // one entry with member index 2
        assert_eq!(&signed[body + 10..body + 14], &[0, 0, 0, 1]);
        assert_eq!(&signed[body + 14..body + 18], &[0, 0, 0, 2]);
        assert_eq!(&signed[body + 18..], signature.as_bytes());
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let keys: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let digest = signing_digest(b"tx", b"owners");

        let mut store = SignatureStore::new();
        let mut slots = Vec::new();
        for (i, kp) in keys.iter().enumerate() {
            store
                .add(SignatureContribution::new(
                    kp.address(),
                    kp.sign(&digest).unwrap(),
                ))
                .unwrap();
            slots.push(slot(vec![i as u32], kp.address()));
        }

        let first = assemble(b"tx", &[Credential::from_slots(&slots, &store).unwrap()]);
        let second = assemble(b"tx", &[Credential::from_slots(&slots, &store).unwrap()]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_signature() {
        let kp = KeyPair::generate();
        let store = SignatureStore::new();

        let slots = vec![slot(vec![0], kp.address())];
        let result = Credential::from_slots(&slots, &store);
        assert!(
            matches!(result, Err(AssembleError::MissingSignature(a)) if a == kp.address())
        );
    }

    #[test]
    fn test_signing_digest_binds_owners() {
        let with_owners = signing_digest(b"tx", b"owners");
        let without = signing_digest(b"tx", b"");
        assert_ne!(with_owners, without);

        // Rebinding is a plain concatenation, so the digest equals hashing
        // the bound bytes directly
        assert_eq!(
            with_owners,
            crate::crypto::sha256(&rebind_output_owners(b"tx", b"owners"))
        );
    }

    #[test]
    fn test_assemble_does_not_mutate_input() {
        let unsigned = b"immutable".to_vec();
        let _ = assemble(&unsigned, &[]);
        assert_eq!(unsigned, b"immutable");
    }
}
