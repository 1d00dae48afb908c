//! ECDSA key management
//!
//! Provides key pair generation, signing, and verification using the
//! secp256k1 elliptic curve. Signatures are produced in 65-byte recoverable
//! compact form (`R || S || V`) so that verifiers and the coordinating relay
//! can recover the signer's address from a signature alone.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::address::Address;

/// Length of a recoverable compact signature in bytes
pub const SIGNATURE_LEN: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid message digest: expected 32 bytes, got {0}")]
    InvalidDigest(usize),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A 65-byte recoverable compact signature (`R || S || V`)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactSignature([u8; SIGNATURE_LEN]);

impl CompactSignature {
    /// Wrap raw signature bytes
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from a byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(KeyError::InvalidSignature);
        }
        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Parse from a hex string
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        Self::from_slice(&bytes)
    }

    /// Raw signature bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn to_recoverable(self) -> Result<RecoverableSignature, KeyError> {
        let recovery_id = RecoveryId::from_i32(i32::from(self.0[64]))?;
        Ok(RecoverableSignature::from_compact(
            &self.0[..64],
            recovery_id,
        )?)
    }
}

impl fmt::Display for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactSignature({})", self)
    }
}

impl FromStr for CompactSignature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for CompactSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CompactSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Derive the address of this key pair's public key
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Sign a 32-byte message digest, producing a recoverable signature
    pub fn sign(&self, digest: &[u8]) -> Result<CompactSignature, KeyError> {
        sign_digest(&self.secret_key, digest)
    }

    /// Verify a signature against this key pair's public key
    pub fn verify(&self, digest: &[u8], signature: &CompactSignature) -> Result<bool, KeyError> {
        Ok(recover_public_key(digest, signature)? == self.public_key)
    }
}

fn message_from_digest(digest: &[u8]) -> Result<Message, KeyError> {
    if digest.len() != 32 {
        return Err(KeyError::InvalidDigest(digest.len()));
    }
    Ok(Message::from_digest_slice(digest)?)
}

/// Sign a 32-byte message digest with a secret key
pub fn sign_digest(secret_key: &SecretKey, digest: &[u8]) -> Result<CompactSignature, KeyError> {
    let secp = Secp256k1::new();
    let message = message_from_digest(digest)?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);

    let (recovery_id, compact) = signature.serialize_compact();
    let mut bytes = [0u8; SIGNATURE_LEN];
    bytes[..64].copy_from_slice(&compact);
    bytes[64] = recovery_id.to_i32() as u8;
    Ok(CompactSignature(bytes))
}

/// Recover the public key that produced a signature over a digest
pub fn recover_public_key(
    digest: &[u8],
    signature: &CompactSignature,
) -> Result<PublicKey, KeyError> {
    let secp = Secp256k1::new();
    let message = message_from_digest(digest)?;
    Ok(secp.recover_ecdsa(&message, &signature.to_recoverable()?)?)
}

/// Recover the signer's address from a signature over a digest
pub fn recover_address(digest: &[u8], signature: &CompactSignature) -> Result<Address, KeyError> {
    Ok(Address::from_public_key(&recover_public_key(
        digest, signature,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert!(!kp.private_key_hex().is_empty());
        assert!(!kp.public_key_hex().is_empty());
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let digest = sha256(b"hello, ledger");

        let signature = kp.sign(&digest).unwrap();
        assert!(kp.verify(&digest, &signature).unwrap());
    }

    #[test]
    fn test_recover_address() {
        let kp = KeyPair::generate();
        let digest = sha256(b"recoverable");

        let signature = kp.sign(&digest).unwrap();
        let recovered = recover_address(&digest, &signature).unwrap();
        assert_eq!(recovered, kp.address());
    }

    #[test]
    fn test_recover_rejects_other_digest() {
        let kp = KeyPair::generate();
        let signature = kp.sign(&sha256(b"one")).unwrap();

        let recovered = recover_address(&sha256(b"two"), &signature).unwrap();
        assert_ne!(recovered, kp.address());
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let kp = KeyPair::generate();
        let signature = kp.sign(&sha256(b"roundtrip")).unwrap();

        let parsed = CompactSignature::from_hex(&signature.to_string()).unwrap();
        assert_eq!(signature, parsed);
    }

    #[test]
    fn test_invalid_digest_length() {
        let kp = KeyPair::generate();
        let result = kp.sign(b"short");
        assert!(matches!(result, Err(KeyError::InvalidDigest(5))));
    }
}
