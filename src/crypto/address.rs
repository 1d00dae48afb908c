//! Ledger addresses
//!
//! Addresses are Base58Check-encoded public key hashes:
//! `Base58Check(version || RIPEMD160(SHA256(data)))`. Key addresses and
//! group alias addresses carry different version bytes so they are
//! distinguishable at a glance, but both compare by byte equality.

use ripemd::Ripemd160;
use secp256k1::PublicKey;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Digest;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::{double_sha256, sha256};

/// Version byte for addresses derived from a single public key
pub const VERSION_KEY: u8 = 0x00;

/// Version byte for addresses that denote a threshold group (aliases)
pub const VERSION_ALIAS: u8 = 0x05;

/// Length of the hash payload in bytes
pub const PAYLOAD_LEN: usize = 20;

/// Errors that can occur when parsing an address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58 encoding")]
    InvalidEncoding,
    #[error("invalid address length: {0}")]
    InvalidLength(usize),
    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

/// A fixed-length address: one version byte plus a 20-byte hash payload.
///
/// Compared and hashed by byte equality. The textual form is Base58Check,
/// matching the on-ledger representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 1 + PAYLOAD_LEN]);

impl Address {
    /// Build an address from a version byte and a raw hash payload
    pub fn new(version: u8, payload: [u8; PAYLOAD_LEN]) -> Self {
        let mut bytes = [0u8; 1 + PAYLOAD_LEN];
        bytes[0] = version;
        bytes[1..].copy_from_slice(&payload);
        Self(bytes)
    }

    /// Derive the address of a compressed secp256k1 public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self::new(VERSION_KEY, hash160(&public_key.serialize()))
    }

    /// The version byte
    pub fn version(&self) -> u8 {
        self.0[0]
    }

    /// The 20-byte hash payload
    pub fn payload(&self) -> &[u8] {
        &self.0[1..]
    }

    /// Full byte representation (version || payload)
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the version byte marks this as a group alias address
    pub fn has_alias_version(&self) -> bool {
        self.0[0] == VERSION_ALIAS
    }
}

/// RIPEMD160(SHA256(data)), the standard address hash
pub fn hash160(data: &[u8]) -> [u8; PAYLOAD_LEN] {
    let sha = sha256(data);
    let mut ripemd = Ripemd160::new();
    ripemd.update(&sha);
    ripemd.finalize().into()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0.to_vec();
        let checksum = double_sha256(&bytes);
        bytes.extend_from_slice(&checksum[..4]);
        write!(f, "{}", bs58::encode(bytes).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|_| AddressError::InvalidEncoding)?;
        if decoded.len() != 1 + PAYLOAD_LEN + 4 {
            return Err(AddressError::InvalidLength(decoded.len()));
        }

        let (body, checksum) = decoded.split_at(1 + PAYLOAD_LEN);
        let expected = double_sha256(body);
        if checksum != &expected[..4] {
            return Err(AddressError::ChecksumMismatch);
        }

        let mut bytes = [0u8; 1 + PAYLOAD_LEN];
        bytes.copy_from_slice(body);
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}
