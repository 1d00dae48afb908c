//! Cryptographic primitives
//!
//! SHA-256 hashing, secp256k1 recoverable signatures, and Base58Check
//! address derivation.

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{hash160, Address, AddressError, VERSION_ALIAS, VERSION_KEY};
pub use hash::{double_sha256, sha256, sha256_hex};
pub use keys::{
    recover_address, recover_public_key, sign_digest, CompactSignature, KeyError, KeyPair,
    SIGNATURE_LEN,
};
