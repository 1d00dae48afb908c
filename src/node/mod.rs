//! Ledger node access
//!
//! JSON-RPC client for the ledger node, used to fetch threshold-group
//! definitions during alias resolution.

pub mod client;

pub use client::NodeClient;
