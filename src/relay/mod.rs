//! Coordinating relay client
//!
//! The relay is an external store-and-forward service that lets independent
//! signers exchange partial signatures without direct peer-to-peer contact.
//! This module consumes its REST API; it does not reimplement it.
//!
//! # Endpoints
//!
//! - `POST /multisig` - register a pending transaction
//! - `GET /multisig/{alias}` - list pending transactions (authenticated)
//! - `PUT /multisig/{id}` - add a signature
//! - `POST /multisig/issue` - broadcast the signed transaction
//! - `POST /multisig/cancel` - cancel a pending transaction

pub mod client;
pub mod types;

pub use client::{RelayClient, RelayError};
pub use types::{
    CancelRequest, CreateRequest, IssueRequest, IssueResponse, PendingOwner, PendingTx,
    SignRequest,
};
