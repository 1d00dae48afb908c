//! Coordination workflow
//!
//! The multi-party signing workflow as an explicit state machine: every
//! transition is triggered by an external message against the relay's
//! persisted state, so each step is independently restartable and no
//! in-process coordination is needed between signers.

pub mod session;
pub mod state;

pub use session::{SigningSession, WorkflowError};
pub use state::WorkflowState;
