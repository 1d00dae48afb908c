//! Workflow states
//!
//! A pending transaction moves through
//! `Created -> PartiallySigned -> ThresholdReached -> Issued`, with
//! `Cancelled` reachable before the threshold is met and `Expired` reachable
//! from any non-terminal state once the deadline passes. The relay only
//! stores contributions; which state a pending object is in is determined
//! locally by resolving the ownership tree against the collected signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a pending multisig transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkflowState {
    /// Registered at the relay with the creator's signature only
    Created,
    /// More signatures collected, threshold not yet met
    PartiallySigned,
    /// Enough contributions to assemble a valid credential set
    ThresholdReached,
    /// Issued to the ledger; the relay holds the transaction id
    Issued,
    /// Cancelled before the threshold was met
    Cancelled,
    /// Deadline elapsed before issuance
    Expired,
}

impl WorkflowState {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Issued | WorkflowState::Cancelled | WorkflowState::Expired
        )
    }

    /// Whether more signatures can still be contributed
    pub fn accepts_signatures(&self) -> bool {
        matches!(
            self,
            WorkflowState::Created | WorkflowState::PartiallySigned
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Created => "created",
            WorkflowState::PartiallySigned => "partially-signed",
            WorkflowState::ThresholdReached => "threshold-reached",
            WorkflowState::Issued => "issued",
            WorkflowState::Cancelled => "cancelled",
            WorkflowState::Expired => "expired",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!WorkflowState::Created.is_terminal());
        assert!(!WorkflowState::PartiallySigned.is_terminal());
        assert!(!WorkflowState::ThresholdReached.is_terminal());
        assert!(WorkflowState::Issued.is_terminal());
        assert!(WorkflowState::Cancelled.is_terminal());
        assert!(WorkflowState::Expired.is_terminal());
    }

    #[test]
    fn test_accepts_signatures() {
        assert!(WorkflowState::Created.accepts_signatures());
        assert!(WorkflowState::PartiallySigned.accepts_signatures());
        assert!(!WorkflowState::ThresholdReached.accepts_signatures());
        assert!(!WorkflowState::Issued.accepts_signatures());
    }
}
