//! Threshold ownership groups
//!
//! An [`OwnerGroup`] is the on-ledger definition of an M-of-N spending
//! authority: an ordered list of member addresses, the number of signatures
//! required, and an optional time lock. A member address may itself denote
//! another group (an alias), which is resolved by the alias resolver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{hash160, Address, VERSION_ALIAS};

/// Errors related to group definitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Group has no members")]
    NoMembers,
    #[error("Duplicate member address: {0}")]
    DuplicateMember(Address),
}

/// A threshold ownership group
///
/// Member order is significant: verifier slot indices are positional, so two
/// groups with the same members in a different order are different groups.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerGroup {
    /// Ordered member addresses (unique)
    pub members: Vec<Address>,
    /// Minimum number of satisfied members required (M in M-of-N)
    pub threshold: u32,
    /// Unix timestamp before which the group's outputs cannot be spent
    pub locktime: u64,
}

impl OwnerGroup {
    /// Create a new group, validating the threshold and member list
    pub fn new(members: Vec<Address>, threshold: u32, locktime: u64) -> Result<Self, GroupError> {
        if members.is_empty() {
            return Err(GroupError::NoMembers);
        }
        if threshold == 0 {
            return Err(GroupError::InvalidThreshold(
                "threshold must be at least 1".to_string(),
            ));
        }
        if threshold as usize > members.len() {
            return Err(GroupError::InvalidThreshold(format!(
                "threshold {} exceeds member count {}",
                threshold,
                members.len()
            )));
        }

        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                if members[i] == members[j] {
                    return Err(GroupError::DuplicateMember(members[i]));
                }
            }
        }

        Ok(Self {
            members,
            threshold,
            locktime,
        })
    }

    /// Get the threshold (M)
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Get the total member count (N)
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Find the positional index of a member address
    pub fn member_index(&self, address: &Address) -> Option<usize> {
        self.members.iter().position(|m| m == address)
    }

    /// Check if an address is a member of this group
    pub fn contains(&self, address: &Address) -> bool {
        self.member_index(address).is_some()
    }

    /// Derive the alias address for this group definition
    ///
    /// `Base58Check(VERSION_ALIAS || RIPEMD160(SHA256(threshold || sorted member bytes)))`
    /// Members are sorted so the alias is independent of member order.
    pub fn alias_address(&self) -> Address {
        let mut sorted = self.members.clone();
        sorted.sort();

        let mut data = self.threshold.to_be_bytes().to_vec();
        for member in &sorted {
            data.extend_from_slice(member.as_bytes());
        }

        Address::new(VERSION_ALIAS, hash160(&data))
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.members.len())
    }
}
