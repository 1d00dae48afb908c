//! Signature index building
//!
//! Walks a resolved ownership tree together with the collected signatures and
//! produces the ordered list of verifier slots the credential must carry.
//! The output ordering is exactly the order the verifier walks when checking
//! a credential: surviving child slots concatenated in member order at every
//! nesting level. Any deviation fails verification on-chain, not locally.

use thiserror::Error;

use crate::crypto::Address;
use crate::multisig::group::OwnerGroup;
use crate::multisig::resolver::ResolvedOwner;
use crate::multisig::store::SignatureStore;

/// Errors that can occur while building signature indices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("threshold not met for {group}: have {have}, need {need}", group = display_group(.alias))]
    ThresholdNotMet {
        /// Alias address of the incomplete group, `None` for the root
        alias: Option<Address>,
        have: usize,
        need: u32,
    },
}

fn display_group(alias: &Option<Address>) -> String {
    match alias {
        Some(address) => address.to_string(),
        None => "root group".to_string(),
    }
}

/// One verifier slot: the position of a contributed signature within the
/// nested group structure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureSlot {
    /// Member indices from the root group down to the leaf's own group
    pub path: Vec<u32>,
    /// Leaf address whose signature fills this slot
    pub address: Address,
}

impl SignatureSlot {
    /// The leaf's member index within its immediate group
    pub fn member_index(&self) -> u32 {
        self.path.last().copied().unwrap_or(0)
    }
}

/// Build the ordered signature slots for a resolved ownership tree
///
/// Succeeds iff every group on the path from the root to any included leaf
/// has at least `threshold` satisfied children. When more children are
/// satisfied than the threshold requires, the ascending-member-order subset
/// survives, so two independent assemblers produce identical output from the
/// same signature set.
pub fn build_signature_indices(
    root: &ResolvedOwner,
    store: &SignatureStore,
) -> Result<Vec<SignatureSlot>, BuildError> {
    match root {
        ResolvedOwner::Leaf(address) => {
            if store.contains(address) {
                Ok(vec![SignatureSlot {
                    path: Vec::new(),
                    address: *address,
                }])
            } else {
                Err(BuildError::ThresholdNotMet {
                    alias: None,
                    have: 0,
                    need: 1,
                })
            }
        }
        ResolvedOwner::Group {
            alias,
            group,
            children,
        } => build_group(alias, group, children, store),
    }
}

fn build_group(
    alias: &Option<Address>,
    group: &OwnerGroup,
    children: &[ResolvedOwner],
    store: &SignatureStore,
) -> Result<Vec<SignatureSlot>, BuildError> {
    let need = group.threshold;
    let mut selected: Vec<Vec<SignatureSlot>> = Vec::with_capacity(need as usize);

    for (index, child) in children.iter().enumerate() {
        // Scanning in member order and stopping at the threshold yields the
        // canonical ascending-order subset
        if selected.len() == need as usize {
            break;
        }

        let slots = match child {
            ResolvedOwner::Leaf(address) => store.contains(address).then(|| {
                vec![SignatureSlot {
                    path: vec![index as u32],
                    address: *address,
                }]
            }),
            ResolvedOwner::Group {
                alias: child_alias,
                group: child_group,
                children: grandchildren,
            } => match build_group(child_alias, child_group, grandchildren, store) {
                Ok(mut slots) => {
                    for slot in &mut slots {
                        slot.path.insert(0, index as u32);
                    }
                    Some(slots)
                }
                Err(BuildError::ThresholdNotMet { .. }) => None,
            },
        };

        if let Some(slots) = slots {
            selected.push(slots);
        }
    }

    if selected.len() < need as usize {
        return Err(BuildError::ThresholdNotMet {
            alias: *alias,
            have: selected.len(),
            need,
        });
    }

    Ok(selected.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sha256, Address, KeyPair, VERSION_ALIAS};
    use crate::multisig::group::OwnerGroup;
    use crate::multisig::store::SignatureContribution;
    use rand::rngs::StdRng;
    use rand::{Rng, RngCore, SeedableRng};

    fn keyed_store(keys: &[KeyPair], signers: &[usize]) -> SignatureStore {
        let digest = sha256(b"test digest");
        let mut store = SignatureStore::new();
        for &i in signers {
            let signature = keys[i].sign(&digest).unwrap();
            store
                .add(SignatureContribution::new(keys[i].address(), signature))
                .unwrap();
        }
        store
    }

    fn flat_tree(keys: &[KeyPair], threshold: u32) -> ResolvedOwner {
        let members: Vec<Address> = keys.iter().map(|k| k.address()).collect();
        let group = OwnerGroup::new(members.clone(), threshold, 0).unwrap();
        ResolvedOwner::Group {
            alias: None,
            group,
            children: members.into_iter().map(ResolvedOwner::Leaf).collect(),
        }
    }

    #[test]
    fn test_flat_group_in_member_order() {
        let keys: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let tree = flat_tree(&keys, 2);
        let store = keyed_store(&keys, &[1, 0]);

        let slots = build_signature_indices(&tree, &store).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].address, keys[0].address());
        assert_eq!(slots[0].path, vec![0]);
        assert_eq!(slots[1].address, keys[1].address());
        assert_eq!(slots[1].path, vec![1]);
    }

    #[test]
    fn test_canonical_ascending_subset() {
        // 2-of-3 with all three signed always selects members 0 and 1
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let tree = flat_tree(&keys, 2);
        let store = keyed_store(&keys, &[0, 1, 2]);

        let slots = build_signature_indices(&tree, &store).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].address, keys[0].address());
        assert_eq!(slots[1].address, keys[1].address());
    }

    #[test]
    fn test_gap_in_signers() {
        // 2-of-3 with members 0 and 2 signed keeps their positional indices
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let tree = flat_tree(&keys, 2);
        let store = keyed_store(&keys, &[0, 2]);

        let slots = build_signature_indices(&tree, &store).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].path, vec![0]);
        assert_eq!(slots[1].path, vec![2]);
        assert_eq!(slots[1].member_index(), 2);
    }

    #[test]
    fn test_threshold_not_met() {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let tree = flat_tree(&keys, 2);
        let store = keyed_store(&keys, &[1]);

        let result = build_signature_indices(&tree, &store);
        assert!(matches!(
            result,
            Err(BuildError::ThresholdNotMet {
                alias: None,
                have: 1,
                need: 2
            })
        ));
    }

    #[test]
    fn test_nested_group_counts_as_one_member() {
        // outer {X, inner} threshold 2, inner {C, D} threshold 1;
        // X and C sign -> [X, C]
        let x = KeyPair::generate();
        let c = KeyPair::generate();
        let d = KeyPair::generate();

        let inner_members = vec![c.address(), d.address()];
        let inner_group = OwnerGroup::new(inner_members.clone(), 1, 0).unwrap();
        let inner_alias = inner_group.alias_address();

        let outer_group =
            OwnerGroup::new(vec![x.address(), inner_alias], 2, 0).unwrap();
        let tree = ResolvedOwner::Group {
            alias: None,
            group: outer_group,
            children: vec![
                ResolvedOwner::Leaf(x.address()),
                ResolvedOwner::Group {
                    alias: Some(inner_alias),
                    group: inner_group,
                    children: inner_members.into_iter().map(ResolvedOwner::Leaf).collect(),
                },
            ],
        };

        let digest = sha256(b"test digest");
        let mut store = SignatureStore::new();
        for kp in [&x, &c] {
            store
                .add(SignatureContribution::new(
                    kp.address(),
                    kp.sign(&digest).unwrap(),
                ))
                .unwrap();
        }

        let slots = build_signature_indices(&tree, &store).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].address, x.address());
        assert_eq!(slots[0].path, vec![0]);
        assert_eq!(slots[1].address, c.address());
        assert_eq!(slots[1].path, vec![1, 0]);
    }

    #[test]
    fn test_unsatisfied_nested_group_fails_parent() {
        // outer {X, inner} threshold 2, inner {C, D} threshold 2; only C signs
        // inside -> inner unsatisfied -> outer threshold not met
        let x = KeyPair::generate();
        let c = KeyPair::generate();
        let d = KeyPair::generate();

        let inner_members = vec![c.address(), d.address()];
        let inner_group = OwnerGroup::new(inner_members.clone(), 2, 0).unwrap();
        let inner_alias = inner_group.alias_address();

        let outer_group =
            OwnerGroup::new(vec![x.address(), inner_alias], 2, 0).unwrap();
        let tree = ResolvedOwner::Group {
            alias: None,
            group: outer_group,
            children: vec![
                ResolvedOwner::Leaf(x.address()),
                ResolvedOwner::Group {
                    alias: Some(inner_alias),
                    group: inner_group,
                    children: inner_members.into_iter().map(ResolvedOwner::Leaf).collect(),
                },
            ],
        };

        let digest = sha256(b"test digest");
        let mut store = SignatureStore::new();
        for kp in [&x, &c] {
            store
                .add(SignatureContribution::new(
                    kp.address(),
                    kp.sign(&digest).unwrap(),
                ))
                .unwrap();
        }

        let result = build_signature_indices(&tree, &store);
        assert!(matches!(
            result,
            Err(BuildError::ThresholdNotMet {
                alias: None,
                have: 1,
                need: 2
            })
        ));
    }

    #[test]
    fn test_determinism() {
        let keys: Vec<KeyPair> = (0..4).map(|_| KeyPair::generate()).collect();
        let tree = flat_tree(&keys, 3);
        let store = keyed_store(&keys, &[3, 1, 0, 2]);

        let first = build_signature_indices(&tree, &store).unwrap();
        let second = build_signature_indices(&tree, &store).unwrap();
        assert_eq!(first, second);
    }

    // Reference satisfaction check used by the randomized test below
    fn satisfied(node: &ResolvedOwner, store: &SignatureStore) -> bool {
        match node {
            ResolvedOwner::Leaf(address) => store.contains(address),
            ResolvedOwner::Group {
                group, children, ..
            } => {
                let count = children.iter().filter(|c| satisfied(c, store)).count();
                count >= group.threshold as usize
            }
        }
    }

    fn random_tree(rng: &mut StdRng, depth: usize, leaves: &mut Vec<Address>) -> ResolvedOwner {
        let fanout = rng.gen_range(1..=4usize);
        let mut children = Vec::with_capacity(fanout);
        let mut members = Vec::with_capacity(fanout);

        for _ in 0..fanout {
            if depth > 0 && rng.gen_bool(0.3) {
                let child = random_tree(rng, depth - 1, leaves);
                let alias = match &child {
                    ResolvedOwner::Group { group, .. } => group.alias_address(),
                    ResolvedOwner::Leaf(address) => *address,
                };
                members.push(alias);
                children.push(child);
            } else {
                let mut payload = [0u8; 20];
                rng.fill_bytes(&mut payload);
                let address = Address::new(0x00, payload);
                leaves.push(address);
                members.push(address);
                children.push(ResolvedOwner::Leaf(address));
            }
        }

        let threshold = rng.gen_range(1..=fanout) as u32;
        let mut alias_payload = [0u8; 20];
        rng.fill_bytes(&mut alias_payload);
        ResolvedOwner::Group {
            alias: Some(Address::new(VERSION_ALIAS, alias_payload)),
            // Random member addresses collide with negligible probability
            group: OwnerGroup::new(members, threshold, 0).unwrap(),
            children,
        }
    }

    #[test]
    fn test_build_matches_reference_satisfaction() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let signing_key = KeyPair::generate();
        let digest = sha256(b"property digest");
        let signature = signing_key.sign(&digest).unwrap();

        for _ in 0..200 {
            let mut leaves = Vec::new();
            let tree = random_tree(&mut rng, 3, &mut leaves);

            let mut store = SignatureStore::new();
            for leaf in &leaves {
                if rng.gen_bool(0.6) {
                    // The store only keys by address; signature content is
                    // irrelevant to index building
                    store
                        .add(SignatureContribution::new(*leaf, signature))
                        .unwrap();
                }
            }

            let built = build_signature_indices(&tree, &store);
            assert_eq!(
                built.is_ok(),
                satisfied(&tree, &store),
                "builder disagrees with reference check"
            );

            if let Ok(slots) = built {
                // Every emitted slot must point at a contributed leaf
                for slot in &slots {
                    assert!(store.contains(&slot.address));
                }
                // Paths are emitted in strictly increasing walk order
                let paths: Vec<&Vec<u32>> = slots.iter().map(|s| &s.path).collect();
                let mut sorted = paths.clone();
                sorted.sort();
                assert_eq!(paths, sorted);
            }
        }
    }
}
