//! Alias resolution
//!
//! Expands threshold groups whose members are themselves group aliases into
//! a concrete ownership tree. Resolution is performed freshly on every call:
//! alias definitions live in ledger state and can be re-pointed between the
//! unsigned-transaction snapshot and the act of signing, so nothing is cached
//! across independent resolution passes.

use futures::future::BoxFuture;
use std::collections::HashMap;
use thiserror::Error;

use crate::crypto::Address;
use crate::multisig::group::{GroupError, OwnerGroup};

/// Default bound on alias nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Errors that can occur during alias resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("alias not found: {0}")]
    AliasNotFound(Address),
    #[error("cyclic alias reference at {0}")]
    CyclicAlias(Address),
    #[error("alias resolution exceeded maximum depth {0}")]
    ResolutionTooDeep(usize),
    #[error("invalid group definition: {0}")]
    InvalidGroup(#[from] GroupError),
    #[error("alias lookup failed: {0}")]
    Lookup(String),
}

/// Capability to look up the group definition behind an alias address
///
/// Returns `Ok(None)` when the address is not a registered alias (an ordinary
/// signing key), and `Err` only for lookup failures such as an unreachable
/// ledger node.
pub trait AliasLookup: Send + Sync {
    fn lookup<'a>(
        &'a self,
        address: &'a Address,
    ) -> BoxFuture<'a, Result<Option<OwnerGroup>, ResolveError>>;
}

/// Map-backed alias lookup for tests and offline resolution
#[derive(Debug, Clone, Default)]
pub struct StaticAliasLookup {
    groups: HashMap<Address, OwnerGroup>,
}

impl StaticAliasLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group under an alias address
    pub fn insert(&mut self, alias: Address, group: OwnerGroup) {
        self.groups.insert(alias, group);
    }

    /// Register a group under its derived alias address
    pub fn insert_derived(&mut self, group: OwnerGroup) -> Address {
        let alias = group.alias_address();
        self.groups.insert(alias, group);
        alias
    }
}

impl AliasLookup for StaticAliasLookup {
    fn lookup<'a>(
        &'a self,
        address: &'a Address,
    ) -> BoxFuture<'a, Result<Option<OwnerGroup>, ResolveError>> {
        Box::pin(async move { Ok(self.groups.get(address).cloned()) })
    }
}

/// A node of the resolved ownership tree
///
/// Built once per resolution pass and discarded with it. Acyclic by
/// construction: cycles are rejected during resolution, never represented.
#[derive(Debug, Clone)]
pub enum ResolvedOwner {
    /// An ordinary signing key
    Leaf(Address),
    /// An expanded group; `children` has one node per member, in member order
    Group {
        /// Alias address this group was expanded from, if any
        alias: Option<Address>,
        group: OwnerGroup,
        children: Vec<ResolvedOwner>,
    },
}

impl ResolvedOwner {
    /// All leaf addresses of the tree, in walk order
    pub fn leaf_addresses(&self) -> Vec<Address> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<Address>) {
        match self {
            ResolvedOwner::Leaf(address) => out.push(*address),
            ResolvedOwner::Group { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

/// Resolves alias members of a group into a concrete ownership tree
pub struct AliasResolver<'a> {
    lookup: &'a dyn AliasLookup,
    max_depth: usize,
}

impl<'a> AliasResolver<'a> {
    /// Create a resolver with the default depth bound
    pub fn new(lookup: &'a dyn AliasLookup) -> Self {
        Self {
            lookup,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a resolver with a custom depth bound
    pub fn with_max_depth(lookup: &'a dyn AliasLookup, max_depth: usize) -> Self {
        Self { lookup, max_depth }
    }

    /// Resolve a root group whose definition is already known
    pub async fn resolve(&self, root: &OwnerGroup) -> Result<ResolvedOwner, ResolveError> {
        self.resolve_group(None, root.clone(), Vec::new(), 0).await
    }

    /// Resolve starting from an alias address
    pub async fn resolve_alias(&self, alias: &Address) -> Result<ResolvedOwner, ResolveError> {
        let group = self
            .lookup
            .lookup(alias)
            .await?
            .ok_or(ResolveError::AliasNotFound(*alias))?;
        self.resolve_group(Some(*alias), group, vec![*alias], 1)
            .await
    }

    fn resolve_group(
        &self,
        alias: Option<Address>,
        group: OwnerGroup,
        path: Vec<Address>,
        depth: usize,
    ) -> BoxFuture<'_, Result<ResolvedOwner, ResolveError>> {
        Box::pin(async move {
            if depth > self.max_depth {
                return Err(ResolveError::ResolutionTooDeep(self.max_depth));
            }

            let mut children = Vec::with_capacity(group.members.len());
            for member in &group.members {
                // A member equal to an ancestor alias would recurse forever
                if path.contains(member) {
                    return Err(ResolveError::CyclicAlias(*member));
                }

                match self.lookup.lookup(member).await? {
                    Some(sub_group) => {
                        let mut sub_path = path.clone();
                        sub_path.push(*member);
                        children.push(
                            self.resolve_group(Some(*member), sub_group, sub_path, depth + 1)
                                .await?,
                        );
                    }
                    None => children.push(ResolvedOwner::Leaf(*member)),
                }
            }

            Ok(ResolvedOwner::Group {
                alias,
                group,
                children,
            })
        })
    }
}
