//! Repository for follow and favorite lists.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    membership::{MembershipChange, MembershipKind, MembershipList},
};

/// The outcome of an add or remove together with the list it left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipUpdate {
    pub change: MembershipChange,
    pub members: Vec<String>,
}

/// Storage for per-owner membership lists.
///
/// `add_member` and `remove_member` must be atomic per owner and list: two
/// concurrent adds of different ids must both be kept.
#[async_trait]
pub trait MembershipRepository: Send + Sync + 'static {
    /// Current members, empty when the owner has no list yet.
    async fn members(&self, kind: MembershipKind, owner: &str) -> Result<Vec<String>, Error>;

    /// Add `id` to the owner's list, creating the list if needed.
    async fn add_member(
        &self,
        kind: MembershipKind,
        owner: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error>;

    /// Remove `id` from the owner's list. An unknown owner reports `NotPresent`.
    async fn remove_member(
        &self,
        kind: MembershipKind,
        owner: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error>;
}

/// Process-local membership storage.
#[derive(Debug, Default)]
pub struct InMemoryMembershipRepository {
    lists: DashMap<(MembershipKind, String), MembershipList>,
}

impl InMemoryMembershipRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn members(&self, kind: MembershipKind, owner: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .lists
            .get(&(kind, owner.to_string()))
            .map(|list| list.as_slice().to_vec())
            .unwrap_or_default())
    }

    async fn add_member(
        &self,
        kind: MembershipKind,
        owner: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error> {
        let mut list = self.lists.entry((kind, owner.to_string())).or_default();
        let change = list.add(id);
        Ok(MembershipUpdate {
            change,
            members: list.as_slice().to_vec(),
        })
    }

    async fn remove_member(
        &self,
        kind: MembershipKind,
        owner: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error> {
        let Some(mut list) = self.lists.get_mut(&(kind, owner.to_string())) else {
            return Ok(MembershipUpdate {
                change: MembershipChange::NotPresent,
                members: Vec::new(),
            });
        };
        let change = list.remove(id);
        Ok(MembershipUpdate {
            change,
            members: list.as_slice().to_vec(),
        })
    }
}
