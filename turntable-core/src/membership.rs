//! Id lists behind follows and favorites.
//!
//! A user's followed artists, followed users and favorites are each stored as
//! one ordered list of ids. Adding an id already present and removing one that
//! is absent are reported, not treated as errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which list an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    FollowedArtists,
    FollowedUsers,
    Favorites,
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipKind::FollowedArtists => write!(f, "followed_artists"),
            MembershipKind::FollowedUsers => write!(f, "followed_users"),
            MembershipKind::Favorites => write!(f, "favorites"),
        }
    }
}

/// Result of an add or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipChange {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

impl MembershipChange {
    pub fn changed(&self) -> bool {
        matches!(self, MembershipChange::Added | MembershipChange::Removed)
    }
}

/// Ordered list of unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct MembershipList {
    ids: Vec<String>,
}

impl MembershipList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored ids, keeping the first occurrence of each.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for id in ids {
            list.add(id);
        }
        list
    }

    /// Append `id` unless it is already present.
    pub fn add(&mut self, id: impl Into<String>) -> MembershipChange {
        let id = id.into();
        if self.contains(&id) {
            return MembershipChange::AlreadyPresent;
        }
        self.ids.push(id);
        MembershipChange::Added
    }

    /// Remove `id` if present, preserving the order of the rest.
    pub fn remove(&mut self, id: &str) -> MembershipChange {
        match self.ids.iter().position(|existing| existing == id) {
            Some(index) => {
                self.ids.remove(index);
                MembershipChange::Removed
            }
            None => MembershipChange::NotPresent,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ids
    }
}

impl From<Vec<String>> for MembershipList {
    fn from(ids: Vec<String>) -> Self {
        Self::from_ids(ids)
    }
}

impl From<MembershipList> for Vec<String> {
    fn from(list: MembershipList) -> Self {
        list.ids
    }
}
