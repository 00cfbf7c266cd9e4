//! Repository for public user profiles.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::Error;

/// Storage for the profile row created alongside each account.
#[async_trait]
pub trait ProfileRepository: Send + Sync + 'static {
    /// Set the public username of `user_id`.
    async fn set_username(&self, user_id: &str, username: &str) -> Result<(), Error>;
}

/// Process-local profile storage.
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    usernames: DashMap<String, String>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(&self, user_id: &str) -> Option<String> {
        self.usernames.get(user_id).map(|name| name.value().clone())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn set_username(&self, user_id: &str, username: &str) -> Result<(), Error> {
        self.usernames
            .insert(user_id.to_string(), username.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_username_overwrites() {
        let repo = InMemoryProfileRepository::new();
        assert_eq!(repo.username("user-1"), None);

        repo.set_username("user-1", "first_name").await.unwrap();
        repo.set_username("user-1", "second_name").await.unwrap();
        assert_eq!(repo.username("user-1").as_deref(), Some("second_name"));
    }
}
