use std::sync::Arc;

use crate::{
    Error,
    error::ValidationError,
    membership::MembershipKind,
    repositories::{MembershipRepository, MembershipUpdate},
    validation::validate_member_id,
};

/// Follows and favorites on top of a [`MembershipRepository`].
pub struct MembershipService {
    repository: Arc<dyn MembershipRepository>,
}

impl MembershipService {
    pub fn new(repository: Arc<dyn MembershipRepository>) -> Self {
        Self { repository }
    }

    pub async fn follow_artist(
        &self,
        user_id: &str,
        artist_id: &str,
    ) -> Result<MembershipUpdate, Error> {
        self.add(MembershipKind::FollowedArtists, user_id, "artistId", artist_id)
            .await
    }

    pub async fn unfollow_artist(
        &self,
        user_id: &str,
        artist_id: &str,
    ) -> Result<MembershipUpdate, Error> {
        self.remove(MembershipKind::FollowedArtists, user_id, "artistId", artist_id)
            .await
    }

    pub async fn follow_user(
        &self,
        user_id: &str,
        target_user_id: &str,
    ) -> Result<MembershipUpdate, Error> {
        if user_id.trim() == target_user_id.trim() {
            return Err(
                ValidationError::InvalidField("users cannot follow themselves".to_string()).into(),
            );
        }
        self.add(
            MembershipKind::FollowedUsers,
            user_id,
            "targetUserId",
            target_user_id,
        )
        .await
    }

    pub async fn unfollow_user(
        &self,
        user_id: &str,
        target_user_id: &str,
    ) -> Result<MembershipUpdate, Error> {
        self.remove(
            MembershipKind::FollowedUsers,
            user_id,
            "targetUserId",
            target_user_id,
        )
        .await
    }

    pub async fn add_favorite(&self, user_id: &str, id: &str) -> Result<MembershipUpdate, Error> {
        self.add(MembershipKind::Favorites, user_id, "id", id).await
    }

    pub async fn remove_favorite(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error> {
        self.remove(MembershipKind::Favorites, user_id, "id", id).await
    }

    pub async fn members(&self, kind: MembershipKind, user_id: &str) -> Result<Vec<String>, Error> {
        let user_id = user_id.trim();
        validate_member_id("userId", user_id)?;
        self.repository.members(kind, user_id).await
    }

    async fn add(
        &self,
        kind: MembershipKind,
        user_id: &str,
        field: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error> {
        let (user_id, id) = (user_id.trim(), id.trim());
        validate_member_id("userId", user_id)?;
        validate_member_id(field, id)?;

        let update = self.repository.add_member(kind, user_id, id).await?;
        tracing::debug!(
            user_id = %user_id,
            list = %kind,
            id = %id,
            change = ?update.change,
            "Membership add"
        );
        Ok(update)
    }

    async fn remove(
        &self,
        kind: MembershipKind,
        user_id: &str,
        field: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error> {
        let (user_id, id) = (user_id.trim(), id.trim());
        validate_member_id("userId", user_id)?;
        validate_member_id(field, id)?;

        let update = self.repository.remove_member(kind, user_id, id).await?;
        tracing::debug!(
            user_id = %user_id,
            list = %kind,
            id = %id,
            change = ?update.change,
            "Membership remove"
        );
        Ok(update)
    }
}
