use serde::{Deserialize, Serialize};
use turntable_core::{
    AuthSession, AuthUser, MembershipChange, MembershipKind, MembershipUpdate, SignUp,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.access_token,
            refresh_token: session.refresh_token,
            user: session.user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: AuthUser,
    pub session: Option<AuthResponse>,
    pub email_confirmation_required: bool,
}

impl From<SignUp> for RegisterResponse {
    fn from(sign_up: SignUp) -> Self {
        Self {
            email_confirmation_required: !sign_up.user.is_email_confirmed(),
            user: sign_up.user,
            session: sign_up.session.map(AuthResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistQuery {
    #[serde(rename = "artistId")]
    pub artist_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetUserQuery {
    #[serde(rename = "targetUserId")]
    pub target_user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteQuery {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub changed: bool,
    pub message: String,
    pub members: Vec<String>,
}

impl MembershipResponse {
    pub fn new(kind: MembershipKind, update: MembershipUpdate) -> Self {
        Self {
            changed: update.change.changed(),
            message: message(kind, update.change).to_string(),
            members: update.members,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembersResponse {
    pub members: Vec<String>,
}

fn message(kind: MembershipKind, change: MembershipChange) -> &'static str {
    use MembershipChange::*;
    use MembershipKind::*;

    match (kind, change) {
        (FollowedArtists, Added) => "Artist followed",
        (FollowedArtists, AlreadyPresent) => "Artist already followed",
        (FollowedArtists, Removed) => "Artist unfollowed",
        (FollowedArtists, NotPresent) => "User is not following this artist",
        (FollowedUsers, Added) => "User followed",
        (FollowedUsers, AlreadyPresent) => "User already followed",
        (FollowedUsers, Removed) => "User unfollowed",
        (FollowedUsers, NotPresent) => "User is not following this user",
        (Favorites, Added) => "Favorite added",
        (Favorites, AlreadyPresent) => "Already in favorites",
        (Favorites, Removed) => "Favorite removed",
        (Favorites, NotPresent) => "Not in favorites",
    }
}
