//! # Turntable Axum Integration
//!
//! Axum routes for the turntable backend.
//!
//! ## Endpoints
//!
//! - **Health**: `GET /health`
//! - **Authentication**: `POST /auth/register`, `POST /auth/login`,
//!   `POST /auth/refresh`, `GET /auth/validate` (bearer token) and
//!   `POST /auth/resend/{email}`. Login is throttled per email; a locked-out
//!   email gets `429 Too Many Requests` with a `Retry-After` header.
//! - **Follows**: `POST /follows/follow-artist/{user_id}?artistId=...`,
//!   `unfollow-artist`, `follow-user`/`unfollow-user` with `targetUserId`,
//!   and `GET /follows/{user_id}/artists`, `GET /follows/{user_id}/users`
//! - **Favorites**: `POST /favorites/add/{user_id}?id=...`,
//!   `POST /favorites/remove/{user_id}?id=...`, `GET /favorites/{user_id}`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use turntable_axum::AppState;
//! use turntable_core::{
//!     AuthService, CredentialVerifier, InMemoryMembershipRepository, InMemoryProfileRepository,
//!     LoginThrottle, MembershipService, SystemClock,
//! };
//!
//! # async fn run(verifier: Arc<dyn CredentialVerifier>) {
//! let throttle = Arc::new(LoginThrottle::default());
//! let profiles = Arc::new(InMemoryProfileRepository::new());
//! let state = AppState {
//!     auth: Arc::new(AuthService::new(verifier, profiles, throttle, Arc::new(SystemClock))),
//!     memberships: Arc::new(MembershipService::new(Arc::new(
//!         InMemoryMembershipRepository::new(),
//!     ))),
//! };
//!
//! let app = turntable_axum::routes(state).build();
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```

mod error;
mod extractors;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::BearerToken;
pub use routes::{AppState, create_router};
pub use types::{
    ArtistQuery, AuthResponse, FavoriteQuery, HealthResponse, LoginRequest, MembersResponse,
    MembershipResponse, MessageResponse, RefreshRequest, RegisterRequest, RegisterResponse,
    TargetUserQuery,
};

use axum::Router;

/// Create the API router for your Axum application.
///
/// The returned builder can be turned into a [`Router`] with
/// [`build`](ApiRouterBuilder::build) or `Router::from`.
pub fn routes(state: AppState) -> ApiRouterBuilder {
    ApiRouterBuilder {
        state,
        prefix: None,
    }
}

/// Builder for configuring the API routes
pub struct ApiRouterBuilder {
    state: AppState,
    prefix: Option<String>,
}

impl ApiRouterBuilder {
    /// Serve every route under `prefix`, e.g. `"/api"`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Build the router with the configured options
    pub fn build(self) -> Router {
        let router = create_router(self.state);
        match self.prefix {
            Some(prefix) => Router::new().nest(&prefix, router),
            None => router,
        }
    }
}

impl From<ApiRouterBuilder> for Router {
    fn from(builder: ApiRouterBuilder) -> Self {
        builder.build()
    }
}
