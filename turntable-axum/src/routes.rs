use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use turntable_core::{AuthService, MembershipKind, MembershipService};

use crate::{
    error::{ApiError, Result},
    extractors::BearerToken,
    types::*,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub memberships: Arc<MembershipService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/auth", auth_routes())
        .nest("/follows", follow_routes())
        .nest("/favorites", favorite_routes())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/validate", get(validate_handler))
        .route("/resend/{email}", post(resend_handler))
}

fn follow_routes() -> Router<AppState> {
    Router::new()
        .route("/follow-artist/{user_id}", post(follow_artist_handler))
        .route("/unfollow-artist/{user_id}", post(unfollow_artist_handler))
        .route("/follow-user/{user_id}", post(follow_user_handler))
        .route("/unfollow-user/{user_id}", post(unfollow_user_handler))
        .route("/{user_id}/artists", get(followed_artists_handler))
        .route("/{user_id}/users", get(followed_users_handler))
}

fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/add/{user_id}", post(add_favorite_handler))
        .route("/remove/{user_id}", post(remove_favorite_handler))
        .route("/{user_id}", get(favorites_handler))
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let sign_up = state
        .auth
        .register(&payload.username, &payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse::from(sign_up))))
}

async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let session = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(AuthResponse::from(session)))
}

async fn refresh_handler(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse> {
    let session = state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(AuthResponse::from(session)))
}

async fn validate_handler(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse> {
    let token =
        token.ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
    let user = state.auth.validate_token(&token).await?;
    Ok(Json(user))
}

async fn resend_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    state.auth.resend_confirmation(&email).await?;
    Ok(Json(MessageResponse {
        message: "If the account is awaiting confirmation, a new email has been sent"
            .to_string(),
    }))
}

async fn follow_artist_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ArtistQuery>,
) -> Result<impl IntoResponse> {
    let update = state
        .memberships
        .follow_artist(&user_id, &query.artist_id)
        .await?;
    Ok(Json(MembershipResponse::new(
        MembershipKind::FollowedArtists,
        update,
    )))
}

async fn unfollow_artist_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ArtistQuery>,
) -> Result<impl IntoResponse> {
    let update = state
        .memberships
        .unfollow_artist(&user_id, &query.artist_id)
        .await?;
    Ok(Json(MembershipResponse::new(
        MembershipKind::FollowedArtists,
        update,
    )))
}

async fn follow_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<TargetUserQuery>,
) -> Result<impl IntoResponse> {
    let update = state
        .memberships
        .follow_user(&user_id, &query.target_user_id)
        .await?;
    Ok(Json(MembershipResponse::new(
        MembershipKind::FollowedUsers,
        update,
    )))
}

async fn unfollow_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<TargetUserQuery>,
) -> Result<impl IntoResponse> {
    let update = state
        .memberships
        .unfollow_user(&user_id, &query.target_user_id)
        .await?;
    Ok(Json(MembershipResponse::new(
        MembershipKind::FollowedUsers,
        update,
    )))
}

async fn followed_artists_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let members = state
        .memberships
        .members(MembershipKind::FollowedArtists, &user_id)
        .await?;
    Ok(Json(MembersResponse { members }))
}

async fn followed_users_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let members = state
        .memberships
        .members(MembershipKind::FollowedUsers, &user_id)
        .await?;
    Ok(Json(MembersResponse { members }))
}

async fn add_favorite_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FavoriteQuery>,
) -> Result<impl IntoResponse> {
    let update = state.memberships.add_favorite(&user_id, &query.id).await?;
    Ok(Json(MembershipResponse::new(MembershipKind::Favorites, update)))
}

async fn remove_favorite_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FavoriteQuery>,
) -> Result<impl IntoResponse> {
    let update = state
        .memberships
        .remove_favorite(&user_id, &query.id)
        .await?;
    Ok(Json(MembershipResponse::new(MembershipKind::Favorites, update)))
}

async fn favorites_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let members = state
        .memberships
        .members(MembershipKind::Favorites, &user_id)
        .await?;
    Ok(Json(MembersResponse { members }))
}
