use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use turntable_core::{AuthError, Error as CoreError, RateLimited, StorageError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    RateLimited(RateLimited),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Authentication provider unavailable")]
    BadGateway,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RateLimited(limited) => ApiError::RateLimited(limited),
            CoreError::Auth(AuthError::InvalidCredentials) => ApiError::InvalidCredentials,
            CoreError::Auth(AuthError::Provider(_)) => ApiError::BadGateway,
            CoreError::Auth(AuthError::SignUpRejected(msg)) => ApiError::BadRequest(msg),
            CoreError::Auth(e) => ApiError::Unauthorized(e.to_string()),
            CoreError::Validation(e) => ApiError::BadRequest(e.to_string()),
            CoreError::Storage(StorageError::NotFound) => ApiError::NotFound,
            CoreError::Storage(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::RateLimited(limited) => return rate_limited_response(limited),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway => (
                StatusCode::BAD_GATEWAY,
                "Authentication provider unavailable".to_string(),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// 429 with the lockout remainder in `Retry-After` (seconds) and in the body (minutes).
fn rate_limited_response(limited: RateLimited) -> Response {
    let status = StatusCode::TOO_MANY_REQUESTS;
    let body = Json(json!({
        "error": limited.to_string(),
        "code": status.as_u16(),
        "retry_after_minutes": limited.retry_after_minutes,
    }));

    (
        status,
        [(header::RETRY_AFTER, limited.retry_after_seconds.to_string())],
        body,
    )
        .into_response()
}

pub type Result<T> = std::result::Result<T, ApiError>;
