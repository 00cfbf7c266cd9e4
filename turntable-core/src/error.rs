use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    RateLimited(#[from] RateLimited),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not confirmed. Please verify your email address first.")]
    EmailNotConfirmed,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Invalid or expired access token")]
    InvalidToken,

    #[error("Registration rejected: {0}")]
    SignUpRejected(String),

    #[error("Authentication provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// An identity is temporarily blocked from attempting to log in.
///
/// Both durations are rounded up, so a lockout with 61 seconds left reports
/// two minutes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Too many login attempts. Please try again in {retry_after_minutes} minutes.")]
pub struct RateLimited {
    pub retry_after_seconds: u64,
    pub retry_after_minutes: u64,
}

impl RateLimited {
    /// Build from the time left until the lockout ends.
    ///
    /// A non-positive remainder still reports one second so callers never see
    /// a zero retry hint alongside a rejection.
    pub fn from_remaining(remaining: chrono::Duration) -> Self {
        let millis = remaining.num_milliseconds().max(1) as u64;
        let retry_after_seconds = millis.div_ceil(1000);
        Self {
            retry_after_seconds,
            retry_after_minutes: retry_after_seconds.div_ceil(60),
        }
    }
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::InvalidCredentials)
                | Error::Auth(AuthError::EmailNotConfirmed)
                | Error::Auth(AuthError::InvalidRefreshToken)
                | Error::Auth(AuthError::InvalidToken)
        )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let auth_error = Error::Auth(AuthError::InvalidCredentials);
        assert_eq!(
            auth_error.to_string(),
            "Authentication error: Invalid credentials"
        );

        let validation_error =
            Error::Validation(ValidationError::InvalidEmail("test@".to_string()));
        assert_eq!(
            validation_error.to_string(),
            "Validation error: Invalid email format: test@"
        );

        let storage_error = Error::Storage(StorageError::NotFound);
        assert_eq!(storage_error.to_string(), "Storage error: Record not found");
    }

    #[test]
    fn test_rate_limited_display_is_transparent() {
        let error = Error::RateLimited(RateLimited::from_remaining(chrono::Duration::minutes(15)));
        assert_eq!(
            error.to_string(),
            "Too many login attempts. Please try again in 15 minutes."
        );
    }

    #[test]
    fn test_rate_limited_rounds_up() {
        let limited = RateLimited::from_remaining(chrono::Duration::seconds(61));
        assert_eq!(limited.retry_after_seconds, 61);
        assert_eq!(limited.retry_after_minutes, 2);

        let limited = RateLimited::from_remaining(chrono::Duration::milliseconds(1500));
        assert_eq!(limited.retry_after_seconds, 2);
        assert_eq!(limited.retry_after_minutes, 1);

        let limited = RateLimited::from_remaining(chrono::Duration::minutes(15));
        assert_eq!(limited.retry_after_seconds, 900);
        assert_eq!(limited.retry_after_minutes, 15);
    }

    #[test]
    fn test_rate_limited_never_reports_zero() {
        let limited = RateLimited::from_remaining(chrono::Duration::zero());
        assert_eq!(limited.retry_after_seconds, 1);
        assert_eq!(limited.retry_after_minutes, 1);
    }

    #[test]
    fn test_error_predicates() {
        assert!(Error::Auth(AuthError::InvalidCredentials).is_auth_error());
        assert!(Error::Auth(AuthError::EmailNotConfirmed).is_auth_error());
        assert!(!Error::Auth(AuthError::Provider("down".to_string())).is_auth_error());
        let missing = ValidationError::MissingField("email".to_string());
        assert!(Error::Validation(missing).is_validation_error());
        assert!(Error::Storage(StorageError::NotFound).is_storage_error());

        let limited: Error = RateLimited::from_remaining(chrono::Duration::seconds(30)).into();
        assert!(limited.is_rate_limited());
        assert!(!limited.is_auth_error());
    }
}
