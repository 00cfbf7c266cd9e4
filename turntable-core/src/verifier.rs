//! The external authentication provider as seen by the login flow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// The user an authentication provider vouches for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    pub fn is_email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Tokens issued by the provider after a successful sign-in or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

/// A freshly registered account.
///
/// `session` is `None` while the provider waits for the email address to be
/// confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUp {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

/// Checks credentials against an external authentication provider.
///
/// Implementations return [`AuthError::InvalidCredentials`] for a rejected
/// email/password pair and [`AuthError::Provider`] when the provider could not
/// be reached or answered unexpectedly. Both count as a failed attempt.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    async fn verify(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Exchange a refresh token for a new session.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Create an account. A refusal (address taken, weak password) is
    /// [`AuthError::SignUpRejected`].
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError>;

    /// Resolve an access token to its user, or [`AuthError::InvalidToken`].
    async fn user_for_token(&self, access_token: &str) -> Result<AuthUser, AuthError>;

    /// Send the sign-up confirmation email again.
    async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError>;
}
