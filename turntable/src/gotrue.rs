//! Credential verification against the hosted backend's auth API.
//!
//! Sign-in and refresh both hit the GoTrue token endpoint, with
//! `grant_type=password` and `grant_type=refresh_token` respectively.
//! Registration, token lookup and confirmation resends use `/signup`, `/user`
//! and `/resend`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use turntable_core::{AuthError, AuthSession, AuthUser, CredentialVerifier, SignUp};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GoTrueVerifier {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<DateTime<Utc>>,
}

/// `/signup` answers with a session when confirmation is disabled and with the
/// bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(GoTrueUser),
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            email_confirmed_at: user.email_confirmed_at,
        }
    }
}

impl From<TokenResponse> for AuthSession {
    fn from(token: TokenResponse) -> Self {
        AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user: token.user.into(),
        }
    }
}

impl From<SignUpResponse> for SignUp {
    fn from(response: SignUpResponse) -> Self {
        match response {
            SignUpResponse::Session(token) => {
                let session = AuthSession::from(token);
                SignUp {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignUpResponse::User(user) => SignUp {
                user: user.into(),
                session: None,
            },
        }
    }
}

impl GoTrueVerifier {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn token_url(&self, grant_type: &str) -> String {
        self.url(&format!("token?grant_type={grant_type}"))
    }

    /// Send `request`, turning a refusal into `rejected(provider message)`.
    async fn execute(
        &self,
        request: RequestBuilder,
        rejected: impl FnOnce(String) -> AuthError,
    ) -> Result<Response, AuthError> {
        let response = request
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = provider_message(&body).unwrap_or_else(|| status.to_string());
        tracing::debug!(status = %status, message = %message, "Auth request rejected");
        Err(classify_status(status, rejected(message)))
    }

    async fn request_token(
        &self,
        grant_type: &str,
        body: Value,
        rejected: AuthError,
    ) -> Result<AuthSession, AuthError> {
        let request = self
            .client
            .post(self.token_url(grant_type))
            .bearer_auth(&self.api_key)
            .json(&body);
        let response = self.execute(request, |_| rejected).await?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("malformed token response: {e}")))?;
        Ok(token.into())
    }
}

/// Client errors mean the provider said no; anything else means it could not answer.
fn classify_status(status: StatusCode, rejected: AuthError) -> AuthError {
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        rejected
    } else {
        AuthError::Provider(format!("unexpected status {status}"))
    }
}

/// Human-readable reason from a GoTrue error body.
fn provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message"]
        .iter()
        .find_map(|key| value.get(key)?.as_str())
        .map(str::to_string)
}

#[async_trait]
impl CredentialVerifier for GoTrueVerifier {
    async fn verify(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.request_token(
            "password",
            json!({ "email": email, "password": password }),
            AuthError::InvalidCredentials,
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        self.request_token(
            "refresh_token",
            json!({ "refresh_token": refresh_token }),
            AuthError::InvalidRefreshToken,
        )
        .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        let request = self
            .client
            .post(self.url("signup"))
            .bearer_auth(&self.api_key)
            .json(&json!({ "email": email, "password": password }));
        let response = self.execute(request, AuthError::SignUpRejected).await?;

        let sign_up: SignUpResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("malformed sign-up response: {e}")))?;
        Ok(sign_up.into())
    }

    async fn user_for_token(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let request = self.client.get(self.url("user")).bearer_auth(access_token);
        let response = self.execute(request, |_| AuthError::InvalidToken).await?;

        let user: GoTrueUser = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("malformed user response: {e}")))?;
        Ok(user.into())
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError> {
        let request = self
            .client
            .post(self.url("resend"))
            .bearer_auth(&self.api_key)
            .json(&json!({ "type": "signup", "email": email }));
        self.execute(request, AuthError::Provider).await?;
        Ok(())
    }
}
