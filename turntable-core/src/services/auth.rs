//! Account flows on top of the external authentication provider.
//!
//! Password login is guarded by the login throttle. The flow is: validate
//! input, ask the throttle, ask the credential verifier, then always tell the
//! throttle what the verifier said. A rate-limited identity never reaches the
//! verifier.

use std::sync::Arc;

use crate::{
    Error,
    clock::Clock,
    error::{AuthError, ValidationError},
    repositories::ProfileRepository,
    services::LoginThrottle,
    validation::{
        validate_email, validate_new_password, validate_password_present, validate_username,
    },
    verifier::{AuthSession, AuthUser, CredentialVerifier, SignUp},
};

pub struct AuthService {
    verifier: Arc<dyn CredentialVerifier>,
    profiles: Arc<dyn ProfileRepository>,
    throttle: Arc<LoginThrottle>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        profiles: Arc<dyn ProfileRepository>,
        throttle: Arc<LoginThrottle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            profiles,
            throttle,
            clock,
        }
    }

    pub fn throttle(&self) -> &Arc<LoginThrottle> {
        &self.throttle
    }

    /// Log in with an email and password.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a malformed email or missing password
    /// - [`Error::RateLimited`] while the identity is locked out
    /// - [`AuthError::InvalidCredentials`] when the provider rejects the pair
    /// - [`AuthError::EmailNotConfirmed`] when the account has not been confirmed
    /// - [`AuthError::Provider`] when the provider is unavailable
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, Error> {
        let email = email.trim();
        validate_email(email)?;
        validate_password_present(password)?;

        if let Err(limited) = self.throttle.check_allowed(email, self.clock.now()) {
            tracing::warn!(
                email = %email,
                retry_after_seconds = limited.retry_after_seconds,
                "Login rejected, identity is rate limited"
            );
            return Err(limited.into());
        }

        let outcome = self.verifier.verify(email, password).await;
        self.throttle
            .record_outcome(email, self.clock.now(), outcome.is_ok());

        let session = match outcome {
            Ok(session) => session,
            Err(AuthError::Provider(message)) => {
                tracing::error!(email = %email, error = %message, "Authentication provider failed");
                return Err(AuthError::Provider(message).into());
            }
            Err(e) => {
                tracing::info!(email = %email, error = %e, "Login failed");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !session.user.is_email_confirmed() {
            tracing::info!(email = %email, "Login with unconfirmed email");
            return Err(AuthError::EmailNotConfirmed.into());
        }

        tracing::info!(user_id = %session.user.id, "Login succeeded");
        Ok(session)
    }

    /// Exchange a refresh token for a new session. Not throttled.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, Error> {
        if refresh_token.trim().is_empty() {
            return Err(
                ValidationError::MissingField("refresh_token is required".to_string()).into(),
            );
        }

        match self.verifier.refresh(refresh_token).await {
            Ok(session) => {
                tracing::debug!(user_id = %session.user.id, "Session refreshed");
                Ok(session)
            }
            Err(AuthError::Provider(message)) => {
                tracing::error!(error = %message, "Authentication provider failed during refresh");
                Err(AuthError::Provider(message).into())
            }
            Err(e) => {
                tracing::info!(error = %e, "Token refresh failed");
                Err(AuthError::InvalidRefreshToken.into())
            }
        }
    }

    /// Create an account and record its public username.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a malformed username, email or password
    /// - [`AuthError::SignUpRejected`] when the provider refuses the account
    /// - [`AuthError::Provider`] when the provider is unavailable
    /// - [`Error::Storage`] when the username cannot be saved
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUp, Error> {
        let (username, email) = (username.trim(), email.trim());
        validate_username(username)?;
        validate_email(email)?;
        validate_new_password(password)?;

        let sign_up = match self.verifier.sign_up(email, password).await {
            Ok(sign_up) => sign_up,
            Err(AuthError::Provider(message)) => {
                tracing::error!(email = %email, error = %message, "Authentication provider failed");
                return Err(AuthError::Provider(message).into());
            }
            Err(AuthError::SignUpRejected(reason)) => {
                tracing::info!(email = %email, reason = %reason, "Registration rejected");
                return Err(AuthError::SignUpRejected(reason).into());
            }
            Err(e) => return Err(AuthError::SignUpRejected(e.to_string()).into()),
        };

        self.profiles
            .set_username(&sign_up.user.id, username)
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = %sign_up.user.id, error = %e, "Failed to save username");
            })?;

        tracing::info!(
            user_id = %sign_up.user.id,
            confirmed = sign_up.user.is_email_confirmed(),
            "User registered"
        );
        Ok(sign_up)
    }

    /// Resolve an access token to the user it was issued to.
    pub async fn validate_token(&self, access_token: &str) -> Result<AuthUser, Error> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(AuthError::InvalidToken.into());
        }

        match self.verifier.user_for_token(access_token).await {
            Ok(user) => Ok(user),
            Err(AuthError::Provider(message)) => {
                tracing::error!(
                    error = %message,
                    "Authentication provider failed during token check"
                );
                Err(AuthError::Provider(message).into())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                Err(AuthError::InvalidToken.into())
            }
        }
    }

    /// Ask the provider to send the sign-up confirmation email again.
    ///
    /// Only a malformed address is reported. Provider failures are logged and
    /// swallowed so the response does not reveal whether an account exists.
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), Error> {
        let email = email.trim();
        validate_email(email)?;

        if let Err(e) = self.verifier.resend_confirmation(email).await {
            tracing::warn!(email = %email, error = %e, "Resending confirmation failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, repositories::InMemoryProfileRepository};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;

    /// Mock provider that accepts one password and records every call.
    struct MockVerifier {
        password: String,
        confirmed: bool,
        provider_down: bool,
        calls: Mutex<Vec<String>>,
        resent: Mutex<Vec<String>>,
    }

    impl MockVerifier {
        fn new(password: &str) -> Self {
            Self {
                password: password.to_string(),
                confirmed: true,
                provider_down: false,
                calls: Mutex::new(Vec::new()),
                resent: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn session(&self, email: &str) -> AuthSession {
            AuthSession {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                user: AuthUser {
                    id: "user-1".to_string(),
                    email: email.to_string(),
                    email_confirmed_at: self.confirmed.then(Utc::now),
                },
            }
        }
    }

    #[async_trait]
    impl CredentialVerifier for MockVerifier {
        async fn verify(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
            self.calls.lock().unwrap().push(email.to_string());
            if self.provider_down {
                return Err(AuthError::Provider("connection refused".to_string()));
            }
            if password == self.password {
                Ok(self.session(email))
            } else {
                Err(AuthError::InvalidCredentials)
            }
        }

        async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
            if refresh_token == "refresh" {
                Ok(self.session("user@example.com"))
            } else {
                Err(AuthError::InvalidRefreshToken)
            }
        }

        async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUp, AuthError> {
            if self.provider_down {
                return Err(AuthError::Provider("connection refused".to_string()));
            }
            if email == "taken@example.com" {
                return Err(AuthError::SignUpRejected("User already registered".to_string()));
            }
            let mut session = self.session(email);
            session.user.email_confirmed_at = None;
            Ok(SignUp {
                user: session.user,
                session: None,
            })
        }

        async fn user_for_token(&self, access_token: &str) -> Result<AuthUser, AuthError> {
            if self.provider_down {
                return Err(AuthError::Provider("connection refused".to_string()));
            }
            if access_token == "access" {
                Ok(self.session("user@example.com").user)
            } else {
                Err(AuthError::InvalidToken)
            }
        }

        async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError> {
            self.resent.lock().unwrap().push(email.to_string());
            if self.provider_down {
                return Err(AuthError::Provider("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn service(verifier: MockVerifier) -> (AuthService, Arc<MockVerifier>, Arc<ManualClock>) {
        let (service, verifier, clock, _) = service_with_profiles(verifier);
        (service, verifier, clock)
    }

    fn service_with_profiles(
        verifier: MockVerifier,
    ) -> (
        AuthService,
        Arc<MockVerifier>,
        Arc<ManualClock>,
        Arc<InMemoryProfileRepository>,
    ) {
        let verifier = Arc::new(verifier);
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        let service = AuthService::new(
            verifier.clone(),
            profiles.clone(),
            Arc::new(LoginThrottle::default()),
            clock.clone(),
        );
        (service, verifier, clock, profiles)
    }

    #[tokio::test]
    async fn test_login_success() {
        let (service, verifier, _) = service(MockVerifier::new("correct-horse"));

        let session = service
            .login("user@example.com", "correct-horse")
            .await
            .unwrap();
        assert_eq!(session.user.email, "user@example.com");
        assert_eq!(verifier.call_count(), 1);
        assert!(service.throttle().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let (service, _, _) = service(MockVerifier::new("correct-horse"));

        let err = service
            .login("user@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
        assert_eq!(
            service.throttle().record("user@example.com").unwrap().failure_count,
            1
        );
    }

    #[tokio::test]
    async fn test_lockout_skips_verifier() {
        let (service, verifier, clock) = service(MockVerifier::new("correct-horse"));

        for _ in 0..5 {
            let err = service.login("user@example.com", "wrong").await.unwrap_err();
            assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
        }
        assert_eq!(verifier.call_count(), 5);

        let err = service
            .login("user@example.com", "correct-horse")
            .await
            .unwrap_err();
        match err {
            Error::RateLimited(limited) => assert_eq!(limited.retry_after_minutes, 15),
            other => panic!("expected rate limit, got {other:?}"),
        }
        assert_eq!(verifier.call_count(), 5);

        clock.advance(Duration::minutes(16));
        assert!(service.login("user@example.com", "correct-horse").await.is_ok());
        assert_eq!(verifier.call_count(), 6);
    }

    #[tokio::test]
    async fn test_email_case_shares_counter() {
        let (service, _, _) = service(MockVerifier::new("correct-horse"));

        for email in ["User@Example.com", "user@example.com", " USER@EXAMPLE.COM "] {
            let _ = service.login(email, "wrong").await;
        }
        assert_eq!(
            service.throttle().record("user@example.com").unwrap().failure_count,
            3
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_email_is_rejected_but_resets_counter() {
        let mut verifier = MockVerifier::new("correct-horse");
        verifier.confirmed = false;
        let (service, _, _) = service(verifier);

        let _ = service.login("user@example.com", "wrong").await;
        let err = service
            .login("user@example.com", "correct-horse")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::EmailNotConfirmed)));
        assert!(service.throttle().record("user@example.com").is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_counts_as_failed_attempt() {
        let mut verifier = MockVerifier::new("correct-horse");
        verifier.provider_down = true;
        let (service, _, _) = service(verifier);

        let err = service
            .login("user@example.com", "correct-horse")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::Provider(_))));
        assert_eq!(
            service.throttle().record("user@example.com").unwrap().failure_count,
            1
        );
    }

    #[tokio::test]
    async fn test_invalid_input_skips_verifier_and_throttle() {
        let (service, verifier, _) = service(MockVerifier::new("correct-horse"));

        let err = service.login("not-an-email", "whatever").await.unwrap_err();
        assert!(err.is_validation_error());

        let err = service.login("user@example.com", "").await.unwrap_err();
        assert!(err.is_validation_error());

        assert_eq!(verifier.call_count(), 0);
        assert!(service.throttle().is_empty());
    }

    #[tokio::test]
    async fn test_refresh() {
        let (service, _, _) = service(MockVerifier::new("correct-horse"));

        assert!(service.refresh("refresh").await.is_ok());

        let err = service.refresh("stale").await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::InvalidRefreshToken)));

        let err = service.refresh("  ").await.unwrap_err();
        assert!(err.is_validation_error());
    }

    #[tokio::test]
    async fn test_register_saves_username() {
        let (service, _, _, profiles) = service_with_profiles(MockVerifier::new("correct-horse"));

        let sign_up = service
            .register(" vinyl_fan ", " new@example.com ", "secret-pw")
            .await
            .unwrap();
        assert_eq!(sign_up.user.email, "new@example.com");
        assert!(sign_up.session.is_none());
        assert_eq!(profiles.username("user-1").as_deref(), Some("vinyl_fan"));
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let (service, _, _, profiles) = service_with_profiles(MockVerifier::new("correct-horse"));

        let err = service
            .register("vinyl_fan", "taken@example.com", "secret-pw")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::SignUpRejected(_))));

        let err = service
            .register("dj", "new@example.com", "secret-pw")
            .await
            .unwrap_err();
        assert!(err.is_validation_error());

        let err = service
            .register("vinyl_fan", "new@example.com", "short")
            .await
            .unwrap_err();
        assert!(err.is_validation_error());

        assert_eq!(profiles.username("user-1"), None);
    }

    #[tokio::test]
    async fn test_register_is_not_throttled() {
        let (service, _, _) = service(MockVerifier::new("correct-horse"));
        for _ in 0..5 {
            let _ = service.login("new@example.com", "wrong").await;
        }
        assert!(service.register("vinyl_fan", "new@example.com", "secret-pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_token() {
        let (service, _, _) = service(MockVerifier::new("correct-horse"));

        let user = service.validate_token("access").await.unwrap();
        assert_eq!(user.id, "user-1");

        let err = service.validate_token("forged").await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::InvalidToken)));

        let err = service.validate_token(" ").await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_validate_token_provider_failure() {
        let mut verifier = MockVerifier::new("correct-horse");
        verifier.provider_down = true;
        let (service, _, _) = service(verifier);

        let err = service.validate_token("access").await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::Provider(_))));
    }

    #[tokio::test]
    async fn test_resend_confirmation_swallows_provider_errors() {
        let mut verifier = MockVerifier::new("correct-horse");
        verifier.provider_down = true;
        let (service, verifier, _) = service(verifier);

        service.resend_confirmation(" new@example.com ").await.unwrap();
        assert_eq!(*verifier.resent.lock().unwrap(), vec!["new@example.com".to_string()]);

        let err = service.resend_confirmation("not-an-email").await.unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(verifier.resent.lock().unwrap().len(), 1);
    }
}
