use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Input validation shared by the authentication flow and membership service.
///
/// Lazy-loaded email validation regex, a practical subset of RFC 5322.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Validates an email address
///
/// # Examples
///
/// ```rust
/// use turntable_core::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Normalizes an email into the key used for login throttling.
///
/// Surrounding whitespace is dropped and the address is lowercased, so
/// `" A@X.com"` and `"a@x.com"` share one attempt counter.
///
/// ```rust
/// use turntable_core::validation::normalize_identity;
///
/// assert_eq!(normalize_identity("  A@X.com "), "a@x.com");
/// ```
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// Rejects a missing password. Strength rules belong to the auth provider.
pub fn validate_password_present(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    Ok(())
}

/// Validates an id stored in a membership list or used as an owner key
///
/// # Requirements
///
/// - Cannot be empty
/// - Maximum 128 characters
/// - ASCII alphanumeric plus `-`, `_` and `:` (catalog URIs such as
///   `spotify:artist:...` are accepted)
pub fn validate_member_id(field: &str, id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::MissingField(format!("{field} is required")));
    }

    if id.len() > 128 {
        return Err(ValidationError::InvalidField(format!(
            "{field} must be no more than 128 characters long"
        )));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
    {
        return Err(ValidationError::InvalidField(format!(
            "{field} must contain only letters, numbers, hyphens, underscores and colons"
        )));
    }

    Ok(())
}

/// Validates a password chosen at registration
///
/// # Password Requirements
///
/// - At least 6 characters, not only whitespace
/// - Maximum 128 characters
pub fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    validate_password_present(password)?;

    if password.trim().is_empty() {
        return Err(ValidationError::InvalidField(
            "Password cannot be only whitespace".to_string(),
        ));
    }

    if password.len() < 6 {
        return Err(ValidationError::InvalidField(
            "Password must be at least 6 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(ValidationError::InvalidField(
            "Password must be no more than 128 characters long".to_string(),
        ));
    }

    Ok(())
}

/// Validates a public username
///
/// # Username Requirements
///
/// - Between 6 and 32 characters
/// - ASCII alphanumeric plus `.`, `-` and `_`
///
/// ```rust
/// use turntable_core::validation::validate_username;
///
/// assert!(validate_username("vinyl_fan").is_ok());
/// assert!(validate_username("dj").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::MissingField(
            "Username is required".to_string(),
        ));
    }

    if username.len() < 6 || username.len() > 32 {
        return Err(ValidationError::InvalidField(
            "Username must be between 6 and 32 characters long".to_string(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidField(
            "Username must contain only letters, numbers, dots, hyphens and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("test.email+tag@domain.co.uk").is_ok());
        assert!(validate_email("user123@test-domain.com").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("@domain.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());

        let long_email = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long_email).is_err());
    }

    #[test]
    fn test_normalize_identity() {
        assert_eq!(normalize_identity("a@x.com"), "a@x.com");
        assert_eq!(normalize_identity("A@X.COM"), "a@x.com");
        assert_eq!(normalize_identity("\tUser@Example.com  "), "user@example.com");
    }

    #[test]
    fn test_validate_password_present() {
        assert!(validate_password_present("hunter22").is_ok());
        assert!(matches!(
            validate_password_present(""),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_validate_member_id() {
        assert!(validate_member_id("artistId", "4Z8W4fKeB5YxbusRsdQVPb").is_ok());
        assert!(validate_member_id("artistId", "spotify:artist:4Z8W4fKeB5YxbusRsdQVPb").is_ok());
        assert!(validate_member_id("userId", "0b8e7c1e-5c7a-4a57-9a43-6f1b1c2d3e4f").is_ok());

        assert!(matches!(
            validate_member_id("artistId", ""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(validate_member_id("artistId", "has space").is_err());
        assert!(validate_member_id("artistId", "../etc").is_err());
        assert!(validate_member_id("artistId", &"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("secret").is_ok());
        assert!(matches!(
            validate_new_password(""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(validate_new_password("short").is_err());
        assert!(validate_new_password("      ").is_err());
        assert!(validate_new_password(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("vinyl_fan").is_ok());
        assert!(validate_username("crate.digger-77").is_ok());

        assert!(matches!(
            validate_username(""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(validate_username("short").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("has space").is_err());
    }
}
