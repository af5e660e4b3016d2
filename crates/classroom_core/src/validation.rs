//! Credential checks performed before any network call.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmptyEmail,
    #[error("Password is required")]
    EmptyPassword,
    #[error("Email address is malformed")]
    MalformedEmail,
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

/// Accepts `local@domain.tld` shaped addresses only.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_some_and(|pattern| pattern.is_match(email))
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    if !is_valid_email(email) {
        return Err(ValidationError::MalformedEmail);
    }
    Ok(())
}
