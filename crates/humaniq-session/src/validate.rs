//! Client-side input validation for the sign-in and registration forms.
//!
//! These checks run before any request leaves the client. They mirror
//! the rules the API enforces, so a rejected form never costs a round
//! trip.

use std::sync::LazyLock;

use humaniq_protocol::{LoginRequest, RegisterRequest};
use regex::Regex;

/// Minimum characters in a display name.
pub const MIN_NAME_LEN: usize = 3;
/// Minimum characters in a new account's secret.
pub const MIN_SECRET_LEN: usize = 6;

/// "something@something.something" with no whitespace anywhere.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid")
});

/// A form field that failed validation. The message is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name is required.")]
    NameRequired,
    #[error("Name must have at least 3 characters.")]
    NameTooShort,
    #[error("Email is required.")]
    EmailRequired,
    #[error("Email is invalid.")]
    EmailInvalid,
    #[error("Password is required.")]
    SecretRequired,
    #[error("Password must have at least 6 characters.")]
    SecretTooShort,
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL.is_match(email) {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}

/// Checks a sign-in form. Only presence and shape, no length rule: an
/// existing account may predate the current secret policy.
pub fn validate_login(request: &LoginRequest) -> Result<(), ValidationError> {
    check_email(&request.email)?;
    if request.secret.is_empty() {
        return Err(ValidationError::SecretRequired);
    }
    Ok(())
}

/// Checks a registration form. Fields are checked in form order (name,
/// email, secret) and the first failure is returned.
pub fn validate_registration(
    request: &RegisterRequest,
) -> Result<(), ValidationError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort);
    }
    check_email(&request.email)?;
    if request.secret.is_empty() {
        return Err(ValidationError::SecretRequired);
    }
    if request.secret.chars().count() < MIN_SECRET_LEN {
        return Err(ValidationError::SecretTooShort);
    }
    Ok(())
}
