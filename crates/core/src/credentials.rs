//! Email normalization and the password policy.
//!
//! The policy favours length over composition rules: 12 to 64 characters,
//! and not a single character repeated throughout.

use std::borrow::Cow;

use validator::ValidationError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum accepted password length, in characters.
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Canonical form of an email address: trimmed and lowercased.
///
/// Emails are unique case-insensitively, so every lookup and insert goes
/// through this first.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Check a new password against the policy.
///
/// Used as a `validator` custom rule on every field that sets a password.
/// Login deliberately skips it so older passwords keep working if the
/// policy tightens.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(policy_error(
            "password_too_short",
            "Password must be at least 12 characters long",
        ));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(policy_error(
            "password_too_long",
            "Password must not exceed 64 characters",
        ));
    }

    let mut chars = password.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return Err(policy_error(
                "password_too_simple",
                "Password is too simple (avoid repeating characters)",
            ));
        }
    }

    Ok(())
}

fn policy_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}
