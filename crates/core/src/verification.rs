//! One-time verification code types.
//!
//! A code is single-use and typed: a code issued for email verification can
//! never be redeemed as a password-reset code and vice versa.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Email verification links stay valid for a year.
pub const EMAIL_VERIFICATION_LIFETIME_DAYS: i64 = 365;

/// Password reset links are short-lived.
pub const PASSWORD_RESET_LIFETIME_HOURS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationCodeType {
    EmailVerification,
    PasswordReset,
}

impl VerificationCodeType {
    /// Storage representation, matching the `code_type` check constraint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }

    /// How long a code of this type remains redeemable.
    pub fn lifetime(&self) -> Duration {
        match self {
            Self::EmailVerification => Duration::days(EMAIL_VERIFICATION_LIFETIME_DAYS),
            Self::PasswordReset => Duration::hours(PASSWORD_RESET_LIFETIME_HOURS),
        }
    }

    /// Expiry for a code of this type issued at `now`.
    pub fn expiry_from(&self, now: Timestamp) -> Timestamp {
        now + self.lifetime()
    }
}

impl fmt::Display for VerificationCodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationCodeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(Self::EmailVerification),
            "password_reset" => Ok(Self::PasswordReset),
            other => Err(CoreError::Internal(format!(
                "Unknown verification code type '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for VerificationCodeType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
