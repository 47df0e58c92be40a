//! Verification code model and DTOs.

use latchkey_core::types::{DbId, Timestamp};
use latchkey_core::verification::VerificationCodeType;
use sqlx::FromRow;

/// A one-time code row from the `verification_codes` table.
///
/// The `id` is the opaque code mailed to the user.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: DbId,
    pub user_id: DbId,
    #[sqlx(try_from = "String")]
    pub code_type: VerificationCodeType,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

impl VerificationCode {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

/// DTO for issuing a new code.
#[derive(Debug, Clone)]
pub struct CreateVerificationCode {
    pub user_id: DbId,
    pub code_type: VerificationCodeType,
    pub expires_at: Timestamp,
}
