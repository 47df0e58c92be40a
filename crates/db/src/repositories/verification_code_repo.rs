//! Repository for the `verification_codes` table.

use latchkey_core::types::{DbId, Timestamp};
use latchkey_core::verification::VerificationCodeType;
use sqlx::PgPool;

use crate::models::verification_code::{CreateVerificationCode, VerificationCode};

const COLUMNS: &str = "id, user_id, code_type, expires_at, created_at";

pub struct VerificationCodeRepo;

impl VerificationCodeRepo {
    /// Issue a new code, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateVerificationCode,
    ) -> Result<VerificationCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO verification_codes (user_id, code_type, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VerificationCode>(&query)
            .bind(input.user_id)
            .bind(input.code_type.as_str())
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a code by id, but only if it was issued for `code_type`.
    ///
    /// Expired codes are still returned so the caller can clean them up.
    pub async fn find(
        pool: &PgPool,
        id: DbId,
        code_type: VerificationCodeType,
    ) -> Result<Option<VerificationCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM verification_codes WHERE id = $1 AND code_type = $2");
        sqlx::query_as::<_, VerificationCode>(&query)
            .bind(id)
            .bind(code_type.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Delete a code. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every code of one type issued to a user.
    pub async fn delete_for_user(
        pool: &PgPool,
        user_id: DbId,
        code_type: VerificationCodeType,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM verification_codes WHERE user_id = $1 AND code_type = $2")
                .bind(user_id)
                .bind(code_type.as_str())
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Delete codes whose expiry is at or before `now`.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
