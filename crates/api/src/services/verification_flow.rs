//! Issue and redeem one-time codes: email verification and password reset.

use chrono::Utc;
use latchkey_core::types::DbId;
use latchkey_core::verification::VerificationCodeType;
use latchkey_db::models::verification_code::CreateVerificationCode;
use latchkey_mail::templates;

use crate::auth::password;
use crate::error::{AppError, AppResult};
use crate::services::send_best_effort;
use crate::state::AppState;

pub const INVALID_VERIFICATION_LINK: &str = "Invalid or expired verification link.";
const INVALID_RESET_CODE: &str = "Invalid or expired verification code";
const USER_NOT_FOUND: &str = "User not found";

/// Mail a password reset link if `email` belongs to an account.
///
/// Succeeds either way so the response never reveals whether the address is
/// registered. Older reset codes for the user are purged first.
pub async fn send_password_reset(state: &AppState, email: &str) -> AppResult<()> {
    let Some(user) = state.store.find_user_by_email(email).await? else {
        tracing::debug!("Password reset requested for unknown email");
        return Ok(());
    };

    let code_type = VerificationCodeType::PasswordReset;
    let purged = state
        .store
        .delete_codes_for_user(user.id, code_type)
        .await?;

    let code = state
        .store
        .create_code(CreateVerificationCode {
            user_id: user.id,
            code_type,
            expires_at: code_type.expiry_from(Utc::now()),
        })
        .await?;

    let url = state.config.password_reset_url(code.id);
    send_best_effort(state, &user.email, templates::password_reset(&url), "password_reset").await;

    tracing::info!(user_id = %user.id, purged, "Password reset code issued");
    Ok(())
}

/// Redeem a reset code: store the new password and end every session of the
/// user.
///
/// A missing, mistyped, or expired code is rejected with the same error.
pub async fn reset_password(state: &AppState, code: DbId, new_password: String) -> AppResult<()> {
    let now = Utc::now();
    let code = state
        .store
        .find_code(code, VerificationCodeType::PasswordReset)
        .await?
        .filter(|c| !c.is_expired(now))
        .ok_or_else(|| AppError::unauthorized(INVALID_RESET_CODE))?;

    let user = state
        .store
        .find_user(code.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

    let password_hash = password::hash_password_blocking(new_password).await?;
    state
        .store
        .update_password_hash(user.id, &password_hash)
        .await?;

    let ended = state.store.delete_sessions_for_user(user.id).await?;
    state.store.delete_code(code.id).await?;

    tracing::info!(user_id = %user.id, sessions_ended = ended, "Password reset");
    Ok(())
}

/// Redeem an email verification code.
///
/// Codes found expired are deleted on the spot.
pub async fn verify_email(state: &AppState, code: DbId) -> AppResult<()> {
    let code = state
        .store
        .find_code(code, VerificationCodeType::EmailVerification)
        .await?
        .ok_or_else(|| AppError::not_found(INVALID_VERIFICATION_LINK))?;

    if code.is_expired(Utc::now()) {
        state.store.delete_code(code.id).await?;
        return Err(AppError::unauthorized(INVALID_VERIFICATION_LINK));
    }

    let user = state
        .store
        .mark_verified(code.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

    state.store.delete_code(code.id).await?;

    tracing::info!(user_id = %user.id, "Email verified");
    Ok(())
}
