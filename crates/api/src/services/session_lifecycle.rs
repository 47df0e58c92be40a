//! Register, login, logout, refresh with sliding renewal, and the caller's
//! view of their own sessions.

use chrono::Utc;
use latchkey_core::error::CoreError;
use latchkey_core::session::{is_live, renewed_expiry, session_expiry_from};
use latchkey_core::types::DbId;
use latchkey_core::verification::VerificationCodeType;
use latchkey_db::models::session::{CreateSession, SessionResponse};
use latchkey_db::models::user::{CreateUser, UserResponse};
use latchkey_db::models::verification_code::CreateVerificationCode;
use latchkey_db::store::StoreError;
use latchkey_mail::templates;

use crate::auth::jwt::TokenPair;
use crate::auth::password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthContext;
use crate::services::send_best_effort;
use crate::state::AppState;

const EMAIL_TAKEN: &str = "Email is already registered.";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const MISSING_REFRESH_TOKEN: &str = "Missing refresh token";
const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";
const SESSION_GONE: &str = "Session expired or not found";
const SESSION_NOT_FOUND: &str = "Session not found";
const USER_NOT_FOUND: &str = "User not found";

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Registration input. `email` must already be normalized and the password
/// already checked against the policy.
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub user_agent: Option<String>,
}

#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub user_agent: Option<String>,
}

/// What revoking a session did, so the handler knows whether to clear cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokedSession {
    Current,
    OtherDevice,
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Create an account, mail its verification link, and open a first session.
pub async fn register(state: &AppState, input: RegisterInput) -> AppResult<(UserResponse, TokenPair)> {
    if state.store.email_exists(&input.email).await? {
        return Err(CoreError::Conflict(EMAIL_TAKEN.into()).into());
    }

    let password_hash = password::hash_password_blocking(input.password).await?;

    let user = state
        .store
        .create_user(CreateUser {
            email: input.email,
            password_hash,
            user_agent: input.user_agent.clone(),
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration.
            StoreError::Duplicate(_) => AppError::Core(CoreError::Conflict(EMAIL_TAKEN.into())),
            other => AppError::Store(other),
        })?;

    let now = Utc::now();
    let code_type = VerificationCodeType::EmailVerification;
    let code = state
        .store
        .create_code(CreateVerificationCode {
            user_id: user.id,
            code_type,
            expires_at: code_type.expiry_from(now),
        })
        .await?;

    let url = state.config.email_verification_url(code.id);
    send_best_effort(state, &user.email, templates::verify_email(&url), "email_verification").await;

    let tokens = open_session(state, user.id, input.user_agent).await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((UserResponse::from(user), tokens))
}

/// Check credentials and open a new session. Existing sessions are untouched.
pub async fn login(state: &AppState, input: LoginInput) -> AppResult<TokenPair> {
    let Some(user) = state.store.find_user_by_email(&input.email).await? else {
        password::verify_against_dummy_blocking(input.password).await;
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    let valid = password::verify_password_blocking(input.password, user.password_hash).await?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let tokens = open_session(state, user.id, input.user_agent).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(tokens)
}

/// End the session named by `access_token`, if it verifies. Never fails.
///
/// An invalid or expired token deletes nothing; the expiry sweep reclaims
/// its session eventually.
pub async fn logout(state: &AppState, access_token: Option<&str>) {
    let Some(claims) = access_token.and_then(|t| state.tokens.verify_access(t)) else {
        return;
    };

    match state.store.delete_session(claims.session_id).await {
        Ok(_) => tracing::info!(session_id = %claims.session_id, "Session ended by logout"),
        Err(e) => {
            tracing::warn!(session_id = %claims.session_id, error = %e, "Failed to delete session on logout")
        }
    }
}

/// Exchange a refresh token for a new pair, sliding the session forward when
/// it has less than a day left.
///
/// Both tokens are re-signed on every call so the refresh cookie's own expiry
/// keeps pace with the session's.
pub async fn refresh(state: &AppState, refresh_token: Option<&str>) -> AppResult<TokenPair> {
    let token = refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized(MISSING_REFRESH_TOKEN))?;

    let claims = state
        .tokens
        .verify_refresh(token)
        .ok_or_else(|| AppError::unauthorized(INVALID_REFRESH_TOKEN))?;

    let now = Utc::now();
    let session = state
        .store
        .find_session(claims.session_id)
        .await?
        .filter(|s| is_live(s.expires_at, now))
        .ok_or_else(|| AppError::unauthorized(SESSION_GONE))?;

    if let Some(expires_at) = renewed_expiry(session.expires_at, now) {
        state
            .store
            .update_session_expiry(session.id, expires_at)
            .await?;
        tracing::debug!(session_id = %session.id, %expires_at, "Session renewed");
    }

    Ok(state.tokens.issue_pair(session.user_id, session.id)?)
}

/// The caller's live sessions, newest first, with the current one flagged.
pub async fn list_sessions(state: &AppState, ctx: AuthContext) -> AppResult<Vec<SessionResponse>> {
    let sessions = state
        .store
        .list_live_sessions(ctx.user_id, Utc::now())
        .await?;

    Ok(sessions
        .into_iter()
        .map(|s| SessionResponse::from_session(s, ctx.session_id))
        .collect())
}

/// Delete one of the caller's sessions. Sessions of other users are
/// indistinguishable from missing ones.
pub async fn revoke_session(
    state: &AppState,
    ctx: AuthContext,
    session_id: DbId,
) -> AppResult<RevokedSession> {
    let deleted = state
        .store
        .delete_user_session(session_id, ctx.user_id)
        .await?;
    if !deleted {
        return Err(AppError::not_found(SESSION_NOT_FOUND));
    }

    tracing::info!(user_id = %ctx.user_id, %session_id, "Session revoked");
    Ok(if session_id == ctx.session_id {
        RevokedSession::Current
    } else {
        RevokedSession::OtherDevice
    })
}

/// The caller's profile.
pub async fn get_user(state: &AppState, ctx: AuthContext) -> AppResult<UserResponse> {
    state
        .store
        .find_user(ctx.user_id)
        .await?
        .map(UserResponse::from)
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Persist a new session for `user_id` and sign a token pair bound to it.
async fn open_session(
    state: &AppState,
    user_id: DbId,
    user_agent: Option<String>,
) -> AppResult<TokenPair> {
    let session = state
        .store
        .create_session(CreateSession {
            user_id,
            user_agent,
            expires_at: session_expiry_from(Utc::now()),
        })
        .await?;

    Ok(state.tokens.issue_pair(user_id, session.id)?)
}
