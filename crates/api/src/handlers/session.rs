//! Handlers for the `/sessions` resource. All routes require authentication.

use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use latchkey_core::error::CoreError;
use latchkey_db::models::session::SessionResponse;
use uuid::Uuid;

use crate::auth::cookies::clear_auth_cookies;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthContext;
use crate::response::MessageResponse;
use crate::services::session_lifecycle::{self, RevokedSession};
use crate::state::AppState;

/// GET /sessions
///
/// Every live session of the caller, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> AppResult<Json<Vec<SessionResponse>>> {
    let sessions = session_lifecycle::list_sessions(&state, ctx).await?;
    Ok(Json(sessions))
}

/// DELETE /sessions/{id}
///
/// Revoking the current session also clears the caller's cookies.
pub async fn delete_session(
    State(state): State<AppState>,
    ctx: AuthContext,
    jar: CookieJar,
    Path(id): Path<String>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let session_id = Uuid::parse_str(id.trim())
        .map_err(|_| AppError::Core(CoreError::Validation("Invalid session id".into())))?;

    match session_lifecycle::revoke_session(&state, ctx, session_id).await? {
        RevokedSession::Current => Ok((
            clear_auth_cookies(jar, &state),
            Json(MessageResponse::new(
                "Current session ended and cookies cleared.",
            )),
        )),
        RevokedSession::OtherDevice => Ok((
            jar,
            Json(MessageResponse::new("Device logged out successfully.")),
        )),
    }
}
