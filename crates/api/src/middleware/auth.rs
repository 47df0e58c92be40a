//! Cookie-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use latchkey_core::types::DbId;

use crate::auth::cookies::ACCESS_TOKEN_COOKIE;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, taken from the `accessToken` cookie.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(ctx: AuthContext) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %ctx.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// Only the token is checked; the session row is not re-read, so a revoked
/// session keeps working until its access token expires.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: DbId,
    /// The session the access token was issued for.
    pub session_id: DbId,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::InvalidAccessToken("Not authorized"))?;

        let claims = state
            .tokens
            .verify_access(token)
            .ok_or(AppError::InvalidAccessToken("Invalid or expired token"))?;

        Ok(AuthContext {
            user_id: claims.user_id,
            session_id: claims.session_id,
        })
    }
}
