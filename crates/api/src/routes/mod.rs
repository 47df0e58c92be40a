pub mod auth;
pub mod health;
pub mod session;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                 register (public)
/// /auth/login                    login (public)
/// /auth/logout                   logout (public, reads the access cookie)
/// /auth/refresh                  refresh (public, reads the refresh cookie)
/// /auth/email/verify/{code}      verify email (public)
/// /auth/password/forgot          send reset link (public, rate limited)
/// /auth/password/reset           reset password (public)
///
/// /sessions                      list (requires auth)
/// /sessions/{id}                 revoke (requires auth)
///
/// /user                          current user (requires auth)
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(state))
        .nest("/sessions", session::router())
        .nest("/user", user::router())
}
