//! Route definitions for the `/auth` resource.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::middleware::rate_limit::limit_password_reset;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register             -> register
/// POST /login                -> login
/// GET  /logout               -> logout
/// GET  /refresh              -> refresh
/// GET  /email/verify/{code}  -> verify_email
/// POST /password/forgot      -> forgot_password (rate limited)
/// POST /password/reset       -> reset_password
/// ```
pub fn router(state: &AppState) -> Router<AppState> {
    let forgot = Router::new()
        .route("/password/forgot", post(auth::forgot_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            limit_password_reset,
        ));

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/refresh", get(auth::refresh))
        .route("/email/verify/{code}", get(auth::verify_email))
        .route("/password/reset", post(auth::reset_password))
        .merge(forgot)
}
