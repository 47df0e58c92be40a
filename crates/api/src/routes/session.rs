use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// GET    /       -> list_sessions
/// DELETE /{id}   -> delete_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(session::list_sessions))
        .route("/{id}", delete(session::delete_session))
}
