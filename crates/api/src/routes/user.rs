use axum::routing::get;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/user`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(user::get_user))
}
