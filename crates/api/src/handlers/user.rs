use axum::extract::State;
use axum::Json;
use latchkey_db::models::user::UserResponse;

use crate::error::AppResult;
use crate::middleware::auth::AuthContext;
use crate::services::session_lifecycle;
use crate::state::AppState;

/// GET /user
pub async fn get_user(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> AppResult<Json<UserResponse>> {
    let user = session_lifecycle::get_user(&state, ctx).await?;
    Ok(Json(user))
}
