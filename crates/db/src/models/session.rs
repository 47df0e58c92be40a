//! User session model and DTOs.

use latchkey_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A session row from the `user_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// DTO for creating a new user session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: DbId,
    pub user_agent: Option<String>,
    pub expires_at: Timestamp,
}

/// A session as listed to its owner, flagged when it is the one making the
/// request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: DbId,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub current_session: bool,
}

impl SessionResponse {
    pub fn from_session(session: UserSession, current_session_id: DbId) -> Self {
        Self {
            current_session: session.id == current_session_id,
            id: session.id,
            user_agent: session.user_agent,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}
