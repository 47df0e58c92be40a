//! In-memory [`AuthStore`] for tests and local experiments.
//!
//! Mirrors the Postgres semantics that matter to the flows: emails are
//! unique case-insensitively, sessions list newest first, and codes are
//! matched on both id and type.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use latchkey_core::types::{DbId, Timestamp};
use latchkey_core::verification::VerificationCodeType;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{CreateUser, User};
use crate::models::verification_code::{CreateVerificationCode, VerificationCode};

use super::{
    AuthStore, SessionStore, StoreError, StoreResult, UserStore, VerificationCodeStore,
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<DbId, User>>,
    // Insertion order is kept so equal `created_at` values still list newest first.
    sessions: RwLock<Vec<UserSession>>,
    codes: RwLock<HashMap<DbId, VerificationCode>>,
    unhealthy: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make [`AuthStore::health_check`] report the given state.
    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    /// Number of stored sessions, expired ones included.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of stored codes, expired ones included.
    pub async fn code_count(&self) -> usize {
        self.codes.read().await.len()
    }

    /// Overwrite a code's expiry, for exercising expiry paths.
    pub async fn set_code_expiry(&self, id: DbId, expires_at: Timestamp) -> bool {
        match self.codes.write().await.get_mut(&id) {
            Some(code) => {
                code.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    /// All codes of one type issued to a user.
    pub async fn codes_for_user(
        &self,
        user_id: DbId,
        code_type: VerificationCodeType,
    ) -> Vec<VerificationCode> {
        self.codes
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id && c.code_type == code_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: CreateUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let lowered = input.email.to_lowercase();
        if users.values().any(|u| u.email.to_lowercase() == lowered) {
            return Err(StoreError::Duplicate("uq_users_email".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            password_hash: input.password_hash,
            verified: false,
            user_agent: input.user_agent,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let lowered = email.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.to_lowercase() == lowered)
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.find_user_by_email(email).await?.is_some())
    }

    async fn mark_verified(&self, id: DbId) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.verified = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_password_hash(&self, id: DbId, password_hash: &str) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, input: CreateSession) -> StoreResult<UserSession> {
        let session = UserSession {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            user_agent: input.user_agent,
            created_at: Utc::now(),
            expires_at: input.expires_at,
        };
        self.sessions.write().await.push(session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: DbId) -> StoreResult<Option<UserSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn list_live_sessions(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> StoreResult<Vec<UserSession>> {
        let mut live: Vec<UserSession> = self
            .sessions
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id && s.expires_at > now)
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(live)
    }

    async fn update_session_expiry(&self, id: DbId, expires_at: Timestamp) -> StoreResult<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.expires_at = expires_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_session(&self, id: DbId) -> StoreResult<bool> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        Ok(sessions.len() < before)
    }

    async fn delete_user_session(&self, id: DbId, user_id: DbId) -> StoreResult<bool> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| !(s.id == id && s.user_id == user_id));
        Ok(sessions.len() < before)
    }

    async fn delete_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired_sessions(&self, now: Timestamp) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl VerificationCodeStore for MemoryStore {
    async fn create_code(&self, input: CreateVerificationCode) -> StoreResult<VerificationCode> {
        let code = VerificationCode {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            code_type: input.code_type,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        self.codes.write().await.insert(code.id, code.clone());
        Ok(code)
    }

    async fn find_code(
        &self,
        id: DbId,
        code_type: VerificationCodeType,
    ) -> StoreResult<Option<VerificationCode>> {
        Ok(self
            .codes
            .read()
            .await
            .get(&id)
            .filter(|c| c.code_type == code_type)
            .cloned())
    }

    async fn delete_code(&self, id: DbId) -> StoreResult<bool> {
        Ok(self.codes.write().await.remove(&id).is_some())
    }

    async fn delete_codes_for_user(
        &self,
        user_id: DbId,
        code_type: VerificationCodeType,
    ) -> StoreResult<u64> {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, c| !(c.user_id == user_id && c.code_type == code_type));
        Ok((before - codes.len()) as u64)
    }

    async fn delete_expired_codes(&self, now: Timestamp) -> StoreResult<u64> {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, c| c.expires_at > now);
        Ok((before - codes.len()) as u64)
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn health_check(&self) -> bool {
        !self.unhealthy.load(Ordering::SeqCst)
    }
}
