//! [`AuthStore`] backed by Postgres through the SQL repositories.

use async_trait::async_trait;
use latchkey_core::types::{DbId, Timestamp};
use latchkey_core::verification::VerificationCodeType;

use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{CreateUser, User};
use crate::models::verification_code::{CreateVerificationCode, VerificationCode};
use crate::repositories::{SessionRepo, UserRepo, VerificationCodeRepo};
use crate::DbPool;

use super::{AuthStore, SessionStore, StoreResult, UserStore, VerificationCodeStore};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, input: CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, &input).await?)
    }

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(UserRepo::email_exists(&self.pool, email).await?)
    }

    async fn mark_verified(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::mark_verified(&self.pool, id).await?)
    }

    async fn update_password_hash(&self, id: DbId, password_hash: &str) -> StoreResult<bool> {
        Ok(UserRepo::update_password(&self.pool, id, password_hash).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, input: CreateSession) -> StoreResult<UserSession> {
        Ok(SessionRepo::create(&self.pool, &input).await?)
    }

    async fn find_session(&self, id: DbId) -> StoreResult<Option<UserSession>> {
        Ok(SessionRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_live_sessions(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> StoreResult<Vec<UserSession>> {
        Ok(SessionRepo::list_live_for_user(&self.pool, user_id, now).await?)
    }

    async fn update_session_expiry(&self, id: DbId, expires_at: Timestamp) -> StoreResult<bool> {
        Ok(SessionRepo::update_expiry(&self.pool, id, expires_at).await?)
    }

    async fn delete_session(&self, id: DbId) -> StoreResult<bool> {
        Ok(SessionRepo::delete(&self.pool, id).await?)
    }

    async fn delete_user_session(&self, id: DbId, user_id: DbId) -> StoreResult<bool> {
        Ok(SessionRepo::delete_for_user(&self.pool, id, user_id).await?)
    }

    async fn delete_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(SessionRepo::delete_all_for_user(&self.pool, user_id).await?)
    }

    async fn delete_expired_sessions(&self, now: Timestamp) -> StoreResult<u64> {
        Ok(SessionRepo::delete_expired(&self.pool, now).await?)
    }
}

#[async_trait]
impl VerificationCodeStore for PgStore {
    async fn create_code(&self, input: CreateVerificationCode) -> StoreResult<VerificationCode> {
        Ok(VerificationCodeRepo::create(&self.pool, &input).await?)
    }

    async fn find_code(
        &self,
        id: DbId,
        code_type: VerificationCodeType,
    ) -> StoreResult<Option<VerificationCode>> {
        Ok(VerificationCodeRepo::find(&self.pool, id, code_type).await?)
    }

    async fn delete_code(&self, id: DbId) -> StoreResult<bool> {
        Ok(VerificationCodeRepo::delete(&self.pool, id).await?)
    }

    async fn delete_codes_for_user(
        &self,
        user_id: DbId,
        code_type: VerificationCodeType,
    ) -> StoreResult<u64> {
        Ok(VerificationCodeRepo::delete_for_user(&self.pool, user_id, code_type).await?)
    }

    async fn delete_expired_codes(&self, now: Timestamp) -> StoreResult<u64> {
        Ok(VerificationCodeRepo::delete_expired(&self.pool, now).await?)
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn health_check(&self) -> bool {
        match crate::health_check(&self.pool).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}
