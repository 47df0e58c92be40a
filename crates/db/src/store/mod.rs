//! Storage traits the authentication flows are written against.
//!
//! Handlers never see a `PgPool` directly; they hold a [`SharedStore`] so the
//! same flows run against Postgres in production and against the in-memory
//! store in tests.

use std::sync::Arc;

use async_trait::async_trait;
use latchkey_core::types::{DbId, Timestamp};
use latchkey_core::verification::VerificationCodeType;

use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{CreateUser, User};
use crate::models::verification_code::{CreateVerificationCode, VerificationCode};

pub mod postgres;

#[cfg(feature = "memory")]
pub mod memory;

pub use postgres::PgStore;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

/// Errors surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Duplicate value violates {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::Duplicate(constraint);
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, input: CreateUser) -> StoreResult<User>;
    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>>;
    /// Case-insensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;
    async fn mark_verified(&self, id: DbId) -> StoreResult<Option<User>>;
    async fn update_password_hash(&self, id: DbId, password_hash: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, input: CreateSession) -> StoreResult<UserSession>;
    /// Returns the session regardless of expiry.
    async fn find_session(&self, id: DbId) -> StoreResult<Option<UserSession>>;
    /// Sessions of `user_id` live at `now`, newest first.
    async fn list_live_sessions(&self, user_id: DbId, now: Timestamp)
        -> StoreResult<Vec<UserSession>>;
    async fn update_session_expiry(&self, id: DbId, expires_at: Timestamp) -> StoreResult<bool>;
    async fn delete_session(&self, id: DbId) -> StoreResult<bool>;
    /// Deletes only when the session belongs to `user_id`.
    async fn delete_user_session(&self, id: DbId, user_id: DbId) -> StoreResult<bool>;
    async fn delete_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64>;
    async fn delete_expired_sessions(&self, now: Timestamp) -> StoreResult<u64>;
}

#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    async fn create_code(&self, input: CreateVerificationCode) -> StoreResult<VerificationCode>;
    /// Finds a code only if it was issued for `code_type`. Expired codes are
    /// still returned.
    async fn find_code(
        &self,
        id: DbId,
        code_type: VerificationCodeType,
    ) -> StoreResult<Option<VerificationCode>>;
    async fn delete_code(&self, id: DbId) -> StoreResult<bool>;
    async fn delete_codes_for_user(
        &self,
        user_id: DbId,
        code_type: VerificationCodeType,
    ) -> StoreResult<u64>;
    async fn delete_expired_codes(&self, now: Timestamp) -> StoreResult<u64>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait AuthStore: UserStore + SessionStore + VerificationCodeStore {
    /// Whether the backing store is reachable.
    async fn health_check(&self) -> bool;
}

pub type SharedStore = Arc<dyn AuthStore>;
