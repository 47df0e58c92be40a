use std::sync::Arc;

use latchkey_db::store::SharedStore;
use latchkey_mail::Mailer;

use crate::auth::jwt::TokenCodec;
use crate::config::ServerConfig;
use crate::middleware::rate_limit::FixedWindowLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Users, sessions, and verification codes.
    pub store: SharedStore,
    pub config: Arc<ServerConfig>,
    /// Token codec built from `config.jwt`.
    pub tokens: Arc<TokenCodec>,
    pub mailer: Arc<dyn Mailer>,
    /// Guards `POST /auth/password/forgot`.
    pub password_reset_limiter: Arc<FixedWindowLimiter>,
}

impl AppState {
    pub fn new(store: SharedStore, mailer: Arc<dyn Mailer>, config: ServerConfig) -> Self {
        let tokens = Arc::new(TokenCodec::new(&config.jwt));
        Self {
            store,
            config: Arc::new(config),
            tokens,
            mailer,
            password_reset_limiter: Arc::new(FixedWindowLimiter::password_reset()),
        }
    }
}
