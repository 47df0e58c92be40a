//! Access/refresh token signing and verification.
//!
//! Both tokens are HS256-signed JWTs with their own secret and lifetime. The
//! access token names the user and the session; the refresh token names only
//! the session, so every refresh re-reads the session before issuing anything.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use latchkey_core::types::{DbId, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Audience claim carried by every token.
pub const TOKEN_AUDIENCE: &str = "user";

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 30;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: DbId,
    pub session_id: DbId,
    pub aud: String,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Claims embedded in every refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub session_id: DbId,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Configuration for token signing and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret for access tokens.
    pub secret: String,
    /// HMAC secret for refresh tokens. Must differ from `secret`.
    pub refresh_secret: String,
    /// Access token lifetime in minutes (default: 30).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 30).
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_REFRESH_SECRET`       | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `30`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `30`    |
    ///
    /// # Panics
    ///
    /// Panics if either secret is missing or empty, or if both secrets are equal.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .expect("JWT_REFRESH_SECRET must be set in the environment");
        assert!(!refresh_secret.is_empty(), "JWT_REFRESH_SECRET must not be empty");
        assert_ne!(
            secret, refresh_secret,
            "JWT_SECRET and JWT_REFRESH_SECRET must differ"
        );

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            refresh_secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_expiry_mins)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_expiry_days)
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signs and verifies both token kinds. Built once at startup.
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // A token is valid for exactly its lifetime window.
        validation.leeway = 0;
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud"]);

        Self {
            access: KeyPair::from_secret(&config.secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn sign<C: Serialize>(
        &self,
        kind: TokenKind,
        claims: &C,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(kind).encoding,
        )
    }

    /// Decode with the secret for `kind`. Any failure (malformed, expired,
    /// wrong audience, wrong secret) collapses to `None`.
    fn verify<C: DeserializeOwned>(&self, kind: TokenKind, token: &str) -> Option<C> {
        decode::<C>(token, &self.keys(kind).decoding, &self.validation)
            .map(|data| data.claims)
            .ok()
    }

    pub fn sign_access_at(
        &self,
        user_id: DbId,
        session_id: DbId,
        issued_at: Timestamp,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = AccessClaims {
            user_id,
            session_id,
            aud: TOKEN_AUDIENCE.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.access_ttl).timestamp(),
        };
        self.sign(TokenKind::Access, &claims)
    }

    pub fn sign_refresh_at(
        &self,
        session_id: DbId,
        issued_at: Timestamp,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = RefreshClaims {
            session_id,
            aud: TOKEN_AUDIENCE.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.refresh_ttl).timestamp(),
        };
        self.sign(TokenKind::Refresh, &claims)
    }

    /// Sign an access and a refresh token bound to `session_id`.
    pub fn issue_pair(
        &self,
        user_id: DbId,
        session_id: DbId,
    ) -> Result<TokenPair, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.sign_access_at(user_id, session_id, now)?,
            refresh_token: self.sign_refresh_at(session_id, now)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Option<AccessClaims> {
        self.verify(TokenKind::Access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Option<RefreshClaims> {
        self.verify(TokenKind::Refresh, token)
    }
}
