//! Fixed-window rate limiting for `POST /auth/password/forgot`.
//!
//! Callers are keyed by the last `X-Forwarded-For` hop, the one appended by
//! the single trusted proxy, falling back to the socket peer address. A request counts against the window only if it
//! succeeds; responses with status >= 400 hand their slot back. The limiter
//! is skipped entirely in development.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::state::AppState;

/// Requests allowed per window on the forgot-password endpoint.
pub const PASSWORD_RESET_MAX_REQUESTS: u32 = 2;

/// Length of the forgot-password window, in seconds.
pub const PASSWORD_RESET_WINDOW_SECS: i64 = 5 * 60;

const PASSWORD_RESET_LIMITED_MESSAGE: &str =
    "Too many password reset requests. Please try again in 5 minutes.";

/// Entries are pruned once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone)]
struct WindowEntry {
    attempts: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32, reset_in_secs: i64 },
    Limited { retry_after_secs: i64 },
}

#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    message: &'static str,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration, message: &'static str) -> Self {
        Self {
            max_requests,
            window,
            message,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Two requests per five minutes.
    pub fn password_reset() -> Self {
        Self::new(
            PASSWORD_RESET_MAX_REQUESTS,
            Duration::seconds(PASSWORD_RESET_WINDOW_SECS),
            PASSWORD_RESET_LIMITED_MESSAGE,
        )
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn hit(&self, key: &str) -> RateLimitDecision {
        self.hit_at(key, Utc::now())
    }

    /// Count a request from `key` at `now`. Limited requests are not counted.
    pub fn hit_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if entries.len() > PRUNE_THRESHOLD {
            entries.retain(|_, entry| entry.reset_at > now);
        }

        let entry = entries
            .entry(key.to_owned())
            .and_modify(|entry| {
                if entry.reset_at <= now {
                    // Window expired, start new one
                    entry.attempts = 0;
                    entry.reset_at = now + self.window;
                }
            })
            .or_insert_with(|| WindowEntry {
                attempts: 0,
                reset_at: now + self.window,
            });

        let reset_in_secs = (entry.reset_at - now).num_seconds().max(0);
        if entry.attempts >= self.max_requests {
            return RateLimitDecision::Limited {
                retry_after_secs: reset_in_secs,
            };
        }

        entry.attempts += 1;
        RateLimitDecision::Allowed {
            remaining: self.max_requests - entry.attempts,
            reset_in_secs,
        }
    }

    /// Hand back a slot taken by [`hit`](Self::hit) for a request that failed.
    pub fn release(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get_mut(key) {
            entry.attempts = entry.attempts.saturating_sub(1);
        }
    }
}

/// Identify the caller: last `X-Forwarded-For` hop, else the peer address.
///
/// Earlier hops are supplied by the client and never used.
pub fn caller_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_owned())
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

/// Middleware guarding the forgot-password route with
/// [`AppState::password_reset_limiter`].
pub async fn limit_password_reset(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.app_env.is_development() {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = caller_key(request.headers(), peer);
    let limiter = &state.password_reset_limiter;

    match limiter.hit(&key) {
        RateLimitDecision::Limited { retry_after_secs } => {
            tracing::warn!(caller = %key, retry_after_secs, "Password reset rate limit exceeded");

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(json!({
                    "error": limiter.message,
                    "code": "RATE_LIMITED",
                })),
            )
                .into_response();

            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                headers.insert(header::RETRY_AFTER, value);
            }
            set_header(headers, "ratelimit-limit", limiter.max_requests());
            set_header(headers, "ratelimit-remaining", 0);
            set_header(headers, "ratelimit-reset", retry_after_secs);
            response
        }
        RateLimitDecision::Allowed {
            remaining,
            reset_in_secs,
        } => {
            let mut response = next.run(request).await;

            if response.status().as_u16() >= 400 {
                limiter.release(&key);
            } else {
                let headers = response.headers_mut();
                set_header(headers, "ratelimit-limit", limiter.max_requests());
                set_header(headers, "ratelimit-remaining", remaining);
                set_header(headers, "ratelimit-reset", reset_in_secs);
            }
            response
        }
    }
}
