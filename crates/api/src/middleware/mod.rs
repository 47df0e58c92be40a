//! Request extractors and middleware.
//!
//! - [`auth::AuthContext`] -- Extracts the caller's user and session from the access token cookie.
//! - [`rate_limit`] -- Fixed-window limiter for the forgot-password endpoint.

pub mod auth;
pub mod rate_limit;
