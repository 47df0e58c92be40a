//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- Access/refresh token signing and verification.
//! - [`cookies`] -- Setting and clearing the auth cookies.

pub mod cookies;
pub mod jwt;
pub mod password;
