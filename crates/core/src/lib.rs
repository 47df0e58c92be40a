//! Domain primitives shared by the store, mail, and HTTP crates.
//!
//! - [`error`] -- the domain error taxonomy.
//! - [`types`] -- id and timestamp aliases.
//! - [`session`] -- session lifetime and the sliding-renewal policy.
//! - [`verification`] -- one-time code types and their lifetimes.
//! - [`credentials`] -- email normalization and the password policy.

pub mod credentials;
pub mod error;
pub mod session;
pub mod types;
pub mod verification;
