//! Session lifetime and the sliding-renewal policy.
//!
//! A session carries an absolute `expires_at`. Refreshing a session only
//! writes a new expiry when the remaining lifetime has dropped below
//! [`RENEWAL_THRESHOLD_HOURS`]; otherwise the stored expiry is left alone so
//! frequent refreshes do not turn into frequent writes.

use chrono::Duration;

use crate::types::Timestamp;

/// Absolute lifetime of a new (or renewed) session.
pub const SESSION_LIFETIME_DAYS: i64 = 30;

/// Remaining lifetime below which a refresh slides the session forward.
pub const RENEWAL_THRESHOLD_HOURS: i64 = 24;

/// Expiry for a session created (or renewed) at `now`.
pub fn session_expiry_from(now: Timestamp) -> Timestamp {
    now + Duration::days(SESSION_LIFETIME_DAYS)
}

/// A session is live while its expiry lies strictly in the future.
pub fn is_live(expires_at: Timestamp, now: Timestamp) -> bool {
    expires_at > now
}

/// Decide whether a refresh at `now` must extend the session.
///
/// Returns the new expiry when the remaining lifetime is under the renewal
/// threshold, or `None` when the stored expiry should stay as it is.
pub fn renewed_expiry(expires_at: Timestamp, now: Timestamp) -> Option<Timestamp> {
    let remaining = expires_at - now;
    if remaining < Duration::hours(RENEWAL_THRESHOLD_HOURS) {
        Some(session_expiry_from(now))
    } else {
        None
    }
}
