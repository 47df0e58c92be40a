//! The authentication flows, independent of HTTP.
//!
//! - [`session_lifecycle`] -- register, login, logout, refresh, session listing and revocation.
//! - [`verification_flow`] -- email verification and password reset codes.
//!
//! Every flow takes the [`AppState`](crate::state::AppState) it needs and
//! returns domain values; handlers own cookies and status codes.

pub mod session_lifecycle;
pub mod verification_flow;

use latchkey_mail::templates::EmailTemplate;

use crate::state::AppState;

/// Send a templated email, logging failures instead of returning them.
pub(crate) async fn send_best_effort(state: &AppState, to: &str, template: EmailTemplate, purpose: &str) {
    let email = template.to(to);
    match state.mailer.send(&email).await {
        Ok(receipt) => {
            tracing::debug!(to, purpose, message_id = ?receipt.id, "Email dispatched");
        }
        Err(e) => {
            tracing::error!(to, purpose, error = %e, "Email delivery failed");
        }
    }
}
