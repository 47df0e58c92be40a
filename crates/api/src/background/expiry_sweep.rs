//! Periodic deletion of expired sessions and verification codes.
//!
//! Runs on a fixed interval using `tokio::time::interval`. Reads never rely
//! on the sweep: every lookup re-checks `expires_at` itself, so the sweep only
//! bounds how long dead rows linger.

use std::time::Duration;

use chrono::Utc;
use latchkey_core::types::Timestamp;
use latchkey_db::store::{SharedStore, StoreResult};
use tokio_util::sync::CancellationToken;

/// Rows removed by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: u64,
    pub codes: u64,
}

/// Delete every session and code that expired at or before `now`.
pub async fn sweep_once(store: &SharedStore, now: Timestamp) -> StoreResult<SweepReport> {
    let sessions = store.delete_expired_sessions(now).await?;
    let codes = store.delete_expired_codes(now).await?;
    Ok(SweepReport { sessions, codes })
}

/// Run the sweep loop every `interval` until `cancel` is triggered.
pub async fn run(store: SharedStore, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Expiry sweep job started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Expiry sweep job stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep_once(&store, Utc::now()).await {
                    Ok(report) if report != SweepReport::default() => {
                        tracing::info!(
                            sessions = report.sessions,
                            codes = report.codes,
                            "Expiry sweep: purged expired rows"
                        );
                    }
                    Ok(_) => tracing::debug!("Expiry sweep: nothing to purge"),
                    Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use latchkey_core::verification::VerificationCodeType;
    use latchkey_db::models::session::CreateSession;
    use latchkey_db::models::user::CreateUser;
    use latchkey_db::models::verification_code::CreateVerificationCode;
    use latchkey_db::store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn sweep_removes_only_expired_rows() {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let user = store
            .create_user(CreateUser {
                email: "sweep@example.com".into(),
                password_hash: "$argon2id$stub".into(),
                user_agent: None,
            })
            .await
            .unwrap();

        let now = Utc::now();
        for expires_at in [now - Duration::hours(1), now + Duration::hours(1)] {
            store
                .create_session(CreateSession {
                    user_id: user.id,
                    user_agent: None,
                    expires_at,
                })
                .await
                .unwrap();
            store
                .create_code(CreateVerificationCode {
                    user_id: user.id,
                    code_type: VerificationCodeType::EmailVerification,
                    expires_at,
                })
                .await
                .unwrap();
        }

        let report = sweep_once(&store, now).await.unwrap();
        assert_eq!(report, SweepReport { sessions: 1, codes: 1 });
        assert_eq!(memory.session_count().await, 1);
        assert_eq!(memory.code_count().await, 1);

        let again = sweep_once(&store, now).await.unwrap();
        assert_eq!(again, SweepReport::default());
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(store, std::time::Duration::from_secs(3600), cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("sweep loop should stop promptly")
            .unwrap();
    }
}
