use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use latchkey_api::background::expiry_sweep;
use latchkey_api::config::{AppEnv, ServerConfig};
use latchkey_api::router::build_app_router;
use latchkey_api::state::AppState;
use latchkey_db::store::{PgStore, SharedStore};
use latchkey_mail::{LogMailer, Mailer, ResendConfig, ResendMailer, SmtpConfig, SmtpMailer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "latchkey_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        app_env = %config.app_env,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = latchkey_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    latchkey_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    latchkey_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store: SharedStore = Arc::new(PgStore::new(pool));

    // --- Mailer ---
    let mailer = build_mailer(config.app_env);

    // --- Expiry sweep ---
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let sweep_handle = tokio::spawn(expiry_sweep::run(
        Arc::clone(&store),
        Duration::from_secs(config.expiry_sweep_interval_secs),
        sweep_cancel.clone(),
    ));

    // --- App state & router ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(store, mailer, config);
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Peer addresses key the forgot-password rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Expiry sweep stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Pick the email provider: Resend if `RESEND_API_KEY` is set, else SMTP if
/// `SMTP_HOST` is set, else log-only.
///
/// Resend runs in sandbox mode in development.
fn build_mailer(app_env: AppEnv) -> Arc<dyn Mailer> {
    if let Some(resend) = ResendConfig::from_env(app_env.is_development()) {
        let sandbox = resend.sandbox;
        let mailer = ResendMailer::new(resend).expect("Failed to build Resend HTTP client");
        tracing::info!(sandbox, "Email delivery via Resend");
        return Arc::new(mailer);
    }

    if let Some(smtp) = SmtpConfig::from_env() {
        let host = smtp.smtp_host.clone();
        let mailer = SmtpMailer::new(smtp).expect("Failed to build SMTP transport");
        tracing::info!(%host, "Email delivery via SMTP");
        return Arc::new(mailer);
    }

    tracing::warn!("No email provider configured, emails will only be logged");
    Arc::new(LogMailer)
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
