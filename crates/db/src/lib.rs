//! Persistence layer: models, SQL repositories, and the store traits the
//! authentication flows are written against.
//!
//! - [`models`] -- row types, create DTOs, and public projections.
//! - [`repositories`] -- zero-sized repos issuing SQL against a [`DbPool`].
//! - [`store`] -- the `UserStore` / `SessionStore` / `VerificationCodeStore`
//!   traits, the Postgres adapter, and (with the `memory` feature) an
//!   in-memory implementation.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod store;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
