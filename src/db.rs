//! Database connection and pool management for the SensorHub API.
//!
//! This module provides functionality to initialize and manage a SeaORM
//! connection pool with configurable parameters, and to apply migrations.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Connection attempts made against a server-backed database.
const MAX_CONNECT_ATTEMPTS: u32 = 5;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Initializes a database connection pool with the given configuration.
///
/// Server-backed databases get up to [`MAX_CONNECT_ATTEMPTS`] tries with
/// exponential backoff. SQLite opens a local file or memory, so a failure
/// there is final and is reported on the first attempt.
///
/// # Examples
///
/// ```no_run
/// use sensorhub::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::default();
///     let db = init_pool(&config).await?;
///     // Use the database connection...
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let mut opt = ConnectOptions::new(&cfg.database_url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600)) // 10 minutes
        .max_lifetime(Duration::from_secs(1800)) // 30 minutes
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let attempts = connect_attempts(&cfg.database_url);
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut attempt = 1;

    loop {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                tracing::info!(
                    attempt,
                    backend = ?conn.get_database_backend(),
                    "Connected to database"
                );
                return Ok(conn);
            }
            Err(error) if attempt >= attempts => {
                tracing::error!(%error, attempts, "Giving up on database connection");
                return Err(DatabaseError::ConnectionFailed { source: error }.into());
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    attempt,
                    ?retry_delay,
                    "Database connection failed, retrying"
                );
                sleep(retry_delay).await;
                retry_delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Number of connection attempts worth making for `database_url`.
fn connect_attempts(database_url: &str) -> u32 {
    if database_url.starts_with("sqlite:") {
        1
    } else {
        MAX_CONNECT_ATTEMPTS
    }
}

/// Applies all pending migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .context("Failed to apply database migrations")?;
    tracing::info!("Database migrations are up to date");
    Ok(())
}

/// Health check for the database connection.
///
/// Executes `SELECT 1` to verify the connection is still usable. A
/// connection that was never established fails without touching a backend.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    use sea_orm::Statement;

    if matches!(db, DatabaseConnection::Disconnected) {
        anyhow::bail!("Database connection is not established");
    }

    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}
