use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// Database connection pool type
pub type DbPool = sqlx::PgPool;

/// Database connection type - supports both pool connections and transactions
/// Use `conn.as_mut()` for pool connections, `tx.as_mut()` for transactions
pub type DbConn = sqlx::PgConnection;

/// Opens a pool and applies pending migrations.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.connection_string().expose_secret())
        .await
        .map_err(Error::Sqlx)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| Error::Internal(format!("Migration failed: {e}")))?;

    tracing::info!(
        host = %config.host,
        database = %config.database,
        "Connected to Postgres and applied migrations"
    );
    Ok(pool)
}
