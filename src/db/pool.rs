//! Connection pool initialization.
//!
//! # Design Decisions
//! - Fail fast: a pool that cannot open or ping aborts startup
//! - `try_init_conn_pool` exposes the same steps as a recoverable call for
//!   callers that manage their own startup policy

use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::Connection;

use crate::config::DatabaseConfig;

/// Open a pool and verify one connection with a ping.
pub async fn try_init_conn_pool(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_open)
        .min_connections(config.max_idle.min(config.max_open))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.dsn)
        .await?;

    let ping = async {
        let mut conn = pool.acquire().await?;
        conn.ping().await
    };
    if let Err(e) = ping.await {
        pool.close().await;
        return Err(e);
    }

    tracing::info!(
        max_open = config.max_open,
        max_idle = config.max_idle,
        max_lifetime_secs = config.max_lifetime_secs,
        "Database pool ready"
    );
    Ok(pool)
}

/// Open the pool or abort.
///
/// # Panics
/// Panics if the pool cannot be opened or the first ping fails.
pub async fn init_conn_pool(config: &DatabaseConfig) -> MySqlPool {
    match try_init_conn_pool(config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Database pool initialization failed");
            panic!("database pool initialization failed: {}", e);
        }
    }
}
