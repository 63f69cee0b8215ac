//! Database pool construction and health checks

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Connection attempts made at startup before giving up. The database often
/// comes up alongside the server (compose environments), so the first few
/// attempts are expected to fail.
const CONNECT_ATTEMPTS: u32 = 10;

/// Delay between startup connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
}

/// Create the connection pool, retrying while the database comes up.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        match pool_options(config).connect(&config.url).await {
            Ok(pool) => {
                info!(
                    attempt,
                    max_connections = config.max_connections,
                    "database connection pool established"
                );
                return Ok(pool);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                warn!(attempt, error = %e, "failed to connect to database, retrying");
                attempt += 1;
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Cheap connectivity probe used by the health endpoint.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
