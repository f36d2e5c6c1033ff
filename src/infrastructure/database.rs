use std::str::FromStr;

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    Connection, PgPool,
};
use tracing::info;

use crate::infrastructure::config::DatabaseConfig;

pub const CREATE_PROPOSALS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS proposals (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        description TEXT,
        submitted_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Builds connect options from the URL. Production requires TLS but does not verify
/// the server certificate; every other environment connects in plain text.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    let ssl_mode = if config.environment.is_production() {
        PgSslMode::Require
    } else {
        PgSslMode::Disable
    };

    Ok(PgConnectOptions::from_str(&config.database_url)?.ssl_mode(ssl_mode))
}

/// Creates the pool without opening any connection yet.
pub fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = connect_options(config)?;
    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_lazy_with(options))
}

/// Checks out one connection and pings it.
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    conn.ping().await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_PROPOSALS_TABLE).execute(pool).await?;
    Ok(())
}

/// Startup sequence: pool, connectivity check, schema. Any error here is meant to be fatal.
pub async fn connect_database(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = create_pool(config)?;

    verify_connection(&pool).await?;
    info!(
        max_connections = config.max_connections,
        tls = config.environment.is_production(),
        "PostgreSQL connected"
    );

    ensure_schema(&pool).await?;
    info!("Table is created or already exists");

    Ok(pool)
}
