//! Opening the connection pool.

use sqlx_core::connection::Connection;
use sqlx_postgres::PgPool;
use tracing::{debug, info, instrument};

use crate::config::PostgresConfig;
use crate::error::Result;

/// Opens a pool for `config` and pings one connection before handing it out.
#[instrument(skip(config), fields(url = %redact_password(&config.url)))]
pub async fn connect(config: &PostgresConfig) -> Result<PgPool> {
    config.validate()?;

    info!(
        pool_size = config.pool_size,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        idle_timeout_ms = config.idle_timeout.map(|t| t.as_millis() as u64),
        "opening PostgreSQL pool"
    );

    let pool = config.pool_options().connect(&config.url).await?;
    pool.acquire().await?.ping().await?;

    debug!(open = pool.size(), "PostgreSQL answered ping");
    Ok(pool)
}

/// Replaces the password in a connection URL with `****`. URLs without
/// credentials come back unchanged.
pub fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:****@{host}"),
        None => url.to_string(),
    }
}
