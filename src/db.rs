use crate::channel::{self, ChannelDef};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub fn connect_lazy(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(8))
        .connect_lazy(database_url)
        .with_context(|| format!("Failed to create lazy database pool for {database_url}"))
}

/// Creates the per-channel reading tables if missing. Identifiers come from
/// the static channel registry, never from request input.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for channel in channel::CHANNELS {
        create_channel_table(pool, channel)
            .await
            .with_context(|| format!("Failed to create table for channel {}", channel.slug))?;
    }
    Ok(())
}

async fn create_channel_table(pool: &PgPool, channel: &ChannelDef) -> Result<()> {
    let columns = channel
        .fields
        .iter()
        .map(|field| format!("{} DOUBLE PRECISION", field.column))
        .collect::<Vec<_>>()
        .join(", ");
    let create = format!(
        "CREATE TABLE IF NOT EXISTS {table} (id BIGSERIAL PRIMARY KEY, ts TIMESTAMPTZ NOT NULL, {columns})",
        table = channel.table(),
    );
    sqlx::query(&create).execute(pool).await?;

    let index = format!(
        "CREATE INDEX IF NOT EXISTS {table}_ts_idx ON {table} (ts)",
        table = channel.table(),
    );
    sqlx::query(&index).execute(pool).await?;
    Ok(())
}
