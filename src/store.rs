use crate::channel::ChannelDef;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::{PgPool, Row};

/// One stored uplink, with values in the channel's field order. A `None`
/// value means the field was absent or unreadable in the uplink.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: Option<i64>,
    pub timestamp: DateTime<Tz>,
    pub values: Vec<Option<f64>>,
}

pub async fn insert_reading(
    pool: &PgPool,
    channel: &ChannelDef,
    ts: DateTime<Utc>,
    values: &[Option<f64>],
) -> Result<(), sqlx::Error> {
    let columns = channel
        .fields
        .iter()
        .map(|field| field.column)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (0..channel.fields.len())
        .map(|idx| format!("${}", idx + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {table} (ts, {columns}) VALUES ($1, {placeholders})",
        table = channel.table(),
    );

    let mut query = sqlx::query(&sql).bind(ts);
    for value in values {
        query = query.bind(*value);
    }
    query.execute(pool).await?;
    Ok(())
}

/// Readings within `[start, end)`, oldest first. Timestamps come back in the
/// display timezone.
pub async fn fetch_range(
    pool: &PgPool,
    channel: &ChannelDef,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    tz: Tz,
) -> Result<Vec<Reading>, sqlx::Error> {
    let sql = format!(
        "{select} WHERE ts >= $1 AND ts < $2 ORDER BY ts ASC, id ASC",
        select = select_clause(channel),
    );
    let rows = sqlx::query(&sql).bind(start).bind(end).fetch_all(pool).await?;
    rows.iter().map(|row| reading_from_row(row, channel, tz)).collect()
}

/// The most recent reading by timestamp, insertion id breaking ties.
pub async fn fetch_latest(
    pool: &PgPool,
    channel: &ChannelDef,
    tz: Tz,
) -> Result<Option<Reading>, sqlx::Error> {
    let sql = format!(
        "{select} ORDER BY ts DESC, id DESC LIMIT 1",
        select = select_clause(channel),
    );
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    row.map(|row| reading_from_row(&row, channel, tz)).transpose()
}

fn select_clause(channel: &ChannelDef) -> String {
    let columns = channel
        .fields
        .iter()
        .map(|field| field.column)
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT id, ts, {columns} FROM {table}", table = channel.table())
}

fn reading_from_row(
    row: &sqlx::postgres::PgRow,
    channel: &ChannelDef,
    tz: Tz,
) -> Result<Reading, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    let ts: DateTime<Utc> = row.try_get("ts")?;
    let values = channel
        .fields
        .iter()
        .map(|field| row.try_get::<Option<f64>, _>(field.column))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Reading {
        id: Some(id),
        timestamp: ts.with_timezone(&tz),
        values,
    })
}
