use crate::errors::Result;
use crate::model::{Filter, Reading};
use crate::predicate::{self, Bind};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub async fn make_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening database...");
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    info!("Database connection established");
    init_schema(&pool).await?;

    Ok(pool)
}

/// Idempotent bootstrap of the single append-only readings table.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS readings (
            device_id TEXT NOT NULL,
            sensor_type TEXT NOT NULL,
            value INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_reading(pool: &SqlitePool, reading: &Reading) -> Result<()> {
    sqlx::query(
        "INSERT INTO readings (device_id, sensor_type, value, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&reading.device_id)
    .bind(&reading.sensor_type)
    .bind(reading.value)
    .bind(reading.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_readings(pool: &SqlitePool, filter: &Filter) -> Result<Vec<Reading>> {
    let (where_clause, binds) = predicate::build_where(filter);
    let sql = format!(
        "SELECT device_id, sensor_type, value, created_at FROM readings {} ORDER BY created_at",
        where_clause
    );

    let mut query = sqlx::query_as::<_, Reading>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
        };
    }

    Ok(query.fetch_all(pool).await?)
}

/// Value column only, for the in-process aggregators.
pub async fn fetch_values(pool: &SqlitePool, filter: &Filter) -> Result<Vec<i64>> {
    let (where_clause, binds) = predicate::build_where(filter);
    let sql = format!("SELECT value FROM readings {}", where_clause);

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
        };
    }

    Ok(query.fetch_all(pool).await?)
}
