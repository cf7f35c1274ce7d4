//! Core read/write contract on top of the reading store.
//!
//! Handlers and tests call these functions with an explicit pool handle;
//! there is no process-wide connection state.

use crate::db;
use crate::errors::{Error, Result};
use crate::metrics::{
    DB_FAILURES_TOTAL, QUERY_LATENCY_SECONDS, READINGS_RECORDED_TOTAL, READINGS_REJECTED_TOTAL,
};
use crate::model::{AggregateKind, AggregateResponse, Filter, NewReading, Reading, SummaryRow};
use crate::stats;
use crate::validate;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

/// Validates and appends one reading. Storage is never touched on
/// validation failure.
pub async fn record(pool: &SqlitePool, device_id: &str, new: NewReading) -> Result<Reading> {
    if let Err(err) = validate::validate(device_id, &new) {
        READINGS_REJECTED_TOTAL.inc();
        return Err(err);
    }

    let reading = Reading {
        device_id: device_id.to_string(),
        sensor_type: new.sensor_type,
        value: new.value,
        created_at: new.created_at.unwrap_or_else(|| Utc::now().timestamp()),
    };

    db::insert_reading(pool, &reading).await.map_err(fault)?;
    READINGS_RECORDED_TOTAL.inc();

    Ok(reading)
}

/// Raw readings for one device, optionally narrowed by type and time range.
pub async fn list(
    pool: &SqlitePool,
    device_id: &str,
    sensor_type: Option<String>,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<Vec<Reading>> {
    let filter = Filter {
        device_id: Some(device_id.to_string()),
        sensor_type: sensor_type.filter(|t| !t.is_empty()),
        start,
        end,
    };

    let started = Instant::now();
    let readings = db::fetch_readings(pool, &filter).await.map_err(fault)?;
    QUERY_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());

    debug!("listed {} readings for device {}", readings.len(), device_id);
    Ok(readings)
}

/// One statistic over the value column of the matching readings.
///
/// `sensor_type` is mandatory here, unlike on the raw listing.
pub async fn aggregate(
    pool: &SqlitePool,
    kind: AggregateKind,
    device_id: &str,
    sensor_type: Option<String>,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<AggregateResponse> {
    let sensor_type = sensor_type
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Validation("sensor type is required".to_string()))?;

    let filter = Filter {
        device_id: Some(device_id.to_string()),
        sensor_type: Some(sensor_type),
        start,
        end,
    };

    let started = Instant::now();
    let values = db::fetch_values(pool, &filter).await.map_err(fault)?;
    QUERY_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());

    let response = match kind {
        AggregateKind::Min => AggregateResponse::Scalar {
            value: stats::min(&values).map(|v| v as f64),
        },
        AggregateKind::Max => AggregateResponse::Scalar {
            value: stats::max(&values).map(|v| v as f64),
        },
        AggregateKind::Mean => AggregateResponse::Scalar {
            value: stats::mean(&values),
        },
        AggregateKind::Median => AggregateResponse::Scalar {
            value: stats::percentile(&values, 50.0),
        },
        AggregateKind::Mode => AggregateResponse::Scalar {
            value: stats::mode(&values).map(|v| v as f64),
        },
        AggregateKind::Quartiles => AggregateResponse::Quartiles {
            quartile_1: stats::percentile(&values, 25.0),
            quartile_3: stats::percentile(&values, 75.0),
        },
    };

    Ok(response)
}

/// Fleet-wide rollup grouped by (device, sensor type), most readings first.
pub async fn summary(pool: &SqlitePool) -> Result<Vec<SummaryRow>> {
    let started = Instant::now();
    let readings = db::fetch_readings(pool, &Filter::default()).await.map_err(fault)?;
    QUERY_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());

    // Ordered map keeps tie-broken output deterministic after the sort.
    let mut groups: BTreeMap<(String, String), Vec<i64>> = BTreeMap::new();
    for reading in readings {
        groups
            .entry((reading.device_id, reading.sensor_type))
            .or_default()
            .push(reading.value);
    }

    let mut rows = Vec::with_capacity(groups.len());
    for ((device_id, sensor_type), values) in groups {
        // Groups are never empty: each exists because a reading was seen.
        let (Some(max), Some(mean), Some(quartile_1), Some(quartile_3), Some(median)) = (
            stats::max(&values),
            stats::mean(&values),
            stats::percentile(&values, 25.0),
            stats::percentile(&values, 75.0),
            stats::percentile(&values, 50.0),
        ) else {
            continue;
        };

        rows.push(SummaryRow {
            device_id,
            sensor_type,
            count: values.len() as u64,
            max,
            mean,
            quartile_1,
            quartile_3,
            median,
        });
    }

    rows.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(rows)
}

fn fault(err: Error) -> Error {
    DB_FAILURES_TOTAL.inc();
    err
}
