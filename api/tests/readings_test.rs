use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use telemetry_api::errors::Error;
use telemetry_api::model::{AggregateKind, AggregateResponse, NewReading};
use telemetry_api::{db, service};

const DEVICE: &str = "test_device";
const OTHER_DEVICE: &str = "other_device";

async fn test_pool() -> SqlitePool {
    // Single connection so every query sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    db::init_schema(&pool).await.unwrap();
    pool
}

fn reading(sensor_type: &str, value: i64, created_at: i64) -> NewReading {
    NewReading {
        sensor_type: sensor_type.to_string(),
        value,
        created_at: Some(created_at),
    }
}

/// Three time anchors spaced 50 seconds apart, oldest first.
fn anchors() -> (i64, i64, i64) {
    let now = Utc::now().timestamp();
    (now - 100, now - 50, now)
}

/// Seeds the fixture set: four readings for the test device across two
/// sensor types, plus one reading for another device.
async fn seed(pool: &SqlitePool) -> (i64, i64, i64) {
    let (t0, t1, t2) = anchors();

    service::record(pool, DEVICE, reading("temperature", 22, t0))
        .await
        .unwrap();
    service::record(pool, DEVICE, reading("temperature", 50, t1))
        .await
        .unwrap();
    service::record(pool, DEVICE, reading("humidity", 50, t1))
        .await
        .unwrap();
    service::record(pool, DEVICE, reading("temperature", 100, t2))
        .await
        .unwrap();
    service::record(pool, OTHER_DEVICE, reading("temperature", 22, t2))
        .await
        .unwrap();

    (t0, t1, t2)
}

async fn temperature_aggregate(pool: &SqlitePool, kind: AggregateKind) -> AggregateResponse {
    service::aggregate(
        pool,
        kind,
        DEVICE,
        Some("temperature".to_string()),
        None,
        None,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_record_then_list_returns_readings() {
    let pool = test_pool().await;
    seed(&pool).await;

    let readings = service::list(&pool, DEVICE, None, None, None).await.unwrap();
    assert_eq!(readings.len(), 4);
    assert!(readings.iter().all(|r| r.device_id == DEVICE));
}

#[tokio::test]
async fn test_record_rejects_out_of_range_value() {
    let pool = test_pool().await;
    seed(&pool).await;

    for bad_value in [130, -1] {
        let (_, _, t2) = anchors();
        let err = service::record(&pool, DEVICE, reading("temperature", bad_value, t2))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    // Storage unchanged
    let readings = service::list(&pool, DEVICE, None, None, None).await.unwrap();
    assert_eq!(readings.len(), 4);
}

#[tokio::test]
async fn test_record_rejects_empty_sensor_type() {
    let pool = test_pool().await;

    let err = service::record(&pool, DEVICE, reading("", 22, 1700000000))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let readings = service::list(&pool, DEVICE, None, None, None).await.unwrap();
    assert!(readings.is_empty());
}

#[tokio::test]
async fn test_record_defaults_created_at_to_server_clock() {
    let pool = test_pool().await;

    let before = Utc::now().timestamp();
    let stored = service::record(
        &pool,
        DEVICE,
        NewReading {
            sensor_type: "temperature".to_string(),
            value: 22,
            created_at: None,
        },
    )
    .await
    .unwrap();
    let after = Utc::now().timestamp();

    assert!(stored.created_at >= before && stored.created_at <= after);
}

#[tokio::test]
async fn test_list_filters_by_sensor_type() {
    let pool = test_pool().await;
    seed(&pool).await;

    let readings = service::list(&pool, DEVICE, Some("humidity".to_string()), None, None)
        .await
        .unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].value, 50);
}

#[tokio::test]
async fn test_list_time_range_is_inclusive() {
    let pool = test_pool().await;
    let (t0, t1, _) = seed(&pool).await;

    let readings = service::list(&pool, DEVICE, None, Some(t0), Some(t1))
        .await
        .unwrap();
    assert_eq!(readings.len(), 3);
    assert!(readings
        .iter()
        .all(|r| r.created_at >= t0 && r.created_at <= t1));
}

#[tokio::test]
async fn test_list_is_idempotent() {
    let pool = test_pool().await;
    seed(&pool).await;

    let first = service::list(&pool, DEVICE, None, None, None).await.unwrap();
    let second = service::list(&pool, DEVICE, None, None, None).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_aggregate_min_and_max() {
    let pool = test_pool().await;
    seed(&pool).await;

    let min = temperature_aggregate(&pool, AggregateKind::Min).await;
    assert_eq!(min, AggregateResponse::Scalar { value: Some(22.0) });

    let max = temperature_aggregate(&pool, AggregateKind::Max).await;
    assert_eq!(max, AggregateResponse::Scalar { value: Some(100.0) });
}

#[tokio::test]
async fn test_aggregate_mean_rounds_to_two_decimals() {
    let pool = test_pool().await;
    seed(&pool).await;

    let mean = temperature_aggregate(&pool, AggregateKind::Mean).await;
    assert_eq!(mean, AggregateResponse::Scalar { value: Some(57.33) });
}

#[tokio::test]
async fn test_aggregate_median() {
    let pool = test_pool().await;
    seed(&pool).await;

    let median = temperature_aggregate(&pool, AggregateKind::Median).await;
    assert_eq!(median, AggregateResponse::Scalar { value: Some(50.0) });
}

#[tokio::test]
async fn test_aggregate_quartiles() {
    let pool = test_pool().await;
    seed(&pool).await;

    // temperature values [22, 50, 100]: q1 = avg(22, 50), q3 = avg(50, 100)
    let quartiles = temperature_aggregate(&pool, AggregateKind::Quartiles).await;
    assert_eq!(
        quartiles,
        AggregateResponse::Quartiles {
            quartile_1: Some(36.0),
            quartile_3: Some(75.0),
        }
    );
}

#[tokio::test]
async fn test_aggregate_mode_most_frequent() {
    let pool = test_pool().await;
    let (_, _, t2) = seed(&pool).await;

    // A second 100 makes it the most frequent temperature value.
    service::record(&pool, DEVICE, reading("temperature", 100, t2))
        .await
        .unwrap();

    let mode = temperature_aggregate(&pool, AggregateKind::Mode).await;
    assert_eq!(mode, AggregateResponse::Scalar { value: Some(100.0) });
}

#[tokio::test]
async fn test_aggregate_mode_tie_breaks_to_smallest() {
    let pool = test_pool().await;
    seed(&pool).await;

    // All temperature values occur once, so the smallest wins.
    let mode = temperature_aggregate(&pool, AggregateKind::Mode).await;
    assert_eq!(mode, AggregateResponse::Scalar { value: Some(22.0) });
}

#[tokio::test]
async fn test_aggregate_requires_sensor_type() {
    let pool = test_pool().await;
    seed(&pool).await;

    for missing in [None, Some(String::new())] {
        let err = service::aggregate(&pool, AggregateKind::Max, DEVICE, missing, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}

#[tokio::test]
async fn test_aggregate_empty_set_is_null_not_zero() {
    let pool = test_pool().await;
    seed(&pool).await;

    let response = service::aggregate(
        &pool,
        AggregateKind::Mean,
        DEVICE,
        Some("pressure".to_string()),
        None,
        None,
    )
    .await
    .unwrap();

    assert_eq!(response, AggregateResponse::Scalar { value: None });
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({ "value": null })
    );
}

#[tokio::test]
async fn test_aggregate_respects_time_range() {
    let pool = test_pool().await;
    let (t0, t1, _) = seed(&pool).await;

    let max = service::aggregate(
        &pool,
        AggregateKind::Max,
        DEVICE,
        Some("temperature".to_string()),
        Some(t0),
        Some(t1),
    )
    .await
    .unwrap();

    assert_eq!(max, AggregateResponse::Scalar { value: Some(50.0) });
}

#[tokio::test]
async fn test_summary_groups_and_orders_by_count() {
    let pool = test_pool().await;
    let (t0, t1, t2) = anchors();

    for (value, ts) in [(22, t0), (50, t1), (100, t2)] {
        service::record(&pool, "device_a", reading("temperature", value, ts))
            .await
            .unwrap();
    }
    service::record(&pool, "device_b", reading("temperature", 22, t2))
        .await
        .unwrap();

    let rows = service::summary(&pool).await.unwrap();
    assert_eq!(rows.len(), 2);

    let a = &rows[0];
    assert_eq!(a.device_id, "device_a");
    assert_eq!(a.count, 3);
    assert_eq!(a.max, 100);
    assert_eq!(a.mean, 57.33);
    assert_eq!(a.median, 50.0);
    assert_eq!(a.quartile_1, 36.0);
    assert_eq!(a.quartile_3, 75.0);

    let b = &rows[1];
    assert_eq!(b.device_id, "device_b");
    assert_eq!(b.sensor_type, "temperature");
    assert_eq!(b.count, 1);
    assert_eq!(b.max, 22);
    assert_eq!(b.mean, 22.0);
    assert_eq!(b.median, 22.0);
    assert_eq!(b.quartile_1, 22.0);
    assert_eq!(b.quartile_3, 22.0);
}

#[tokio::test]
async fn test_summary_groups_by_device_and_type() {
    let pool = test_pool().await;
    seed(&pool).await;

    let rows = service::summary(&pool).await.unwrap();

    // (test_device, temperature), (test_device, humidity), (other_device, temperature)
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].device_id, DEVICE);
    assert_eq!(rows[0].sensor_type, "temperature");
    assert_eq!(rows[0].count, 3);

    // Single-reading groups tie on count and keep a stable key order.
    assert_eq!(rows[1].device_id, OTHER_DEVICE);
    assert_eq!(rows[2].device_id, DEVICE);
    assert_eq!(rows[2].sensor_type, "humidity");
}
