use crate::errors::Error;
use crate::model::{AggregateKind, AggregateResponse, NewReading, Reading, SummaryRow};
use crate::service;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::error;

#[derive(Debug, Clone)]
struct AppState {
    pool: SqlitePool,
}

#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    #[serde(rename = "type")]
    sensor_type: Option<String>,
    start: Option<i64>,
    end: Option<i64>,
}

pub fn create_router(pool: SqlitePool) -> Router {
    let state = AppState { pool };

    Router::new()
        .route("/devices/summary", get(get_summary))
        .route(
            "/devices/:device_id/readings",
            get(get_readings).post(post_reading),
        )
        .route("/devices/:device_id/readings/:kind", get(get_aggregate))
        .with_state(state)
}

async fn post_reading(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(body): Json<NewReading>,
) -> Result<impl IntoResponse, AppError> {
    service::record(&state.pool, &device_id, body).await?;
    Ok((StatusCode::CREATED, "success"))
}

async fn get_readings(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(params): Query<ReadingsQuery>,
) -> Result<Json<Vec<Reading>>, AppError> {
    let readings = service::list(
        &state.pool,
        &device_id,
        params.sensor_type,
        params.start,
        params.end,
    )
    .await?;

    Ok(Json(readings))
}

async fn get_aggregate(
    State(state): State<AppState>,
    Path((device_id, kind)): Path<(String, String)>,
    Query(params): Query<ReadingsQuery>,
) -> Result<Json<AggregateResponse>, AppError> {
    let kind: AggregateKind = kind.parse()?;

    let response = service::aggregate(
        &state.pool,
        kind,
        &device_id,
        params.sensor_type,
        params.start,
        params.end,
    )
    .await?;

    Ok(Json(response))
}

async fn get_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<SummaryRow>>, AppError> {
    let rows = service::summary(&state.pool).await?;
    Ok(Json(rows))
}

enum AppError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            AppError::Internal(err) => {
                error!("API error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => AppError::BadRequest(message),
            other => AppError::Internal(other.into()),
        }
    }
}
