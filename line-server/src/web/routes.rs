//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Local;

use crate::domain::{DataStatus, Direction};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/lines/:line_code/schedule", get(get_schedule))
        .route("/lines/:line_code/status", get(get_status))
        .route("/admin/schedule/clear-cache", post(clear_schedule_cache))
        .route("/admin/schedule/cache-stats", get(schedule_cache_stats))
        .route("/admin/status/clear-cache", post(clear_status_cache))
        .route("/admin/status/cache-stats", get(status_cache_stats))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Today's schedule for a line.
///
/// Pool codes are answered with the aggregate schedule of their members.
/// A line with no departures in either direction is reported as not
/// found, except when the emptiness is a fetch failure; that record is
/// served so callers can see the FETCH_FAILED status.
async fn get_schedule(
    State(state): State<AppState>,
    Path(line_code): Path<String>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let today = Local::now().date_naive();

    let record = if state.pool.pool().is_pool_code(&line_code) {
        Arc::new(state.pool.get_pooled_schedule(today).await)
    } else {
        state.schedules.get_schedule(&line_code, today).await
    };

    if !record.payload.has_any_times() && record.payload.data_status != DataStatus::FetchFailed {
        return Err(AppError::NotFound {
            message: format!("No schedule found for line {line_code}"),
        });
    }

    Ok(Json(ScheduleResponse::from(record.as_ref())))
}

/// Current operational status of a line.
async fn get_status(
    State(state): State<AppState>,
    Path(line_code): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    let direction = match query.direction.as_deref() {
        Some(code) => Some(Direction::parse(code).ok_or_else(|| AppError::BadRequest {
            message: format!("Invalid direction: {code} (expected G or D)"),
        })?),
        None => None,
    };

    let status = state.status.get_status(&line_code, direction).await;

    Ok(Json(StatusResponse {
        line_code: line_code.to_uppercase(),
        direction,
        status,
    }))
}

/// Drop cached schedules, for one line or all of them.
async fn clear_schedule_cache(
    State(state): State<AppState>,
    Query(query): Query<ClearCacheQuery>,
) -> Json<MessageResponse> {
    let today = Local::now().date_naive();
    state
        .schedules
        .clear_cache(query.line_code.as_deref(), today)
        .await;

    let message = match query.line_code {
        Some(code) => format!("Schedule cache cleared for line {code}"),
        None => "Schedule cache cleared".to_string(),
    };
    Json(MessageResponse { message })
}

/// Schedule cache statistics, both tiers.
async fn schedule_cache_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let today = Local::now().date_naive();
    let stats = state.schedules.cache_stats(today).await?;
    Ok(Json(stats))
}

/// Drop cached statuses, for one line or all of them.
async fn clear_status_cache(
    State(state): State<AppState>,
    Query(query): Query<ClearCacheQuery>,
) -> Json<MessageResponse> {
    state.status.clear_cache(query.line_code.as_deref()).await;

    let message = match query.line_code {
        Some(code) => format!("Status cache cleared for line {code}"),
        None => "Status cache cleared".to_string(),
    };
    Json(MessageResponse { message })
}

/// Status cache statistics.
async fn status_cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.status.cache_stats().await)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<crate::store::StoreError> for AppError {
    fn from(e: crate::store::StoreError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            tracing::error!(%status, message, "request failed");
        } else {
            tracing::debug!(%status, message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
