//! Request handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use meetscan::db::email_repo;

use crate::state::AppState;

/// Accepted range for the `days` query parameter.
const MAX_DAYS: i64 = 365;

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct FetchParams {
    /// Lookback window in days; only used when the store is empty.
    pub days: Option<i64>,
}

/// `GET|POST /api/email/fetch` runs one ingestion cycle.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Response {
    let lookback = match params.days {
        None => state.config.ingest.lookback(),
        Some(days) if (1..=MAX_DAYS).contains(&days) => Duration::days(days),
        Some(days) => {
            return api_error(
                StatusCode::BAD_REQUEST,
                format!("days must be between 1 and {MAX_DAYS}, got {days}"),
            )
        }
    };

    let Ok(_guard) = state.cycle_lock.try_lock() else {
        warn!("Fetch requested while a cycle is running");
        return api_error(StatusCode::CONFLICT, "An ingestion cycle is already running");
    };

    let mut source = (state.source_factory)();
    match state
        .pipeline
        .run_cycle_with(source.as_mut(), Utc::now(), lookback)
        .await
    {
        Ok(report) => {
            let summary = report.summary();
            info!(persisted = summary.persisted, "Fetch completed");
            Json(serde_json::json!({
                "message": format!(
                    "Stored {} new meeting emails out of {} listed since {}.",
                    summary.persisted,
                    summary.listed,
                    summary.floor.to_rfc3339(),
                ),
                "summary": summary,
            }))
            .into_response()
        }
        Err(e) if e.is_upstream() => {
            warn!(error = %e, "Ingestion cycle failed");
            api_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
        Err(e) => {
            error!(error = %e, "Ingestion cycle failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `GET /api/email/list` returns every stored message, newest first.
pub async fn list_handler(State(state): State<AppState>) -> Response {
    match email_repo::list_all(&state.db) {
        Ok(emails) => Json(emails).into_response(),
        Err(e) => {
            error!(error = %e, "Listing stored emails failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Response {
    let count = email_repo::count(&state.db);
    let last = email_repo::find_max_received_at(&state.db);
    match (count, last) {
        (Ok(count), Ok(last)) => Json(serde_json::json!({
            "status": "ok",
            "emails": count,
            "lastReceivedAt": last,
        }))
        .into_response(),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "Health check failed");
            api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}
