//! Query handlers.
//!
//! Each handler resolves its window, runs the query layer over the sample
//! store, and wraps the result in the shared JSON envelope.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use wirestat_collector::{BANDWIDTH_IN, BANDWIDTH_OUT};
use wirestat_rates::{
    QueryError, QueryResult, RatePoint, Scale, SeriesPoint, Stats, rate_report, raw_series,
};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn query_error_response(err: &QueryError) -> Response {
    if err.is_client_error() {
        error_response(&err.to_string(), StatusCode::BAD_REQUEST).into_response()
    } else {
        warn!(error = %err, "query failed");
        error_response(&err.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
    }
}

// ── Traffic ────────────────────────────────────────────────────

/// Window selector shared by the traffic and values endpoints.
#[derive(serde::Deserialize)]
pub struct WindowQuery {
    pub scale: Option<String>,
}

impl WindowQuery {
    /// Absent parameter means the hour window.
    fn window_scale(&self) -> QueryResult<Scale> {
        match self.scale.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Scale::default()),
        }
    }
}

/// Both directions of one report plus their statistics.
#[derive(serde::Serialize)]
pub struct DirectionalReport<P: serde::Serialize> {
    #[serde(rename = "in")]
    pub inbound: Vec<P>,
    #[serde(rename = "out")]
    pub outbound: Vec<P>,
    pub stats: DirectionalStats,
}

#[derive(serde::Serialize)]
pub struct DirectionalStats {
    #[serde(rename = "in")]
    pub inbound: Stats,
    #[serde(rename = "out")]
    pub outbound: Stats,
}

fn traffic_payload(state: &ApiState, scale: Scale) -> QueryResult<DirectionalReport<RatePoint>> {
    let inbound = rate_report(&state.store, &state.catalog, BANDWIDTH_IN, scale)?;
    let outbound = rate_report(&state.store, &state.catalog, BANDWIDTH_OUT, scale)?;
    Ok(DirectionalReport {
        inbound: inbound.points,
        outbound: outbound.points,
        stats: DirectionalStats {
            inbound: inbound.stats,
            outbound: outbound.stats,
        },
    })
}

/// GET /api/v1/traffic?scale=hour|day|week
pub async fn get_traffic(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> impl IntoResponse {
    match query.window_scale().and_then(|scale| traffic_payload(&state, scale)) {
        Ok(payload) => ApiResponse::ok(payload).into_response(),
        Err(e) => query_error_response(&e),
    }
}

// ── Raw values ─────────────────────────────────────────────────

fn values_payload(state: &ApiState, scale: Scale) -> QueryResult<DirectionalReport<SeriesPoint>> {
    let inbound = raw_series(&state.store, &state.catalog, BANDWIDTH_IN, scale)?;
    let outbound = raw_series(&state.store, &state.catalog, BANDWIDTH_OUT, scale)?;
    Ok(DirectionalReport {
        inbound: inbound.points,
        outbound: outbound.points,
        stats: DirectionalStats {
            inbound: inbound.stats,
            outbound: outbound.stats,
        },
    })
}

/// GET /api/v1/values?scale=hour|day|week
pub async fn get_values(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> impl IntoResponse {
    match query.window_scale().and_then(|scale| values_payload(&state, scale)) {
        Ok(payload) => ApiResponse::ok(payload).into_response(),
        Err(e) => query_error_response(&e),
    }
}

// ── Device ─────────────────────────────────────────────────────

/// GET /api/v1/device
pub async fn get_device(State(state): State<ApiState>) -> impl IntoResponse {
    let summary = state.summary.borrow().clone();
    ApiResponse::ok(summary)
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.latest_timestamp() {
        Ok(latest) => ApiResponse::ok(serde_json::json!({
            "status": "ok",
            "latest_sample": latest,
        }))
        .into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::SERVICE_UNAVAILABLE).into_response(),
    }
}
