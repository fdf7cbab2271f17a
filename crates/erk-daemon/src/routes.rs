//! Axum router and all HTTP handlers for erk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Tests compose the bare router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use erk_reconcile::ErrorRecord;
use futures_util::{stream, Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use crate::{
    api_types::{
        AcknowledgeResponse, ErrorResponse, ErrorsToShowResponse, HealthResponse,
        SnapshotRequest, SnapshotResponse,
    },
    driver::DriverError,
    state::{AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/errors", get(errors_view))
        .route("/v1/errors/to-show", get(errors_to_show))
        .route("/v1/errors/snapshot", post(ingest_snapshot))
        .route("/v1/errors/acknowledge", post(acknowledge))
        .route("/v1/stream", get(stream_events))
        .with_state(state)
}

fn driver_error(e: DriverError) -> Response {
    let status = match e {
        DriverError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DriverError::Shutdown => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            driver_running: st.driver.is_running(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/errors   GET /v1/errors/to-show
// ---------------------------------------------------------------------------

pub(crate) async fn errors_view(State(st): State<Arc<AppState>>) -> Response {
    if !st.driver.is_running() {
        return driver_error(DriverError::Shutdown);
    }
    (StatusCode::OK, Json(st.driver.view())).into_response()
}

pub(crate) async fn errors_to_show(State(st): State<Arc<AppState>>) -> Response {
    if !st.driver.is_running() {
        return driver_error(DriverError::Shutdown);
    }
    let errors = st.driver.errors_to_show();
    (StatusCode::OK, Json(ErrorsToShowResponse { errors })).into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/errors/snapshot
// ---------------------------------------------------------------------------

pub(crate) async fn ingest_snapshot(
    State(st): State<Arc<AppState>>,
    Json(req): Json<SnapshotRequest>,
) -> Response {
    let report = match st.driver.ingest_snapshot(req.errors).await {
        Ok(r) => r,
        Err(e) => return driver_error(e),
    };

    info!(
        accepted = report.accepted,
        rejected = report.rejected.len(),
        "errors/snapshot"
    );
    (
        StatusCode::OK,
        Json(SnapshotResponse {
            accepted: report.accepted,
            rejected: report.rejected,
            to_show: st.driver.errors_to_show(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/errors/acknowledge
// ---------------------------------------------------------------------------

pub(crate) async fn acknowledge(
    State(st): State<Arc<AppState>>,
    Json(error): Json<ErrorRecord>,
) -> Response {
    let acknowledged = error.error_id.clone();
    if let Err(e) = st.driver.acknowledge(error).await {
        return driver_error(e);
    }

    info!(error_id = %acknowledged, "errors/acknowledge");
    (
        StatusCode::OK,
        Json(AcknowledgeResponse {
            acknowledged,
            to_show: st.driver.errors_to_show(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream_events(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    // Subscribe before reading the current view so no change falls between.
    let rx = st.bus.subscribe();
    let current = BusMsg::Errors(st.driver.view());
    let events = stream::iter(to_event(&current).map(Ok::<Event, Infallible>))
        .chain(broadcast_to_sse(rx));

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn to_event(m: &BusMsg) -> Option<Event> {
    let event_name = match m {
        BusMsg::Heartbeat { .. } => "heartbeat",
        BusMsg::Errors(_) => "errors",
        BusMsg::LogLine { .. } => "log",
    };
    let data = serde_json::to_string(m).ok()?;
    Some(Event::default().event(event_name).data(data))
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => to_event(&m).map(Ok),
            Err(_) => None, // lagged / closed
        }
    })
}
