//! Shared runtime state for erk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The reconciliation
//! state itself lives in the driver task; `AppState` only holds a handle.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::driver::{DriverHandle, EngineView};

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Errors(EngineView),
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    /// Static build metadata.
    pub build: BuildInfo,
    /// The single reconciliation driver.
    pub driver: DriverHandle,
}

impl AppState {
    pub fn new(driver: DriverHandle) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "erk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            driver,
        }
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

/// Forward every published driver view onto the bus as an `errors` event.
///
/// Ends when the driver stops.
pub fn spawn_view_publisher(bus: broadcast::Sender<BusMsg>, mut views: watch::Receiver<EngineView>) {
    tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            // No subscribers is fine.
            let _ = bus.send(BusMsg::Errors(view));
        }
        debug!("view publisher stopped: driver gone");
        let _ = bus.send(BusMsg::LogLine {
            level: "WARN".to_string(),
            msg: "reconciliation driver stopped".to_string(),
        });
    });
}
