//! Request and response types for all erk-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use erk_reconcile::{ErrorId, ErrorRecord, ValidationError};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    /// false once the reconciliation driver has stopped.
    pub driver_running: bool,
}

// ---------------------------------------------------------------------------
// Refusals (422 / 503)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// /v1/errors/to-show
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorsToShowResponse {
    pub errors: Vec<ErrorRecord>,
}

// ---------------------------------------------------------------------------
// /v1/errors/snapshot
// ---------------------------------------------------------------------------

/// Complete current error set from the error source (not a delta).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRequest {
    #[serde(default)]
    pub errors: Vec<ErrorRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub accepted: usize,
    pub rejected: Vec<ValidationError>,
    pub to_show: Vec<ErrorRecord>,
}

// ---------------------------------------------------------------------------
// /v1/errors/acknowledge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    pub acknowledged: ErrorId,
    pub to_show: Vec<ErrorRecord>,
}
