//! Offline replay of scripted events through the pure reconciliation core.
//!
//! Script shape:
//!
//! ```json
//! { "steps": [
//!     { "step": "snapshot",    "errors": [ { "errorId": "E1", "message": "..." } ] },
//!     { "step": "acknowledge", "error":  { "errorId": "E1" } },
//!     { "step": "action",      "action": { "type": "redisplay_error", "payload": { "errorId": "E1" } } }
//! ] }
//! ```
//!
//! No clock is involved: timers are not simulated. Each output line carries
//! `timer_eligible`, the ids that would hold a redisplay timer at that point,
//! and a scripted `redisplay_error` action stands in for a firing.

use anyhow::Result;
use erk_reconcile::{
    reconcile_snapshot, reduce, timer_eligible, uniq_by_id, validate_snapshot, ErrorAction,
    ErrorId, ErrorRecord, ReconciliationState, ValidationError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::read_json_file;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    Snapshot {
        #[serde(default)]
        errors: Vec<ErrorRecord>,
    },
    Acknowledge {
        error: ErrorRecord,
    },
    Action {
        action: ErrorAction,
    },
}

/// State after one step, printed as one JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayLine {
    pub step: usize,
    pub kind: String,
    pub to_show: Vec<ErrorId>,
    pub viewed: Vec<ErrorId>,
    pub timer_eligible: Vec<ErrorId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<ValidationError>,
}

pub fn replay_file(path: &str) -> Result<()> {
    let script: ReplayScript = read_json_file(path)?;
    for line in replay(script) {
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

pub fn replay(script: ReplayScript) -> Vec<ReplayLine> {
    let mut state = ReconciliationState::empty();
    let mut latest: Vec<ErrorRecord> = Vec::new();
    let mut out = Vec::with_capacity(script.steps.len());

    for (i, step) in script.steps.into_iter().enumerate() {
        let mut rejected = Vec::new();

        let kind = match step {
            ReplayStep::Snapshot { errors } => {
                let intake = validate_snapshot(errors);
                rejected = intake.rejected;
                state = reconcile_snapshot(state, &intake.accepted);
                latest = uniq_by_id(intake.accepted);
                "snapshot".to_string()
            }
            ReplayStep::Acknowledge { error } => {
                match error.validate() {
                    Ok(()) => state = reduce(state, ErrorAction::acknowledge(error)),
                    Err(e) => rejected.push(e),
                }
                "acknowledge".to_string()
            }
            ReplayStep::Action { action } => {
                let kind = action.kind().to_string();
                if let ErrorAction::Unknown { .. } = &action {
                    warn!(step = i, kind = %kind, "unknown action kind; ignored");
                }
                // Unkeyed records never reach the sets, whichever way they came in.
                let intake = validate_snapshot(action.payload().to_vec());
                rejected = intake.rejected;
                state = reduce(state, action.with_payload(intake.accepted));
                kind
            }
        };

        for r in &rejected {
            warn!(step = i, rejected = %r, "record rejected");
        }
        debug!(step = i, kind = %kind, "replayed");

        out.push(ReplayLine {
            step: i,
            kind,
            to_show: state.to_show_ids(),
            viewed: state.viewed_ids(),
            timer_eligible: timer_eligible(&state, &latest)
                .into_iter()
                .map(|e| e.error_id)
                .collect(),
            rejected,
        });
    }

    out
}
