//! Reducer actions and their wire form.
//!
//! Every payload is normalized to "zero or more records" at the boundary: the
//! wire form accepts either a single record object or a list, so the reducer
//! only ever sees a `Vec`.
//!
//! The wire `type` string is open-ended. Anything the reducer does not know is
//! kept as [`ErrorAction::Unknown`], which reduces to a no-op.

use serde::{Deserialize, Serialize};

use crate::ErrorRecord;

/// One state transition request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireAction", into = "WireAction")]
pub enum ErrorAction {
    /// Append to `to_show`.
    AddError(Vec<ErrorRecord>),
    /// Move from `to_show` into `viewed`.
    AcknowledgeError(Vec<ErrorRecord>),
    /// Move from `viewed` back into `to_show`.
    RedisplayError(Vec<ErrorRecord>),
    /// Set `to_show` wholesale.
    ReplaceToShow(Vec<ErrorRecord>),
    /// Set `viewed` wholesale.
    ReplaceViewed(Vec<ErrorRecord>),
    /// Unrecognized kind; carried for logging only.
    Unknown { kind: String },
}

impl ErrorAction {
    pub fn acknowledge(error: ErrorRecord) -> Self {
        Self::AcknowledgeError(vec![error])
    }

    pub fn redisplay(error: ErrorRecord) -> Self {
        Self::RedisplayError(vec![error])
    }

    /// Stable wire name of this action kind.
    pub fn kind(&self) -> &str {
        match self {
            Self::AddError(_) => ADD_ERROR,
            Self::AcknowledgeError(_) => ACKNOWLEDGE_ERROR,
            Self::RedisplayError(_) => REDISPLAY_ERROR,
            Self::ReplaceToShow(_) => REPLACE_TO_SHOW,
            Self::ReplaceViewed(_) => REPLACE_VIEWED,
            Self::Unknown { kind } => kind,
        }
    }

    /// Records carried by this action (empty for `Unknown`).
    pub fn payload(&self) -> &[ErrorRecord] {
        match self {
            Self::AddError(p)
            | Self::AcknowledgeError(p)
            | Self::RedisplayError(p)
            | Self::ReplaceToShow(p)
            | Self::ReplaceViewed(p) => p,
            Self::Unknown { .. } => &[],
        }
    }

    /// Same kind, carrying `records` instead. `Unknown` is returned as-is.
    pub fn with_payload(self, records: Vec<ErrorRecord>) -> Self {
        match self {
            Self::AddError(_) => Self::AddError(records),
            Self::AcknowledgeError(_) => Self::AcknowledgeError(records),
            Self::RedisplayError(_) => Self::RedisplayError(records),
            Self::ReplaceToShow(_) => Self::ReplaceToShow(records),
            Self::ReplaceViewed(_) => Self::ReplaceViewed(records),
            unknown @ Self::Unknown { .. } => unknown,
        }
    }
}

const ADD_ERROR: &str = "add_error";
const ACKNOWLEDGE_ERROR: &str = "acknowledge_error";
const REDISPLAY_ERROR: &str = "redisplay_error";
const REPLACE_TO_SHOW: &str = "replace_to_show";
const REPLACE_VIEWED: &str = "replace_viewed";

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

/// `{"type": "...", "payload": <record> | [<record>, ...]}`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Payload,
}

/// Single record or list of records.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Many(Vec<ErrorRecord>),
    One(Box<ErrorRecord>),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Many(Vec::new())
    }
}

impl Payload {
    pub fn into_vec(self) -> Vec<ErrorRecord> {
        match self {
            Payload::Many(v) => v,
            Payload::One(e) => vec![*e],
        }
    }
}

impl From<WireAction> for ErrorAction {
    fn from(w: WireAction) -> Self {
        let records = w.payload.into_vec();
        match w.kind.as_str() {
            ADD_ERROR => ErrorAction::AddError(records),
            ACKNOWLEDGE_ERROR => ErrorAction::AcknowledgeError(records),
            REDISPLAY_ERROR => ErrorAction::RedisplayError(records),
            REPLACE_TO_SHOW => ErrorAction::ReplaceToShow(records),
            REPLACE_VIEWED => ErrorAction::ReplaceViewed(records),
            _ => ErrorAction::Unknown { kind: w.kind },
        }
    }
}

impl From<ErrorAction> for WireAction {
    fn from(a: ErrorAction) -> Self {
        let kind = a.kind().to_string();
        let payload = match a {
            ErrorAction::AddError(p)
            | ErrorAction::AcknowledgeError(p)
            | ErrorAction::RedisplayError(p)
            | ErrorAction::ReplaceToShow(p)
            | ErrorAction::ReplaceViewed(p) => Payload::Many(p),
            ErrorAction::Unknown { .. } => Payload::default(),
        };
        WireAction { kind, payload }
    }
}
