use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Error identity (stable string supplied by the error source).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorId(pub String);

impl ErrorId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An id made only of whitespace is as good as missing.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ErrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ErrorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorRecord
// ---------------------------------------------------------------------------

/// One reported error condition.
///
/// Only `error_id` is inspected. `message` and any other fields the source
/// attaches are carried through untouched; unknown JSON fields land in
/// `extra` and serialize back out flat.
///
/// A missing, null or non-string `errorId` deserializes to a blank id so the
/// entry point can reject that one record with a [`ValidationError`] instead
/// of failing the whole payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "errorId", default, deserialize_with = "lenient_error_id")]
    pub error_id: ErrorId,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient_error_id<'de, D>(deserializer: D) -> Result<ErrorId, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(ErrorId(s)),
        _ => Ok(ErrorId::default()),
    }
}

impl ErrorRecord {
    pub fn new(error_id: impl Into<ErrorId>, message: impl Into<String>) -> Self {
        Self {
            error_id: error_id.into(),
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Attach an opaque field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn id(&self) -> &ErrorId {
        &self.error_id
    }

    /// Entry-point validation: a record without identity would break
    /// deduplication, so it must never reach either set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.error_id.is_blank() {
            return Err(ValidationError::MissingErrorId {
                message: self.message.clone(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Input-contract violation for an incoming [`ErrorRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// `errorId` absent, empty or whitespace.
    MissingErrorId { message: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingErrorId { message } => write!(
                f,
                "ERROR_RECORD_REJECTED: record has no errorId (message={message:?})"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a raw snapshot: admitted records keep arrival order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotIntake {
    pub accepted: Vec<ErrorRecord>,
    pub rejected: Vec<ValidationError>,
}

impl SnapshotIntake {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Split a raw snapshot into admitted records and validation failures.
pub fn validate_snapshot(raw: Vec<ErrorRecord>) -> SnapshotIntake {
    let mut intake = SnapshotIntake::default();
    for record in raw {
        match record.validate() {
            Ok(()) => intake.accepted.push(record),
            Err(e) => intake.rejected.push(e),
        }
    }
    intake
}

// ---------------------------------------------------------------------------
// ReconciliationState
// ---------------------------------------------------------------------------

/// The two-set model.
///
/// # Invariants (hold after every reduction)
///
/// - no `errorId` repeats within `to_show`, nor within `viewed`;
/// - `to_show` and `viewed` are disjoint by `errorId`.
///
/// Both sets keep arrival order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationState {
    pub to_show: Vec<ErrorRecord>,
    pub viewed: Vec<ErrorRecord>,
}

impl ReconciliationState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn to_show_ids(&self) -> Vec<ErrorId> {
        self.to_show.iter().map(|e| e.error_id.clone()).collect()
    }

    pub fn viewed_ids(&self) -> Vec<ErrorId> {
        self.viewed.iter().map(|e| e.error_id.clone()).collect()
    }

    pub fn is_shown(&self, id: &ErrorId) -> bool {
        self.to_show.iter().any(|e| &e.error_id == id)
    }

    pub fn is_viewed(&self, id: &ErrorId) -> bool {
        self.viewed.iter().any(|e| &e.error_id == id)
    }

    /// `true` when both sets are duplicate-free and disjoint.
    pub fn is_consistent(&self) -> bool {
        let mut shown: BTreeSet<&ErrorId> = BTreeSet::new();
        for e in &self.to_show {
            if !shown.insert(&e.error_id) {
                return false;
            }
        }
        let mut viewed: BTreeSet<&ErrorId> = BTreeSet::new();
        for e in &self.viewed {
            if !viewed.insert(&e.error_id) || shown.contains(&e.error_id) {
                return false;
            }
        }
        true
    }
}
