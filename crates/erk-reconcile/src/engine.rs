use std::collections::BTreeSet;

use crate::{reduce, ErrorAction, ErrorId, ErrorRecord, ReconciliationState};

// ---------------------------------------------------------------------------
// Id-set helpers (order preserving)
// ---------------------------------------------------------------------------

pub(crate) fn id_set(records: &[ErrorRecord]) -> BTreeSet<&ErrorId> {
    records.iter().map(|e| &e.error_id).collect()
}

/// Drop repeated ids; the first occurrence keeps its slot.
pub fn uniq_by_id(records: Vec<ErrorRecord>) -> Vec<ErrorRecord> {
    let mut seen: BTreeSet<ErrorId> = BTreeSet::new();
    records
        .into_iter()
        .filter(|e| seen.insert(e.error_id.clone()))
        .collect()
}

/// Records of `a` whose id does not appear in `b`.
pub fn difference_by_id(a: &[ErrorRecord], b: &[ErrorRecord]) -> Vec<ErrorRecord> {
    let drop = id_set(b);
    a.iter()
        .filter(|e| !drop.contains(&e.error_id))
        .cloned()
        .collect()
}

/// Records of `a` whose id also appears in `b`.
pub fn intersection_by_id(a: &[ErrorRecord], b: &[ErrorRecord]) -> Vec<ErrorRecord> {
    let keep = id_set(b);
    a.iter()
        .filter(|e| keep.contains(&e.error_id))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Snapshot reconciliation
// ---------------------------------------------------------------------------

/// Delta computed for one incoming snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Previously viewed errors the source still reports. Records are taken
    /// from the snapshot so the freshest payload is kept.
    pub still_viewed: Vec<ErrorRecord>,
    /// Reported errors that are not suppressed.
    pub needs_display: Vec<ErrorRecord>,
}

impl ReconcilePlan {
    /// Dispatch order matters: `viewed` is replaced first so the display set
    /// is computed against the post-replacement suppression set.
    pub fn actions(&self) -> [ErrorAction; 2] {
        [
            ErrorAction::ReplaceViewed(self.still_viewed.clone()),
            ErrorAction::ReplaceToShow(self.needs_display.clone()),
        ]
    }
}

/// Compute the actions that bring `state` in line with a total snapshot.
///
/// Viewed errors that vanished from the snapshot are resolved and dropped.
/// The snapshot is deduplicated first; the source's order is kept.
pub fn plan_reconcile(state: &ReconciliationState, snapshot: &[ErrorRecord]) -> ReconcilePlan {
    let reported = uniq_by_id(snapshot.to_vec());
    let still_viewed = intersection_by_id(&reported, &state.viewed);
    let needs_display = difference_by_id(&reported, &still_viewed);
    ReconcilePlan {
        still_viewed,
        needs_display,
    }
}

/// Apply a full reconciliation cycle through the reducer.
pub fn reconcile_snapshot(
    state: ReconciliationState,
    snapshot: &[ErrorRecord],
) -> ReconciliationState {
    let plan = plan_reconcile(&state, snapshot);
    plan.actions().into_iter().fold(state, reduce)
}

/// Viewed errors that are still reported: exactly the set that must hold a
/// redisplay timer.
pub fn timer_eligible(state: &ReconciliationState, snapshot: &[ErrorRecord]) -> Vec<ErrorRecord> {
    intersection_by_id(&state.viewed, snapshot)
}
