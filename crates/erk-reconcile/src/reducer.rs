//! The single point of state mutation.
//!
//! # Invariants
//!
//! - Total: every action, including unknown kinds, yields a state.
//! - Pure: no IO, no clock, no logging.
//! - Post-condition: each set is duplicate-free by `errorId` and the two sets
//!   are disjoint. Ids named by an action end up in the set that action writes
//!   and are removed from the other one.

use crate::engine::{difference_by_id, uniq_by_id};
use crate::{ErrorAction, ReconciliationState};

/// Compute the next state from the current state and one action.
pub fn reduce(state: ReconciliationState, action: ErrorAction) -> ReconciliationState {
    let ReconciliationState { to_show, viewed } = state;

    let (to_show, viewed) = match action {
        ErrorAction::AddError(added) => {
            let viewed = difference_by_id(&viewed, &added);
            (concat(to_show, added), viewed)
        }
        ErrorAction::AcknowledgeError(acked) => {
            let viewed = uniq_by_id(concat(viewed, acked));
            let to_show = difference_by_id(&to_show, &viewed);
            (to_show, viewed)
        }
        ErrorAction::RedisplayError(restored) => {
            if restored.is_empty() {
                return ReconciliationState { to_show, viewed };
            }
            let viewed = difference_by_id(&viewed, &restored);
            (concat(to_show, restored), viewed)
        }
        ErrorAction::ReplaceToShow(replacement) => {
            let viewed = difference_by_id(&viewed, &replacement);
            (replacement, viewed)
        }
        ErrorAction::ReplaceViewed(replacement) => {
            let to_show = difference_by_id(&to_show, &replacement);
            (to_show, replacement)
        }
        ErrorAction::Unknown { .. } => {
            return ReconciliationState { to_show, viewed };
        }
    };

    ReconciliationState {
        to_show: uniq_by_id(to_show),
        viewed: uniq_by_id(viewed),
    }
}

fn concat<T>(mut a: Vec<T>, b: Vec<T>) -> Vec<T> {
    a.extend(b);
    a
}
