//! erk-reconcile
//!
//! Error reconciliation core.
//!
//! Decisions:
//! - Identity is `errorId`; every other field is opaque payload
//! - Two disjoint sets: errors to show, errors viewed (suppressed)
//! - All mutation goes through [`reduce`]; snapshots become a fixed pair of
//!   replace actions ([`plan_reconcile`])
//! - Records without identity are rejected at the boundary ([`ValidationError`])
//!
//! Deterministic, pure logic. No IO. No clock. Timers and serialization of
//! concurrent events live in the runtime that owns the state.

mod action;
mod engine;
mod reducer;
mod types;

pub use action::{ErrorAction, Payload, WireAction};
pub use engine::{
    difference_by_id, intersection_by_id, plan_reconcile, reconcile_snapshot, timer_eligible,
    uniq_by_id, ReconcilePlan,
};
pub use reducer::reduce;
pub use types::*;
