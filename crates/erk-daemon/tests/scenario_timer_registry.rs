//! Scenario: Keyed redisplay timer registry
//!
//! # Invariants under test
//!
//! 1. A started timer first fires one full period later, then keeps firing
//!    every period until cancelled.
//! 2. Starting a timer for an id that already has one is a no-op.
//! 3. `cancel` is idempotent and stops further firings.
//! 4. A firing from a cancelled (or replaced) timer is not current.
//! 5. `sync` leaves exactly one timer per eligible id.
//! 6. Dropping the registry stops every timer.

use std::time::Duration;

use erk_daemon::{TimerFired, TimerRegistry};
use erk_reconcile::{ErrorId, ErrorRecord};
use tokio::sync::mpsc;
use tokio::time::sleep;

const PERIOD: Duration = Duration::from_secs(60);

fn rec(id: &str) -> ErrorRecord {
    ErrorRecord::new(id, format!("{id} failed"))
}

fn registry() -> (TimerRegistry, mpsc::UnboundedReceiver<TimerFired>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TimerRegistry::new(PERIOD, tx), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<TimerFired>) -> Vec<TimerFired> {
    let mut out = Vec::new();
    while let Ok(f) = rx.try_recv() {
        out.push(f);
    }
    out
}

// ---------------------------------------------------------------------------
// 1. Period + recurrence
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn timer_fires_after_one_period_and_recurs() {
    let (mut reg, mut rx) = registry();
    assert_eq!(reg.period(), PERIOD);
    assert!(reg.start(&rec("E1")));
    assert!(reg.is_active(&ErrorId::from("E1")));

    sleep(Duration::from_secs(59)).await;
    assert!(drain(&mut rx).is_empty(), "must not fire before the period");

    sleep(Duration::from_secs(2)).await;
    let fired = drain(&mut rx);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].error, rec("E1"));
    assert!(reg.is_current(&fired[0]));

    sleep(PERIOD).await;
    assert_eq!(drain(&mut rx).len(), 1, "timer is recurring");
}

// ---------------------------------------------------------------------------
// 2. No duplicate timers
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn second_start_for_same_id_is_ignored() {
    let (mut reg, mut rx) = registry();
    assert!(reg.start(&rec("E1")));

    sleep(Duration::from_secs(30)).await;
    assert!(!reg.start(&rec("E1")), "running timer must not be replaced");
    assert_eq!(reg.len(), 1);

    // Original schedule kept: fires at t=60, not t=90.
    sleep(Duration::from_secs(31)).await;
    assert_eq!(drain(&mut rx).len(), 1);
}

// ---------------------------------------------------------------------------
// 3. Cancel
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_stops_firings_and_is_idempotent() {
    let (mut reg, mut rx) = registry();
    reg.start(&rec("E1"));

    assert!(reg.cancel(&ErrorId::from("E1")));
    assert!(!reg.cancel(&ErrorId::from("E1")), "second cancel is a no-op");
    assert!(!reg.cancel(&ErrorId::from("never-started")));

    sleep(PERIOD * 3).await;
    assert!(drain(&mut rx).is_empty());
    assert!(reg.is_empty());
}

// ---------------------------------------------------------------------------
// 4. Stale firings
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn firing_from_cancelled_timer_is_not_current() {
    let (mut reg, mut rx) = registry();
    reg.start(&rec("E1"));

    sleep(PERIOD + Duration::from_secs(1)).await;
    let queued = drain(&mut rx).pop().expect("one firing queued");

    // Cancelled while the firing sat in the queue.
    reg.cancel(&ErrorId::from("E1"));
    assert!(!reg.is_current(&queued));

    // A fresh timer for the same id gets a new token.
    reg.start(&rec("E1"));
    assert!(!reg.is_current(&queued), "old token must not match new timer");
}

// ---------------------------------------------------------------------------
// 5. Sync
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn sync_starts_missing_and_cancels_ineligible() {
    let (mut reg, _rx) = registry();
    reg.start(&rec("E1"));
    reg.start(&rec("E2"));

    let sync = reg.sync(&[rec("E2"), rec("E3")]);

    assert_eq!(sync.started, vec![ErrorId::from("E3")]);
    assert_eq!(sync.cancelled, vec![ErrorId::from("E1")]);
    assert_eq!(reg.active_ids(), vec![ErrorId::from("E2"), ErrorId::from("E3")]);

    assert!(reg.sync(&[rec("E2"), rec("E3")]).is_noop(), "sync is idempotent");
}

// ---------------------------------------------------------------------------
// 6. Teardown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn dropping_registry_stops_all_timers() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let keep_open = tx.clone();
    let mut reg = TimerRegistry::new(PERIOD, tx);
    reg.start(&rec("E1"));
    reg.start(&rec("E2"));

    drop(reg);
    sleep(PERIOD * 2).await;

    assert!(drain(&mut rx).is_empty());
    drop(keep_open);
}
