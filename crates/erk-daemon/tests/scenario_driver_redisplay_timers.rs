//! Scenario: Timed redisplay of acknowledged errors
//!
//! # Invariants under test
//!
//! 1. A viewed, still-reported error is redisplayed one period after
//!    acknowledgement, and its timer is released.
//! 2. A duplicate acknowledgement does not restart the timer.
//! 3. Re-acknowledging a redisplayed error starts a fresh timer.
//! 4. An error resolved before the period never comes back.
//! 5. The redisplay is applied to the state current at firing time.
//! 6. The configured period is honoured.

use std::time::Duration;

use erk_daemon::{spawn_driver, DriverConfig};
use erk_reconcile::{ErrorId, ErrorRecord};
use tokio::time::sleep;

fn rec(id: &str) -> ErrorRecord {
    ErrorRecord::new(id, format!("{id} failed"))
}

fn sorted_ids(records: &[ErrorRecord]) -> Vec<String> {
    let mut v: Vec<String> = records.iter().map(|r| r.error_id.0.clone()).collect();
    v.sort();
    v
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// ---------------------------------------------------------------------------
// 1. Redisplay after one period
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn acknowledged_error_is_redisplayed_after_period() {
    let driver = spawn_driver(vec![rec("E1")], DriverConfig::default());
    driver.acknowledge(rec("E1")).await.expect("ack");

    sleep(secs(59)).await;
    assert!(driver.errors_to_show().is_empty(), "too early");

    sleep(secs(2)).await;
    let view = driver.view();
    assert_eq!(sorted_ids(&view.to_show), vec!["E1"]);
    assert!(view.viewed.is_empty());
    assert!(view.active_timers.is_empty(), "redisplayed error releases its timer");
}

// ---------------------------------------------------------------------------
// 2. Duplicate acknowledge
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn duplicate_acknowledge_keeps_original_schedule() {
    let driver = spawn_driver(vec![rec("E1")], DriverConfig::default());
    driver.acknowledge(rec("E1")).await.expect("ack");

    sleep(secs(30)).await;
    driver.acknowledge(rec("E1")).await.expect("duplicate ack");
    assert_eq!(driver.active_timers(), vec![ErrorId::from("E1")]);

    // Still t=60, not t=90.
    sleep(secs(31)).await;
    assert_eq!(sorted_ids(&driver.errors_to_show()), vec!["E1"]);
}

// ---------------------------------------------------------------------------
// 3. Re-acknowledge after redisplay
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn reacknowledged_error_gets_a_fresh_timer() {
    let driver = spawn_driver(vec![rec("E1")], DriverConfig::default());
    driver.acknowledge(rec("E1")).await.expect("ack");
    sleep(secs(61)).await;
    assert_eq!(sorted_ids(&driver.errors_to_show()), vec!["E1"]);

    // t=61: acknowledge again; next redisplay due at t=121.
    driver.acknowledge(rec("E1")).await.expect("re-ack");
    assert_eq!(driver.active_timers(), vec![ErrorId::from("E1")]);

    sleep(secs(58)).await;
    assert!(driver.errors_to_show().is_empty());

    sleep(secs(3)).await;
    assert_eq!(sorted_ids(&driver.errors_to_show()), vec!["E1"]);
}

// ---------------------------------------------------------------------------
// 4. Resolution before the period
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn error_resolved_before_period_never_returns() {
    let driver = spawn_driver(vec![rec("E1")], DriverConfig::default());
    driver.acknowledge(rec("E1")).await.expect("ack");

    sleep(secs(59)).await;
    driver.ingest_snapshot(vec![]).await.expect("snapshot");
    assert!(driver.active_timers().is_empty());

    sleep(secs(300)).await;
    let view = driver.view();
    assert!(view.to_show.is_empty());
    assert!(view.viewed.is_empty());
}

// ---------------------------------------------------------------------------
// 5. Applied against current state
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn redisplay_merges_with_errors_that_appeared_meanwhile() {
    let driver = spawn_driver(vec![rec("E1")], DriverConfig::default());
    driver.acknowledge(rec("E1")).await.expect("ack");

    // New errors show up while E1 is suppressed.
    sleep(secs(20)).await;
    driver
        .ingest_snapshot(vec![rec("E1"), rec("E2"), rec("E3")])
        .await
        .expect("snapshot");
    assert_eq!(sorted_ids(&driver.errors_to_show()), vec!["E2", "E3"]);

    sleep(secs(41)).await;
    assert_eq!(sorted_ids(&driver.errors_to_show()), vec!["E1", "E2", "E3"]);
    assert!(driver.state().is_consistent());
}

// ---------------------------------------------------------------------------
// 6. Configured period
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn configured_period_is_used() {
    let config = DriverConfig {
        redisplay_period: secs(5),
    };
    let driver = spawn_driver(vec![rec("E1")], config);
    driver.acknowledge(rec("E1")).await.expect("ack");

    sleep(secs(6)).await;
    assert_eq!(sorted_ids(&driver.errors_to_show()), vec!["E1"]);
}
