//! Per-error recurring redisplay timers.
//!
//! One tokio task per suppressed error. Each task ticks every `period` and
//! posts a [`TimerFired`] into the driver's queue; it never touches state
//! itself. The registry is owned by the driver task and is the only place
//! timers are created or cancelled.
//!
//! Every timer carries a token. A firing that was already queued when its
//! timer was cancelled (or replaced) no longer matches the registry and is
//! dropped by the driver.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use erk_reconcile::{ErrorId, ErrorRecord};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Posted by a timer task on every tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerFired {
    /// Record captured when the timer was started.
    pub error: ErrorRecord,
    pub token: u64,
}

/// Outcome of one [`TimerRegistry::sync`] pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerSync {
    pub started: Vec<ErrorId>,
    pub cancelled: Vec<ErrorId>,
}

impl TimerSync {
    pub fn is_noop(&self) -> bool {
        self.started.is_empty() && self.cancelled.is_empty()
    }
}

struct RedisplayTimer {
    token: u64,
    task: JoinHandle<()>,
}

impl Drop for RedisplayTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct TimerRegistry {
    period: Duration,
    timers: BTreeMap<ErrorId, RedisplayTimer>,
    next_token: u64,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
}

impl TimerRegistry {
    pub fn new(period: Duration, fired_tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            period,
            timers: BTreeMap::new(),
            next_token: 0,
            fired_tx,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start a recurring timer for `error`.
    ///
    /// Returns `false` (and leaves the running timer alone) if one already
    /// exists for this id. Must be called from within a tokio runtime.
    pub fn start(&mut self, error: &ErrorRecord) -> bool {
        if self.timers.contains_key(error.id()) {
            return false;
        }

        self.next_token += 1;
        let token = self.next_token;
        let period = self.period;
        let tx = self.fired_tx.clone();
        let captured = error.clone();
        // First tick one full period out; interval() would fire immediately.
        let first = Instant::now() + period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let fired = TimerFired {
                    error: captured.clone(),
                    token,
                };
                if tx.send(fired).is_err() {
                    // driver gone
                    break;
                }
            }
        });

        debug!(
            error_id = %error.id(),
            token,
            period_secs = period.as_secs(),
            "redisplay timer started"
        );
        self.timers
            .insert(error.id().clone(), RedisplayTimer { token, task });
        true
    }

    /// Stop and remove the timer for `id`. Idempotent.
    pub fn cancel(&mut self, id: &ErrorId) -> bool {
        match self.timers.remove(id) {
            Some(timer) => {
                debug!(error_id = %id, token = timer.token, "redisplay timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Stop every timer. Returns how many were running.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.timers.len();
        self.timers.clear();
        n
    }

    /// Make the registry hold exactly one timer per `eligible` error.
    ///
    /// Missing timers are started; timers for ids outside `eligible` are
    /// cancelled. Running timers for eligible ids are kept as-is.
    pub fn sync(&mut self, eligible: &[ErrorRecord]) -> TimerSync {
        let keep: BTreeSet<&ErrorId> = eligible.iter().map(|e| e.id()).collect();

        let stale: Vec<ErrorId> = self
            .timers
            .keys()
            .filter(|id| !keep.contains(id))
            .cloned()
            .collect();

        let mut out = TimerSync::default();
        for id in stale {
            if self.cancel(&id) {
                out.cancelled.push(id);
            }
        }
        for error in eligible {
            if self.start(error) {
                out.started.push(error.id().clone());
            }
        }
        out
    }

    /// True if `fired` came from the timer currently registered for its id.
    pub fn is_current(&self, fired: &TimerFired) -> bool {
        self.timers
            .get(fired.error.id())
            .map(|t| t.token == fired.token)
            .unwrap_or(false)
    }

    pub fn is_active(&self, id: &ErrorId) -> bool {
        self.timers.contains_key(id)
    }

    /// Ids with a running timer, sorted.
    pub fn active_ids(&self) -> Vec<ErrorId> {
        self.timers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
