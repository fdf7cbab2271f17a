//! Reconciliation driver: the single serialization point.
//!
//! ```text
//!   DriverHandle (Clone)          mpsc          Driver task
//!   ┌──────────────────────┐  ───────────▶  ┌─────────────────────────┐
//!   │ .ingest_snapshot()   │                │ ReconciliationState     │
//!   │ .acknowledge()       │  ◀───────────  │ latest snapshot         │
//!   │ .shutdown()          │    oneshot     │ TimerRegistry ──┐       │
//!   └──────────────────────┘                └────────▲────────┼───────┘
//!            ▲ watch (EngineView)                    │ TimerFired
//!            └───────────────────────────────────────┴─ timer tasks
//! ```
//!
//! Snapshots, acknowledgements and timer firings are applied one at a time by
//! the driver task, always against the state current at that moment. The
//! published [`EngineView`] is updated before a command is answered, so a
//! caller that awaited `ingest_snapshot`/`acknowledge` reads its own write.
//!
//! Dropping the last handle (or calling [`DriverHandle::shutdown`]) stops
//! the task and cancels every timer.

use std::time::Duration;

use erk_config::EngineConfig;
use erk_reconcile::{
    plan_reconcile, reduce, timer_eligible, uniq_by_id, validate_snapshot, ErrorAction, ErrorId,
    ErrorRecord, ReconciliationState, ValidationError,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::timers::{TimerFired, TimerRegistry};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverError {
    /// Input rejected at the boundary; never reached the driver task.
    Invalid(ValidationError),
    /// The driver task has stopped.
    Shutdown,
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "{e}"),
            Self::Shutdown => write!(f, "DRIVER_SHUTDOWN: reconciliation driver is not running"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(e) => Some(e),
            Self::Shutdown => None,
        }
    }
}

impl From<ValidationError> for DriverError {
    fn from(e: ValidationError) -> Self {
        Self::Invalid(e)
    }
}

// ---------------------------------------------------------------------------
// Config / views
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    pub redisplay_period: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for DriverConfig {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            redisplay_period: cfg.redisplay_period(),
        }
    }
}

/// Everything the presentation side may observe.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineView {
    pub to_show: Vec<ErrorRecord>,
    pub viewed: Vec<ErrorRecord>,
    /// Ids holding a redisplay timer, sorted.
    pub active_timers: Vec<ErrorId>,
}

/// Answer to a snapshot ingestion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub accepted: usize,
    pub rejected: Vec<ValidationError>,
}

// ---------------------------------------------------------------------------
// Commands (internal)
// ---------------------------------------------------------------------------

enum Command {
    Snapshot {
        errors: Vec<ErrorRecord>,
        reply: oneshot::Sender<()>,
    },
    Acknowledge {
        error: ErrorRecord,
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<EngineView>,
}

impl std::fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

impl DriverHandle {
    /// Current display set.
    pub fn errors_to_show(&self) -> Vec<ErrorRecord> {
        self.view.borrow().to_show.clone()
    }

    pub fn view(&self) -> EngineView {
        self.view.borrow().clone()
    }

    pub fn state(&self) -> ReconciliationState {
        let v = self.view.borrow();
        ReconciliationState {
            to_show: v.to_show.clone(),
            viewed: v.viewed.clone(),
        }
    }

    pub fn active_timers(&self) -> Vec<ErrorId> {
        self.view.borrow().active_timers.clone()
    }

    /// Change subscription; yields whenever the published view changes.
    pub fn subscribe(&self) -> watch::Receiver<EngineView> {
        self.view.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Feed a complete snapshot from the error source.
    ///
    /// Records without an `errorId` are dropped and reported; the rest are
    /// reconciled as the full current set (an empty set resolves everything).
    pub async fn ingest_snapshot(
        &self,
        errors: Vec<ErrorRecord>,
    ) -> Result<SnapshotReport, DriverError> {
        let intake = validate_snapshot(errors);
        for rejected in &intake.rejected {
            warn!(%rejected, "snapshot record rejected");
        }

        let report = SnapshotReport {
            accepted: intake.accepted.len(),
            rejected: intake.rejected,
        };
        self.request(|reply| Command::Snapshot {
            errors: intake.accepted,
            reply,
        })
        .await?;
        Ok(report)
    }

    /// User acknowledged `error`. Ids not currently displayed are tolerated.
    pub async fn acknowledge(&self, error: ErrorRecord) -> Result<(), DriverError> {
        if let Err(e) = error.validate() {
            warn!(rejected = %e, "acknowledge rejected");
            return Err(e.into());
        }
        self.request(|reply| Command::Acknowledge { error, reply })
            .await
    }

    /// Stop the driver and cancel all timers. Idempotent.
    pub async fn shutdown(&self) {
        if self.request(|reply| Command::Shutdown { reply }).await.is_err() {
            debug!("driver already stopped");
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }
}

// ---------------------------------------------------------------------------
// Spawn
// ---------------------------------------------------------------------------

/// Start a driver seeded with `initial` (the first snapshot).
///
/// The initial reconciliation completes before this returns, so the handle
/// already reflects it. Must be called from within a tokio runtime.
pub fn spawn_driver(initial: Vec<ErrorRecord>, config: DriverConfig) -> DriverHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (fired_tx, fired_rx) = mpsc::unbounded_channel();

    let intake = validate_snapshot(initial);
    for rejected in &intake.rejected {
        warn!(%rejected, "initial snapshot record rejected");
    }

    let (view_tx, view_rx) = watch::channel(EngineView::default());
    let mut driver = Driver {
        state: ReconciliationState::empty(),
        latest: Vec::new(),
        timers: TimerRegistry::new(config.redisplay_period, fired_tx),
        view: view_tx,
    };
    driver.on_snapshot(intake.accepted);

    info!(
        redisplay_period_secs = config.redisplay_period.as_secs(),
        to_show = driver.state.to_show.len(),
        "reconciliation driver started"
    );
    tokio::spawn(driver.run(cmd_rx, fired_rx));

    DriverHandle {
        tx: cmd_tx,
        view: view_rx,
    }
}

// ---------------------------------------------------------------------------
// Driver task
// ---------------------------------------------------------------------------

struct Driver {
    state: ReconciliationState,
    /// Most recent accepted snapshot, deduplicated.
    latest: Vec<ErrorRecord>,
    timers: TimerRegistry,
    view: watch::Sender<EngineView>,
}

impl Driver {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut fired_rx: mpsc::UnboundedReceiver<TimerFired>,
    ) {
        let mut stopped_reply = None;
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Snapshot { errors, reply }) => {
                        self.on_snapshot(errors);
                        let _ = reply.send(());
                    }
                    Some(Command::Acknowledge { error, reply }) => {
                        self.on_acknowledge(error);
                        let _ = reply.send(());
                    }
                    Some(Command::Shutdown { reply }) => {
                        // Handles observe the stop before the caller is answered.
                        cmd_rx.close();
                        stopped_reply = Some(reply);
                        break;
                    }
                    // last handle dropped
                    None => break,
                },
                Some(fired) = fired_rx.recv() => self.on_timer(fired),
            }
        }

        let cancelled = self.timers.cancel_all();
        self.publish();
        info!(cancelled, "reconciliation driver stopped");
        if let Some(reply) = stopped_reply {
            let _ = reply.send(());
        }
    }

    fn on_snapshot(&mut self, errors: Vec<ErrorRecord>) {
        let plan = plan_reconcile(&self.state, &errors);
        for action in plan.actions() {
            self.dispatch(action);
        }
        self.latest = uniq_by_id(errors);
        self.sync_timers();
        self.publish();
    }

    fn on_acknowledge(&mut self, error: ErrorRecord) {
        if self.state.is_viewed(error.id()) {
            debug!(error_id = %error.id(), "duplicate acknowledge");
        }
        self.dispatch(ErrorAction::acknowledge(error));
        self.sync_timers();
        self.publish();
    }

    fn on_timer(&mut self, fired: TimerFired) {
        if !self.timers.is_current(&fired) {
            warn!(error_id = %fired.error.id(), token = fired.token, "stale timer firing dropped");
            return;
        }
        info!(error_id = %fired.error.id(), "redisplaying acknowledged error");
        self.dispatch(ErrorAction::redisplay(fired.error));
        self.sync_timers();
        self.publish();
    }

    fn dispatch(&mut self, action: ErrorAction) {
        debug!(kind = action.kind(), n = action.payload().len(), "dispatch");
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    /// Timers for exactly the viewed errors still present in the latest snapshot.
    fn sync_timers(&mut self) {
        let eligible = timer_eligible(&self.state, &self.latest);
        let sync = self.timers.sync(&eligible);
        if !sync.is_noop() {
            debug!(started = ?sync.started, cancelled = ?sync.cancelled, "timers synced");
        }
    }

    fn publish(&self) {
        let next = EngineView {
            to_show: self.state.to_show.clone(),
            viewed: self.state.viewed.clone(),
            active_timers: self.timers.active_ids(),
        };
        self.view.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
