//! erk-daemon library target.
//!
//! Runtime half of the error reconciliation kit: the per-error redisplay
//! timers, the driver task that serializes every mutation, and the HTTP/SSE
//! surface. The binary `main.rs` depends on this library target.

pub mod addr;
pub mod api_types;
pub mod driver;
pub mod routes;
pub mod state;
pub mod timers;

pub use driver::{
    spawn_driver, DriverConfig, DriverError, DriverHandle, EngineView, SnapshotReport,
};
pub use timers::{TimerFired, TimerRegistry, TimerSync};
