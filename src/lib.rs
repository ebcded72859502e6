//! # deadlock-demo
//!
//! A two-thread, two-lock deadlock you can watch happen.
//!
//! Worker A takes `lock1` and then wants `lock2`. Worker B takes `lock2` and then
//! wants `lock1`. Each worker pauses between its two acquisitions, so both end up
//! holding one lock and waiting forever on the other.
//!
//! ## Features
//!
//! - Tracked mutex that exposes its current holder
//! - Injected lock handles, so several demonstrations can run side by side
//! - Bounded waiting on the workers for tests (`DemoHandle::join_timeout`)
//! - Delay-based or barrier-based scheduling of the second acquisition
//! - Optional wait-for-graph instrument and JSON event log for observing the cycle
//!
//! ```no_run
//! use deadlock_demo::Demo;
//!
//! let handle = Demo::new().start()?;
//! // Never returns: both workers are stuck in a circular wait.
//! handle.join()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod core;
pub use core::{
    DEFAULT_DELAY, Demo, DemoHandle, DetectorBuilder, LockSlot, Mutex, MutexGuard, Scheduling,
    SharedLocks, WorkerName,
    detector::Detector,
    logger::{Progress, ProgressEntry},
    types::{DeadlockInfo, Events, LockId, LockState, Outcome, ThreadId, get_current_thread_id},
};

pub const BANNER: &str = "=== Deadlock Demonstration ===";
