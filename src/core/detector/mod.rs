//! Wait-for-graph instrument
//!
//! The detector watches tracked locks and reports a circular wait the moment a
//! lock attempt closes a cycle. It only observes: the threads involved stay
//! blocked exactly as they would without it.

mod mutex;

use crate::core::graph::WaitForGraph;
use crate::core::logger::EventLogger;
use crate::core::types::{DeadlockInfo, LockId, ThreadId};
use anyhow::{Context, Result};
use crossbeam_channel::{Sender, unbounded};
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

type Callback = Box<dyn Fn(DeadlockInfo) + Send + 'static>;

/// Builder for a [`Detector`]
///
/// By default:
/// - Event logging is disabled
/// - The callback prints the deadlock report to stderr
pub struct DetectorBuilder {
    log_path: Option<PathBuf>,
    callback: Callback,
}

impl Default for DetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBuilder {
    pub fn new() -> Self {
        DetectorBuilder {
            log_path: None,
            callback: Box::new(|info: DeadlockInfo| {
                eprintln!(
                    "Deadlock detected: {}",
                    serde_json::to_string_pretty(&info).unwrap_or_else(|_| format!("{:?}", info))
                );
            }),
        }
    }

    /// Write every lock event as a JSON line to `path`
    ///
    /// If the path contains "{timestamp}", it is replaced with the current time.
    pub fn with_log<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Set the function invoked when a circular wait is found
    ///
    /// The callback runs on a dedicated dispatcher thread, so it still fires
    /// while the threads in the cycle are blocked.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(DeadlockInfo) + Send + 'static,
    {
        self.callback = Box::new(callback);
        self
    }

    /// Open the event log (if any) and start the dispatcher thread
    ///
    /// # Errors
    /// Returns an error if the log file cannot be opened or the dispatcher
    /// thread cannot be spawned
    pub fn start(self) -> Result<Detector> {
        let logger = match &self.log_path {
            Some(path) => EventLogger::with_file(path).context("Failed to initialize logger")?,
            None => EventLogger::new(),
        };

        let (sender, receiver) = unbounded::<DeadlockInfo>();
        let callback = self.callback;
        std::thread::Builder::new()
            .name("deadlock-dispatcher".into())
            .spawn(move || {
                // Ends once every Detector clone is gone.
                while let Ok(info) = receiver.recv() {
                    callback(info);
                }
            })
            .context("Failed to spawn deadlock dispatcher")?;

        Ok(Detector {
            inner: Arc::new(Inner {
                state: Mutex::new(DetectorState::default()),
                logger,
                dispatcher: sender,
            }),
        })
    }
}

/// Shared handle to one detector instance
#[derive(Clone)]
pub struct Detector {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<DetectorState>,
    logger: EventLogger,
    dispatcher: Sender<DeadlockInfo>,
}

/// Thread-lock relationships seen so far
#[derive(Default)]
struct DetectorState {
    wait_for_graph: WaitForGraph,
    /// thread -> lock it is blocked on
    thread_waits_for: FxHashMap<ThreadId, LockId>,
    /// thread -> locks it holds
    thread_holds: FxHashMap<ThreadId, FxHashSet<LockId>>,
    /// lock -> holder
    mutex_owners: FxHashMap<LockId, ThreadId>,
}

impl Detector {
    /// Holder of `lock_id` as far as the detector knows
    pub fn owner_of(&self, lock_id: LockId) -> Option<ThreadId> {
        self.inner.state.lock().mutex_owners.get(&lock_id).copied()
    }

    /// Lock that `thread_id` is currently blocked on
    pub fn waiting_for(&self, thread_id: ThreadId) -> Option<LockId> {
        self.inner.state.lock().thread_waits_for.get(&thread_id).copied()
    }

    /// Locks currently held by `thread_id`, sorted
    pub fn held_by(&self, thread_id: ThreadId) -> Vec<LockId> {
        let state = self.inner.state.lock();
        let mut held: Vec<LockId> = state
            .thread_holds
            .get(&thread_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        held.sort_unstable();
        held
    }

    /// Whether `waiter` is recorded as blocked on a lock `holder` owns
    pub fn is_blocked_on(&self, waiter: ThreadId, holder: ThreadId) -> bool {
        self.inner.state.lock().wait_for_graph.has_edge(waiter, holder)
    }

    /// Number of live wait-for edges
    pub fn wait_edge_count(&self) -> usize {
        self.inner.state.lock().wait_for_graph.edge_count()
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.inner.logger.is_enabled()
    }

    fn dispatch(&self, info: DeadlockInfo) {
        // The receiver only disappears if the callback panicked.
        let _ = self.inner.dispatcher.send(info);
    }
}
