// Core types
pub mod types;

// Progress lines and the JSON event log
pub mod logger;

// Wait-for graph
pub mod graph;

// Deadlock instrument
pub mod detector;
pub use detector::DetectorBuilder;

// Tracked mutex
pub mod locks;
pub use locks::mutex::{Mutex, MutexGuard};

// The two workers and their locks
pub mod worker;
pub use worker::{LockSlot, SharedLocks, WorkerName};

use crate::core::logger::Progress;
use crate::core::types::Outcome;
use crate::core::worker::{Pause, Worker};
use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, unbounded};
use std::sync::{Arc, Barrier};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Pause used by the binary between a worker's two acquisitions
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// How the workers line up before their second acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduling {
    /// Each worker sleeps this long while holding its first lock
    ///
    /// Makes the circular wait overwhelmingly likely, not certain.
    Delay(Duration),
    /// Each worker waits until the other holds its first lock
    ///
    /// Makes the circular wait certain.
    Barrier,
}

impl Default for Scheduling {
    fn default() -> Self {
        Scheduling::Delay(DEFAULT_DELAY)
    }
}

/// Configuration for one run of the demonstration
///
/// By default:
/// - Two fresh untracked locks
/// - One second of delay between acquisitions
/// - Progress lines go to stdout
#[derive(Default)]
pub struct Demo {
    locks: Option<SharedLocks>,
    scheduling: Scheduling,
    progress: Progress,
}

impl Demo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run against these locks instead of a fresh pair
    pub fn locks(mut self, locks: SharedLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn scheduling(mut self, scheduling: Scheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    pub fn progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Spawn both workers and hand back a handle to them
    ///
    /// # Errors
    /// Returns an error if a worker thread cannot be spawned
    pub fn start(self) -> Result<DemoHandle> {
        let locks = self.locks.unwrap_or_default();
        let pause = match self.scheduling {
            Scheduling::Delay(delay) => Pause::Sleep(delay),
            Scheduling::Barrier => {
                Pause::Rendezvous(Arc::new(Barrier::new(WorkerName::ALL.len())))
            }
        };

        let (done_tx, done_rx) = unbounded();
        let mut workers = Vec::with_capacity(WorkerName::ALL.len());

        for name in WorkerName::ALL {
            let worker = Worker {
                name,
                locks: locks.clone(),
                pause: pause.clone(),
                progress: self.progress.clone(),
            };
            let done = done_tx.clone();

            let handle = std::thread::Builder::new()
                .name(name.label().to_string())
                .spawn(move || {
                    worker.run();
                    let _ = done.send(name);
                })
                .with_context(|| format!("Failed to spawn {}", name.label()))?;
            workers.push((name, handle));
        }

        Ok(DemoHandle {
            locks,
            workers,
            done: done_rx,
            finished: Vec::new(),
        })
    }
}

/// The two running workers
pub struct DemoHandle {
    locks: SharedLocks,
    workers: Vec<(WorkerName, JoinHandle<()>)>,
    done: Receiver<WorkerName>,
    finished: Vec<WorkerName>,
}

impl DemoHandle {
    /// The locks the workers contend on
    pub fn locks(&self) -> &SharedLocks {
        &self.locks
    }

    /// Wait for both workers without bound
    ///
    /// Under normal scheduling this never returns: both workers sit in a
    /// circular wait until the process is killed.
    ///
    /// # Errors
    /// Returns an error if a worker panicked
    pub fn join(self) -> Result<()> {
        for (name, handle) in self.workers {
            handle
                .join()
                .map_err(|_| anyhow!("{} panicked", name.label()))?;
        }
        Ok(())
    }

    /// Wait for both workers, giving up after `timeout`
    ///
    /// Can be called repeatedly; workers seen finishing earlier are remembered.
    /// A timeout too large to express as a deadline waits without bound.
    pub fn join_timeout(&mut self, timeout: Duration) -> Outcome {
        let deadline = Instant::now().checked_add(timeout);
        while self.finished.len() < self.workers.len() {
            let received = match deadline {
                Some(deadline) => self.done.recv_deadline(deadline).ok(),
                None => self.done.recv().ok(),
            };
            match received {
                Some(name) => self.finished.push(name),
                None => break,
            }
        }

        if self.finished.len() == self.workers.len() {
            Outcome::Completed
        } else {
            let mut finished = self.finished.clone();
            finished.sort();
            Outcome::Hung { finished }
        }
    }

    /// Whether `name` panicked; `false` while it is still running
    pub fn panicked(&mut self, name: WorkerName) -> bool {
        let exited = self
            .workers
            .iter()
            .find(|(n, _)| *n == name)
            .is_some_and(|(_, handle)| handle.is_finished());
        // A clean worker sends its notice before it exits, so drain only after
        // reading the exit.
        self.finished.extend(self.done.try_iter());
        exited && !self.finished.contains(&name)
    }
}
