use crate::core::detector::Detector;
use crate::core::locks::mutex::Mutex;
use crate::core::logger::Progress;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// One of the two locks shared by the workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockSlot {
    Lock1,
    Lock2,
}

impl LockSlot {
    pub fn label(self) -> &'static str {
        match self {
            LockSlot::Lock1 => "lock1",
            LockSlot::Lock2 => "lock2",
        }
    }
}

/// The two workers of the demonstration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkerName {
    /// Takes lock1, then lock2
    A,
    /// Takes lock2, then lock1
    B,
}

impl WorkerName {
    pub const ALL: [WorkerName; 2] = [WorkerName::A, WorkerName::B];

    /// Prefix used on every progress line of this worker
    pub fn label(self) -> &'static str {
        match self {
            WorkerName::A => "Thread 1",
            WorkerName::B => "Thread 2",
        }
    }

    pub fn first(self) -> LockSlot {
        match self {
            WorkerName::A => LockSlot::Lock1,
            WorkerName::B => LockSlot::Lock2,
        }
    }

    pub fn second(self) -> LockSlot {
        match self {
            WorkerName::A => LockSlot::Lock2,
            WorkerName::B => LockSlot::Lock1,
        }
    }
}

/// The pair of locks both workers contend on
///
/// Handles are reference counted, so a clone refers to the same two locks.
#[derive(Clone)]
pub struct SharedLocks {
    pub lock1: Arc<Mutex<()>>,
    pub lock2: Arc<Mutex<()>>,
}

impl Default for SharedLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedLocks {
    /// Two fresh, free, untracked locks
    pub fn new() -> Self {
        SharedLocks {
            lock1: Arc::new(Mutex::new(())),
            lock2: Arc::new(Mutex::new(())),
        }
    }

    /// Two fresh locks reporting to `detector`
    pub fn tracked(detector: &Detector) -> Self {
        SharedLocks {
            lock1: Arc::new(Mutex::tracked((), detector)),
            lock2: Arc::new(Mutex::tracked((), detector)),
        }
    }

    pub fn get(&self, slot: LockSlot) -> &Arc<Mutex<()>> {
        match slot {
            LockSlot::Lock1 => &self.lock1,
            LockSlot::Lock2 => &self.lock2,
        }
    }
}

/// What a worker does between its two acquisitions
#[derive(Clone)]
pub(crate) enum Pause {
    Sleep(Duration),
    /// Wait until the other worker holds its first lock too
    Rendezvous(Arc<Barrier>),
}

impl Pause {
    fn wait(&self) {
        match self {
            Pause::Sleep(delay) if delay.is_zero() => {}
            Pause::Sleep(delay) => thread::sleep(*delay),
            Pause::Rendezvous(barrier) => {
                barrier.wait();
            }
        }
    }
}

pub(crate) struct Worker {
    pub(crate) name: WorkerName,
    pub(crate) locks: SharedLocks,
    pub(crate) pause: Pause,
    pub(crate) progress: Progress,
}

impl Worker {
    /// Take the first lock, pause, take the second, release both
    ///
    /// Returns only if the other worker got out of the way; in the normal
    /// interleaving the second `lock()` never returns.
    pub(crate) fn run(&self) {
        let me = self.name.label();
        let (first_slot, second_slot) = (self.name.first(), self.name.second());
        let first = self.locks.get(first_slot);
        let second = self.locks.get(second_slot);

        self.progress.lock_line(
            format!("{me}: Attempting to acquire {}...", first_slot.label()),
            (first.id(), first.state()),
        );
        let first_guard = first.lock();
        self.progress.lock_line(
            format!("{me}: Acquired {}", first_slot.label()),
            (first.id(), first.state()),
        );

        self.pause.wait();

        self.progress.lock_line(
            format!("{me}: Attempting to acquire {}...", second_slot.label()),
            (second.id(), second.state()),
        );
        let second_guard = second.lock();
        self.progress.lock_line(
            format!("{me}: Acquired {}", second_slot.label()),
            (second.id(), second.state()),
        );

        self.progress
            .line(format!("{me}: In critical section with both locks"));

        // Reverse acquisition order.
        drop(second_guard);
        drop(first_guard);
        self.progress.line(format!("{me}: Released both locks"));
    }
}
