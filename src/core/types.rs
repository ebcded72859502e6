use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Thread identifier type
///
/// Uniquely identifies a thread in the process. Zero is never handed out, which
/// lets a lock use it as its "no holder" marker.
pub type ThreadId = usize;

// Global counter for assigning unique thread IDs
static THREAD_ID_COUNTER: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static THREAD_ID: ThreadId = THREAD_ID_COUNTER.fetch_add(1, Ordering::SeqCst);
}

/// Get a unique identifier of the current thread
/// This will always return the same ID for the lifetime of the thread
pub fn get_current_thread_id() -> ThreadId {
    THREAD_ID.with(|&id| id)
}

/// Lock identifier type
///
/// Each [`Mutex`](crate::Mutex) is assigned a unique ID when created.
pub type LockId = usize;

/// Observable state of a single lock
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LockState {
    /// Nobody holds the lock
    Free,
    /// The lock is held by exactly one thread
    HeldBy(ThreadId),
}

/// Lock lifecycle and thread-lock interaction events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Events {
    /// A lock was created
    Spawn,
    /// A lock was dropped
    Exit,
    /// Thread is attempting to acquire a lock
    Attempt,
    /// Thread successfully acquired a lock
    Acquired,
    /// Thread released a lock
    Released,
}

/// How a bounded wait on the demonstration ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Both workers ran their critical section and released their locks
    Completed,
    /// The timeout elapsed first; `finished` lists the workers that did complete
    Hung { finished: Vec<crate::WorkerName> },
}

impl Outcome {
    pub fn is_hung(&self) -> bool {
        matches!(self, Outcome::Hung { .. })
    }
}

/// A circular wait observed by the wait-for-graph instrument
///
/// `thread_cycle` is the ordered list of threads forming the cycle: for two
/// threads that wait on each other it is `[t1, t2]`. Each entry of
/// `thread_waiting_for_locks` is `(thread_id, lock_id)` for a thread in the cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlockInfo {
    pub thread_cycle: Vec<ThreadId>,
    pub thread_waiting_for_locks: Vec<(ThreadId, LockId)>,
    /// RFC 3339 timestamp of the detection
    pub timestamp: String,
}

impl DeadlockInfo {
    /// The lock `thread_id` is blocked on, if it is part of this cycle
    pub fn waiting_for(&self, thread_id: ThreadId) -> Option<LockId> {
        self.thread_waiting_for_locks
            .iter()
            .find(|&&(t, _)| t == thread_id)
            .map(|&(_, l)| l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_thread_id_consistency() {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let id1 = get_current_thread_id();
            let id2 = get_current_thread_id();
            assert_eq!(id1, id2);
            tx.send(id1).unwrap();
        });

        let thread_id = rx.recv().unwrap();
        handle.join().unwrap();
        assert_ne!(thread_id, 0);
    }

    #[test]
    fn test_thread_id_uniqueness() {
        let (tx, rx) = mpsc::channel();

        let mut handles = vec![];
        for _ in 0..10 {
            let tx = tx.clone();
            handles.push(thread::spawn(move || {
                tx.send(get_current_thread_id()).unwrap();
            }));
        }

        let mut ids: Vec<_> = (0..10).map(|_| rx.recv().unwrap()).collect();
        for handle in handles {
            handle.join().unwrap();
        }

        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_waiting_for_lookup() {
        let info = DeadlockInfo {
            thread_cycle: vec![3, 4],
            thread_waiting_for_locks: vec![(3, 11), (4, 10)],
            timestamp: String::new(),
        };
        assert_eq!(info.waiting_for(3), Some(11));
        assert_eq!(info.waiting_for(4), Some(10));
        assert_eq!(info.waiting_for(5), None);
    }
}
