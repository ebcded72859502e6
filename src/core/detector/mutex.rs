use super::{Detector, DetectorState};
use crate::core::types::{DeadlockInfo, Events, LockId, ThreadId};
use chrono::Utc;

impl DetectorState {
    /// Record an attempt and return the cycle it closes, if any
    fn attempt(&mut self, thread_id: ThreadId, lock_id: LockId) -> Option<DeadlockInfo> {
        let &owner = self.mutex_owners.get(&lock_id)?;
        if owner == thread_id {
            return None;
        }

        self.thread_waits_for.insert(thread_id, lock_id);
        let cycle = self.wait_for_graph.add_edge(thread_id, owner)?;

        let thread_waiting_for_locks = cycle
            .iter()
            .filter_map(|&t| self.thread_waits_for.get(&t).map(|&l| (t, l)))
            .collect();

        Some(DeadlockInfo {
            thread_cycle: cycle,
            thread_waiting_for_locks,
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    fn acquired(&mut self, thread_id: ThreadId, lock_id: LockId) {
        self.mutex_owners.insert(lock_id, thread_id);
        self.thread_waits_for.remove(&thread_id);
        self.wait_for_graph.clear_wait_edges(thread_id);
        self.thread_holds.entry(thread_id).or_default().insert(lock_id);
    }

    fn released(&mut self, thread_id: ThreadId, lock_id: LockId) {
        if self.mutex_owners.get(&lock_id) == Some(&thread_id) {
            self.mutex_owners.remove(&lock_id);
        }
        if let Some(holds) = self.thread_holds.get_mut(&thread_id) {
            holds.remove(&lock_id);
            if holds.is_empty() {
                self.thread_holds.remove(&thread_id);
            }
        }
        // Threads blocked on this lock no longer wait for this thread. Their edge
        // to the next owner is only added on their next attempt, so a cycle
        // through a handed-over lock goes unreported until then.
        for (&waiter, &wanted) in &self.thread_waits_for {
            if wanted == lock_id {
                self.wait_for_graph.remove_edge(waiter, thread_id);
            }
        }
    }

    fn destroyed(&mut self, lock_id: LockId) {
        self.mutex_owners.remove(&lock_id);
        self.thread_waits_for.retain(|_, l| *l != lock_id);
        for holds in self.thread_holds.values_mut() {
            holds.remove(&lock_id);
        }
        self.thread_holds.retain(|_, holds| !holds.is_empty());
    }
}

impl Detector {
    pub(crate) fn on_mutex_create(&self, lock_id: LockId, creator_id: ThreadId) {
        self.inner
            .logger
            .log_lock_event(lock_id, Some(creator_id), Events::Spawn);
    }

    pub(crate) fn on_mutex_destroy(&self, lock_id: LockId) {
        self.inner.state.lock().destroyed(lock_id);
        self.inner.logger.log_lock_event(lock_id, None, Events::Exit);
    }

    /// Called right before the thread blocks on the lock
    pub(crate) fn on_mutex_attempt(&self, thread_id: ThreadId, lock_id: LockId) {
        self.inner
            .logger
            .log_interaction_event(thread_id, lock_id, Events::Attempt);

        let found = self.inner.state.lock().attempt(thread_id, lock_id);
        // Dispatch outside the state lock.
        if let Some(info) = found {
            self.dispatch(info);
        }
    }

    pub(crate) fn on_mutex_acquired(&self, thread_id: ThreadId, lock_id: LockId) {
        self.inner
            .logger
            .log_interaction_event(thread_id, lock_id, Events::Acquired);
        self.inner.state.lock().acquired(thread_id, lock_id);
    }

    pub(crate) fn on_mutex_release(&self, thread_id: ThreadId, lock_id: LockId) {
        self.inner
            .logger
            .log_interaction_event(thread_id, lock_id, Events::Released);
        self.inner.state.lock().released(thread_id, lock_id);
    }
}
