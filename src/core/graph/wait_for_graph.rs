//! Wait-for graph over threads
//!
//! An edge `A -> B` means thread A is blocked on a lock that thread B holds. A
//! circular wait is exactly a cycle in this graph, so before inserting `A -> B`
//! the graph looks for an existing path `B -> ... -> A`.
//!
//! Incoming edges are mirrored in a reverse map so that clearing a thread's
//! edges touches only its neighbours.

use crate::core::types::ThreadId;
use fxhash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

#[derive(Default)]
pub struct WaitForGraph {
    /// waiter -> threads it waits for
    edges: FxHashMap<ThreadId, FxHashSet<ThreadId>>,
    /// holder -> threads waiting for it
    incoming_edges: FxHashMap<ThreadId, FxHashSet<ThreadId>>,
}

impl WaitForGraph {
    /// Record that `from` waits for `to`
    ///
    /// # Returns
    /// * `Some(cycle)` - the threads of the cycle this edge would close, starting
    ///   at `to` and ending at `from`; the edge is not inserted
    /// * `None` - the edge was recorded and no cycle exists
    pub fn add_edge(&mut self, from: ThreadId, to: ThreadId) -> Option<Vec<ThreadId>> {
        if self.edges.get(&from).is_some_and(|targets| targets.contains(&to)) {
            return None;
        }

        if let Some(path) = self.find_path(to, from) {
            return Some(path);
        }

        self.edges.entry(from).or_default().insert(to);
        self.incoming_edges.entry(to).or_default().insert(from);
        None
    }

    /// Drop everything `thread_id` was waiting for
    ///
    /// Called once the thread gets its lock.
    pub fn clear_wait_edges(&mut self, thread_id: ThreadId) {
        let Some(targets) = self.edges.remove(&thread_id) else {
            return;
        };
        for target in targets {
            if let Some(waiters) = self.incoming_edges.get_mut(&target) {
                waiters.remove(&thread_id);
                if waiters.is_empty() {
                    self.incoming_edges.remove(&target);
                }
            }
        }
    }

    /// Remove the single edge `from -> to`, if present
    pub fn remove_edge(&mut self, from: ThreadId, to: ThreadId) {
        let Some(targets) = self.edges.get_mut(&from) else {
            return;
        };
        if !targets.remove(&to) {
            return;
        }
        if targets.is_empty() {
            self.edges.remove(&from);
        }
        if let Some(waiters) = self.incoming_edges.get_mut(&to) {
            waiters.remove(&from);
            if waiters.is_empty() {
                self.incoming_edges.remove(&to);
            }
        }
    }

    /// Whether `from` is currently recorded as waiting for `to`
    pub fn has_edge(&self, from: ThreadId, to: ThreadId) -> bool {
        self.edges.get(&from).is_some_and(|targets| targets.contains(&to))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(FxHashSet::len).sum()
    }

    // BFS, so the reported cycle is the shortest one.
    fn find_path(&self, start: ThreadId, target: ThreadId) -> Option<Vec<ThreadId>> {
        if start == target {
            return Some(vec![start]);
        }

        let mut queue = VecDeque::from([start]);
        let mut parent: FxHashMap<ThreadId, ThreadId> = FxHashMap::default();
        let mut visited: FxHashSet<ThreadId> = FxHashSet::default();
        visited.insert(start);

        while let Some(current) = queue.pop_front() {
            if current == target {
                let mut path = vec![target];
                let mut cursor = target;
                while let Some(&p) = parent.get(&cursor) {
                    path.push(p);
                    cursor = p;
                }
                path.reverse();
                return Some(path);
            }

            for &next in self.edges.get(&current).into_iter().flatten() {
                if visited.insert(next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        None
    }
}
