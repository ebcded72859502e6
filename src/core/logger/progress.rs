use crate::core::types::{LockId, LockState, ThreadId, get_current_thread_id};
use parking_lot::Mutex;
use std::sync::Arc;

/// One human-readable progress line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    /// Thread that emitted the line
    pub thread_id: ThreadId,
    pub text: String,
    /// The lock this line is about and its state at the moment the line was logged
    pub lock: Option<(LockId, LockState)>,
}

/// Sink for the workers' progress lines
///
/// Cheap to clone; clones share the captured history.
#[derive(Debug, Clone)]
pub struct Progress {
    echo: bool,
    captured: Option<Arc<Mutex<Vec<ProgressEntry>>>>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Progress {
    /// Print every line to stdout, keep nothing
    pub fn stdout() -> Self {
        Progress {
            echo: true,
            captured: None,
        }
    }

    /// Keep every line in memory, print nothing
    pub fn capture() -> Self {
        Progress {
            echo: false,
            captured: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Print to stdout and keep a copy
    pub fn tee() -> Self {
        Progress {
            echo: true,
            ..Self::capture()
        }
    }

    pub fn line(&self, text: impl Into<String>) {
        self.record(text.into(), None);
    }

    /// Log a line about `lock`, snapshotting its state alongside
    pub fn lock_line(&self, text: impl Into<String>, lock: (LockId, LockState)) {
        self.record(text.into(), Some(lock));
    }

    fn record(&self, text: String, lock: Option<(LockId, LockState)>) {
        if self.echo {
            println!("{}", text);
        }
        if let Some(captured) = &self.captured {
            captured.lock().push(ProgressEntry {
                thread_id: get_current_thread_id(),
                text,
                lock,
            });
        }
    }

    /// Snapshot of the captured history, in logging order
    pub fn entries(&self) -> Vec<ProgressEntry> {
        self.captured
            .as_ref()
            .map(|c| c.lock().clone())
            .unwrap_or_default()
    }

    /// Just the text of the captured history
    pub fn lines(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.text).collect()
    }
}
