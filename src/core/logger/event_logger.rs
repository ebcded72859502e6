use crate::core::types::{Events, LockId, ThreadId};
use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Structure for a single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Thread that performed the action, `None` for lock lifecycle events
    pub thread_id: Option<ThreadId>,
    /// Lock that was involved
    pub lock_id: LockId,
    /// Type of event that occurred
    pub event: Events,
    /// Seconds since the Unix epoch with microsecond precision
    pub timestamp: f64,
}

/// Determines how the logger should operate
#[derive(Debug)]
pub enum LoggerMode {
    /// Logging is disabled entirely
    Disabled,
    /// Append JSON lines to the specified file
    ///
    /// The lock keeps each line whole when several threads log at once.
    ToFile(Mutex<File>),
}

/// Logger for recording lock events as JSON lines
#[derive(Debug)]
pub struct EventLogger {
    mode: LoggerMode,
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLogger {
    /// Create a new logger with logging disabled
    pub fn new() -> Self {
        EventLogger {
            mode: LoggerMode::Disabled,
        }
    }

    /// Create a new logger that writes to the specified file
    ///
    /// A `{timestamp}` placeholder in the path is replaced with the current time.
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_timestamp(path.as_ref());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path))?;

        Ok(EventLogger {
            mode: LoggerMode::ToFile(Mutex::new(file)),
        })
    }

    pub fn log_interaction_event(&self, thread_id: ThreadId, lock_id: LockId, event: Events) {
        self.log_event(Some(thread_id), lock_id, event);
    }

    pub fn log_lock_event(&self, lock_id: LockId, creator: Option<ThreadId>, event: Events) {
        self.log_event(creator, lock_id, event);
    }

    fn log_event(&self, thread_id: Option<ThreadId>, lock_id: LockId, event: Events) {
        let LoggerMode::ToFile(ref file) = self.mode else {
            return;
        };

        let now = Utc::now();
        let entry = LogEntry {
            thread_id,
            lock_id,
            event,
            timestamp: now.timestamp() as f64 + now.timestamp_subsec_micros() as f64 / 1_000_000.0,
        };

        // A failed write must never disturb the threads being observed.
        if let Ok(mut line) = serde_json::to_string(&entry) {
            line.push('\n');
            let mut file = file.lock();
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        !matches!(self.mode, LoggerMode::Disabled)
    }
}

fn expand_timestamp(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if raw.contains("{timestamp}") {
        raw.replace(
            "{timestamp}",
            &Utc::now().format("%Y%m%d_%H%M%S").to_string(),
        )
    } else {
        raw.into_owned()
    }
}
