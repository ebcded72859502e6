//! Logging for the demonstration
//!
//! Two outputs: the progress lines printed by the workers, and an optional JSON
//! event log of every lock interaction written by the detector.

mod event_logger;
mod progress;

pub use event_logger::{EventLogger, LogEntry, LoggerMode};
pub use progress::{Progress, ProgressEntry};
