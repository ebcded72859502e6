use deadlock_demo::{DeadlockInfo, Detector, DetectorBuilder, Progress, ThreadId, WorkerName};
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex, mpsc};
use std::time::Duration;

/// How long a run must stay stuck before we call it deadlocked
#[allow(dead_code)]
pub const HANG_TIMEOUT: Duration = Duration::from_secs(3);
#[allow(dead_code)]
pub const DEADLOCK_TIMEOUT: Duration = Duration::from_secs(3);
#[allow(dead_code)]
pub const NO_DEADLOCK_TIMEOUT: Duration = Duration::from_millis(500);
/// Delay short enough for tests, long enough to line the workers up
#[allow(dead_code)]
pub const SHORT_DELAY: Duration = Duration::from_millis(100);

#[allow(dead_code)]
pub struct DetectorHarness {
    pub detector: Detector,
    pub rx: mpsc::Receiver<DeadlockInfo>,
    pub detected: Arc<StdMutex<bool>>,
}

#[allow(dead_code)]
pub fn start_detector() -> DetectorHarness {
    build_detector(DetectorBuilder::new())
}

#[allow(dead_code)]
pub fn start_detector_with_log(path: &Path) -> DetectorHarness {
    build_detector(DetectorBuilder::new().with_log(path))
}

#[allow(dead_code)]
fn build_detector(builder: DetectorBuilder) -> DetectorHarness {
    let (tx, rx) = mpsc::channel::<DeadlockInfo>();
    let detected = Arc::new(StdMutex::new(false));
    let flag = Arc::clone(&detected);

    let detector = builder
        .callback(move |info| {
            *flag.lock().unwrap() = true;
            let _ = tx.send(info);
        })
        .start()
        .expect("Failed to initialize detector");

    DetectorHarness {
        detector,
        rx,
        detected,
    }
}

#[allow(dead_code)]
pub fn expect_deadlock(h: &DetectorHarness, timeout: Duration) -> DeadlockInfo {
    match h.rx.recv_timeout(timeout) {
        Ok(info) => {
            assert!(*h.detected.lock().unwrap(), "Deadlock flag should be set");
            info
        }
        Err(_) => panic!("No deadlock detected within {timeout:?}"),
    }
}

#[allow(dead_code)]
pub fn assert_no_deadlock(h: &DetectorHarness, timeout: Duration) {
    assert!(
        h.rx.recv_timeout(timeout).is_err(),
        "Unexpected deadlock detected"
    );
    assert!(
        !*h.detected.lock().unwrap(),
        "Deadlock flag should not be set"
    );
}

/// Thread id of `worker`, taken from its first captured progress line
#[allow(dead_code)]
pub fn thread_of(progress: &Progress, worker: WorkerName) -> ThreadId {
    progress
        .entries()
        .iter()
        .find(|e| e.text.starts_with(worker.label()))
        .map(|e| e.thread_id)
        .unwrap_or_else(|| panic!("{} logged nothing", worker.label()))
}

/// Captured lines of `worker`, in order
#[allow(dead_code)]
pub fn lines_of(progress: &Progress, worker: WorkerName) -> Vec<String> {
    progress
        .lines()
        .into_iter()
        .filter(|line| line.starts_with(worker.label()))
        .collect()
}
