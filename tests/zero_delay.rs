use deadlock_demo::{Demo, LockState, Outcome, Progress, Scheduling, WorkerName};
use rand::Rng;
use std::time::Duration;
mod common;
use common::{NO_DEADLOCK_TIMEOUT, lines_of};

/// With no delay either outcome is fine, but each must be a clean one.
fn run_once(delay: Duration) -> bool {
    let progress = Progress::capture();
    let mut handle = Demo::new()
        .scheduling(Scheduling::Delay(delay))
        .progress(progress.clone())
        .start()
        .expect("Failed to start demo");

    match handle.join_timeout(NO_DEADLOCK_TIMEOUT) {
        Outcome::Completed => {
            let locks = handle.locks().clone();
            handle.join().expect("no worker should panic");

            for worker in WorkerName::ALL {
                let lines = lines_of(&progress, worker);
                assert_eq!(lines.len(), 6, "{} lines: {lines:?}", worker.label());
                assert_eq!(
                    lines.last().map(String::as_str),
                    Some(format!("{}: Released both locks", worker.label()).as_str())
                );
            }
            assert_eq!(locks.lock1.state(), LockState::Free);
            assert_eq!(locks.lock2.state(), LockState::Free);
            false
        }
        Outcome::Hung { finished } => {
            // A single finisher would have released both locks for the other.
            assert!(finished.is_empty(), "partial finish: {finished:?}");
            assert!(!handle.panicked(WorkerName::A));
            assert!(!handle.panicked(WorkerName::B));
            for worker in WorkerName::ALL {
                let lines = lines_of(&progress, worker);
                assert!(!lines.iter().any(|l| l.contains("critical section")));
            }
            true
        }
    }
}

#[test]
fn test_zero_delay_ends_cleanly_either_way() {
    for _ in 0..10 {
        run_once(Duration::ZERO);
    }
}

#[test]
fn test_tiny_random_delays_end_cleanly_either_way() {
    let mut rng = rand::rng();
    let hung = (0..10)
        .filter(|_| run_once(Duration::from_micros(rng.random_range(0..2_000))))
        .count();
    println!("{hung}/10 runs deadlocked");
}
