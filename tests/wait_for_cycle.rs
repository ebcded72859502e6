use deadlock_demo::{Demo, Mutex, Progress, Scheduling, SharedLocks, WorkerName};
use std::sync::Arc;
use std::thread;
mod common;
use common::{
    DEADLOCK_TIMEOUT, NO_DEADLOCK_TIMEOUT, SHORT_DELAY, assert_no_deadlock, expect_deadlock,
    start_detector, thread_of,
};

#[test]
fn test_cycle_is_detected_once_both_first_locks_are_held() {
    let harness = start_detector();
    let locks = SharedLocks::tracked(&harness.detector);
    let progress = Progress::capture();

    let mut handle = Demo::new()
        .locks(locks.clone())
        .scheduling(Scheduling::Barrier)
        .progress(progress.clone())
        .start()
        .expect("Failed to start demo");

    let info = expect_deadlock(&harness, DEADLOCK_TIMEOUT);

    let a = thread_of(&progress, WorkerName::A);
    let b = thread_of(&progress, WorkerName::B);

    // A -> lock2 -> B -> lock1 -> A
    assert_eq!(info.thread_cycle.len(), 2);
    assert!(info.thread_cycle.contains(&a));
    assert!(info.thread_cycle.contains(&b));
    assert_eq!(info.thread_waiting_for_locks.len(), 2);
    assert_eq!(info.waiting_for(a), Some(locks.lock2.id()));
    assert_eq!(info.waiting_for(b), Some(locks.lock1.id()));

    assert_eq!(harness.detector.owner_of(locks.lock1.id()), Some(a));
    assert_eq!(harness.detector.owner_of(locks.lock2.id()), Some(b));
    assert_eq!(harness.detector.held_by(a), vec![locks.lock1.id()]);
    assert_eq!(harness.detector.held_by(b), vec![locks.lock2.id()]);

    // The first waiter's edge is stored; the edge that would close the cycle is not.
    assert_ne!(
        harness.detector.is_blocked_on(a, b),
        harness.detector.is_blocked_on(b, a)
    );
    assert_eq!(harness.detector.wait_edge_count(), 1);

    // Detection observes only; the workers stay stuck.
    assert!(handle.join_timeout(SHORT_DELAY).is_hung());
}

#[test]
fn test_delayed_run_is_detected_too() {
    let harness = start_detector();
    let locks = SharedLocks::tracked(&harness.detector);

    let mut handle = Demo::new()
        .locks(locks.clone())
        .scheduling(Scheduling::Delay(SHORT_DELAY))
        .progress(Progress::capture())
        .start()
        .expect("Failed to start demo");

    let info = expect_deadlock(&harness, DEADLOCK_TIMEOUT);
    assert_eq!(info.thread_cycle.len(), 2);
    assert!(handle.join_timeout(SHORT_DELAY).is_hung());
}

#[test]
fn test_same_order_locking_is_not_reported() {
    let harness = start_detector();
    let lock1 = Arc::new(Mutex::tracked((), &harness.detector));
    let lock2 = Arc::new(Mutex::tracked((), &harness.detector));

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let lock1 = Arc::clone(&lock1);
            let lock2 = Arc::clone(&lock2);
            thread::spawn(move || {
                for _ in 0..100 {
                    let _g1 = lock1.lock();
                    let _g2 = lock2.lock();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_no_deadlock(&harness, NO_DEADLOCK_TIMEOUT);
    assert_eq!(harness.detector.wait_edge_count(), 0);
    assert_eq!(harness.detector.owner_of(lock1.id()), None);
}
