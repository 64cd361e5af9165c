//! Cross-thread tests for the one-shot gate.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use lockwait::harness::Gate;

#[test]
fn test_open_releases_every_waiter() {
    let gate = Gate::new();
    let barrier = Arc::new(Barrier::new(5));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                gate.wait_timeout(Duration::from_secs(5))
            })
        })
        .collect();

    barrier.wait();
    gate.open();

    for handle in handles {
        assert!(handle.join().expect("waiter panicked"));
    }
}

#[test]
fn test_wait_timeout_expires() {
    let gate = Gate::new();
    let started = Instant::now();

    assert!(!gate.wait_timeout(Duration::from_millis(50)));
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(!gate.is_open());
}

#[test]
fn test_open_before_wait() {
    let gate = Gate::new();
    gate.open();

    let waiter = gate.clone();
    let handle = thread::spawn(move || waiter.wait_timeout(Duration::from_millis(10)));
    assert!(handle.join().expect("waiter panicked"));
}
