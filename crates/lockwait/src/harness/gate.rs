//! A one-shot latch between the two actors.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A one-shot gate: closed until [`Gate::open`] is called, open forever
/// after.
///
/// Clones share the same gate, so one clone can be handed to the signaling
/// thread and another to the waiting thread. Everything that happens before
/// `open` in the signaling thread happens-before a successful `wait` returns.
///
/// # Example
///
/// ```
/// use std::thread;
/// use std::time::Duration;
/// use lockwait::harness::Gate;
///
/// let gate = Gate::new();
/// let signal = gate.clone();
///
/// let handle = thread::spawn(move || signal.open());
/// assert!(gate.wait_timeout(Duration::from_secs(5)));
/// handle.join().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    /// Create a closed gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the mutex cannot leave the flag half-written.
    fn state(&self) -> MutexGuard<'_, bool> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the gate and wake every waiter. Opening twice is a no-op.
    pub fn open(&self) {
        let mut open = self.state();
        if !*open {
            *open = true;
            self.inner.1.notify_all();
        }
    }

    /// Returns `true` once the gate has been opened.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.state()
    }

    /// Block until the gate opens.
    pub fn wait(&self) {
        let mut open = self.state();
        while !*open {
            open = self.inner.1.wait(open).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the gate opens or `timeout` elapses.
    ///
    /// Returns `true` if the gate is open.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut open = self.state();
        while !*open {
            let remaining = match deadline {
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => remaining,
                    _ => return false,
                },
                None => timeout,
            };
            open = self
                .inner
                .1
                .wait_timeout(open, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_starts_closed() {
        let gate = Gate::new();
        assert!(!gate.is_open());
        assert!(!gate.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_open_is_idempotent() {
        let gate = Gate::new();
        gate.open();
        gate.open();
        assert!(gate.is_open());
        gate.wait();
        assert!(gate.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn test_clone_shares_state() {
        let gate = Gate::new();
        let other = gate.clone();
        other.open();
        assert!(gate.is_open());
    }

    #[test]
    fn test_wakes_waiter_in_another_thread() {
        let gate = Gate::new();
        let waiter = gate.clone();

        let handle = thread::spawn(move || {
            waiter.wait();
            waiter.is_open()
        });

        thread::sleep(Duration::from_millis(20));
        gate.open();
        assert!(handle.join().unwrap());
    }
}
