use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

/// A value shared between an issuing thread and a network thread, with
/// blocking waits on its changes.
///
/// Every write wakes all waiters; waits are condition waits, never polls.
pub struct Monitor<T> {
    value: Mutex<T>,
    changed: Condvar,
}

impl<T: Copy + PartialEq> Monitor<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        // a panicking writer cannot leave a Copy value half-written
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> T {
        *self.lock()
    }

    pub fn set(&self, value: T) {
        let mut guard = self.lock();
        *guard = value;
        drop(guard);
        self.changed.notify_all();
    }

    /// Replaces the value only if it currently equals `expected`, returning
    /// the value that was found otherwise
    pub fn compare_and_set(&self, expected: T, value: T) -> Result<(), T> {
        let mut guard = self.lock();
        if *guard != expected {
            return Err(*guard);
        }
        *guard = value;
        drop(guard);
        self.changed.notify_all();
        Ok(())
    }

    /// Blocks until the value differs from `value`, returns the new value
    pub fn wait_ne(&self, value: T) -> T {
        self.wait_until(|current| *current != value)
    }

    /// Like `wait_ne`, giving up after `timeout`
    pub fn wait_ne_timeout(&self, value: T, timeout: Duration) -> Option<T> {
        self.wait_until_timeout(|current| *current != value, timeout)
    }

    pub fn wait_until<F: FnMut(&T) -> bool>(&self, mut condition: F) -> T {
        let guard = self.lock();
        let guard = self
            .changed
            .wait_while(guard, |current| !condition(current))
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    pub fn wait_until_timeout<F: FnMut(&T) -> bool>(
        &self,
        mut condition: F,
        timeout: Duration,
    ) -> Option<T> {
        let guard = self.lock();
        let (guard, result) = self
            .changed
            .wait_timeout_while(guard, timeout, |current| !condition(current))
            .unwrap_or_else(PoisonError::into_inner);
        if result.timed_out() {
            return None;
        }
        Some(*guard)
    }
}

impl<T: Copy + Ord> Monitor<T> {
    /// Raises the value to `value` if it is larger, returns whether it moved.
    /// The stored value never decreases through this call.
    pub fn set_max(&self, value: T) -> bool {
        let mut guard = self.lock();
        if value <= *guard {
            return false;
        }
        *guard = value;
        drop(guard);
        self.changed.notify_all();
        true
    }

    pub fn wait_ge(&self, value: T) -> T {
        self.wait_until(|current| *current >= value)
    }

    pub fn wait_ge_timeout(&self, value: T, timeout: Duration) -> Option<T> {
        self.wait_until_timeout(|current| *current >= value, timeout)
    }
}

impl<T: Copy + PartialEq + Default> Default for Monitor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::Monitor;

    #[test]
    fn wait_ne_wakes_on_change() {
        let monitor = Arc::new(Monitor::new(0u32));
        let writer = monitor.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.set(3);
        });

        assert_eq!(monitor.wait_ne(0), 3);
        handle.join().unwrap();
    }

    #[test]
    fn wait_ne_returns_immediately_when_already_different() {
        let monitor = Monitor::new(5u32);
        assert_eq!(monitor.wait_ne(4), 5);
    }

    #[test]
    fn wait_timeout_gives_up() {
        let monitor = Monitor::new(1u32);
        assert_eq!(monitor.wait_ne_timeout(1, Duration::from_millis(10)), None);
    }

    #[test]
    fn set_max_never_decreases() {
        let monitor = Monitor::new(10u32);
        assert!(!monitor.set_max(7));
        assert_eq!(monitor.get(), 10);
        assert!(monitor.set_max(12));
        assert_eq!(monitor.get(), 12);
    }

    #[test]
    fn compare_and_set_reports_current_value() {
        let monitor = Monitor::new(1u32);
        assert_eq!(monitor.compare_and_set(2, 3), Err(1));
        assert_eq!(monitor.compare_and_set(1, 3), Ok(()));
        assert_eq!(monitor.get(), 3);
    }
}
