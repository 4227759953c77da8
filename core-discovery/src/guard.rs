//! Single-flight guard for sweeps.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SweepGuard {
    running: AtomicBool,
}

impl SweepGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a sweep already holds it.
    pub fn try_acquire(&self) -> Option<SweepPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SweepPermit { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Held for the duration of a sweep; releases the guard on drop.
#[derive(Debug)]
pub struct SweepPermit<'a> {
    guard: &'a SweepGuard,
}

impl Drop for SweepPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive_until_dropped() {
        let guard = SweepGuard::new();

        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }
}
