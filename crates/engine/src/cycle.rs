//! Whole-cycle serialization: exactly one sync cycle may be in flight per
//! process. A cycle triggered while one is running is skipped, not queued.

use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;

/// Atomic Idle/Running state token owned by the orchestrator and exposed to
/// the trigger mechanism through a single compare-and-set.
#[derive(Debug, Default)]
pub struct CycleGate {
    state: AtomicU8,
}

impl CycleGate {
    pub fn new() -> Self {
        CycleGate {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Attempt the Idle -> Running transition.
    ///
    /// Returns a guard restoring Idle on drop, so the gate clears on every
    /// exit path, or `None` when another cycle holds it.
    pub fn try_begin(&self) -> Option<CycleGuard<'_>> {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard { gate: self })
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }
}

pub struct CycleGuard<'a> {
    gate: &'a CycleGate,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.gate.state.store(IDLE, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_refused_while_running() {
        let gate = CycleGate::new();
        let guard = gate.try_begin();
        assert!(guard.is_some());
        assert!(gate.is_running());

        // a trigger while running gets nothing and does not disturb the gate
        assert!(gate.try_begin().is_none());
        assert!(gate.is_running());

        drop(guard);
        assert!(!gate.is_running());
        assert!(gate.try_begin().is_some());
    }
}
