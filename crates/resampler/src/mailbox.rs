//! Single-slot, latest-value-wins hand-off between threads.
//!
//! Producers overwrite the slot; the consumer takes whatever is there on its
//! next tick. There is no queue and no backpressure. The slot also carries
//! the open/closed flag that ends the consumer's wait, so shutdown and the
//! tick sleep share one mutex and cannot miss a wake-up.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Debug)]
struct SlotState<T> {
    value: Option<T>,
    open: bool,
}

/// Overwrite-on-write cell with a closable wait.
#[derive(Debug)]
pub struct LatestSlot<T> {
    state: Mutex<SlotState<T>>,
    wake: Condvar,
}

impl<T> LatestSlot<T> {
    /// A closed, empty slot.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                value: None,
                open: false,
            }),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value`, replacing any unconsumed one. Returns `true` if a
    /// pending value was overwritten.
    pub fn publish(&self, value: T) -> bool {
        let overwritten = {
            let mut state = self.lock();
            state.value.replace(value).is_some()
        };
        self.wake.notify_one();
        overwritten
    }

    /// Take the pending value, if any.
    pub fn take(&self) -> Option<T> {
        self.lock().value.take()
    }

    /// Mark the slot open and discard any stale value.
    pub fn open(&self) {
        let mut state = self.lock();
        state.value = None;
        state.open = true;
    }

    /// Mark the slot closed and wake every waiter.
    pub fn close(&self) {
        self.lock().open = false;
        self.wake.notify_all();
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Sleep until `deadline` or until the slot is closed, whichever comes
    /// first. Publishing does not end the wait. Returns whether the slot is
    /// still open.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let state = self.lock();
        let timeout = deadline.saturating_duration_since(Instant::now());
        let (state, _) = self
            .wake
            .wait_timeout_while(state, timeout, |s| s.open)
            .unwrap_or_else(PoisonError::into_inner);
        state.open
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
