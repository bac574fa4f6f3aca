use std::sync::{Condvar, Mutex, PoisonError};

/// Binary semaphore.
///
/// Unlike a mutex, a gate carries no owner: whichever thread calls
/// [`Gate::exit`] reopens it. The priority turnstile relies on this, since the
/// last priority holder to leave is not necessarily the one that closed it.
#[derive(Debug, Default)]
pub struct Gate {
    closed: Mutex<bool>,
    reopened: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the gate is open, then closes it behind the caller.
    pub fn enter(&self) {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        while *closed {
            closed = self
                .reopened
                .wait(closed)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *closed = true;
    }

    /// Reopens the gate and wakes one waiter.
    pub fn exit(&self) {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(*closed, "exit on an open gate");
        *closed = false;
        drop(closed);
        self.reopened.notify_one();
    }

    /// Enters the gate and returns a pass that exits it when dropped.
    pub fn pass(&self) -> GatePass<'_> {
        self.enter();
        GatePass { gate: self }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scoped hold on a [`Gate`].
#[must_use = "the gate reopens as soon as the pass is dropped"]
#[derive(Debug)]
pub struct GatePass<'a> {
    gate: &'a Gate,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        self.gate.exit();
    }
}
