use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::gate::{Gate, GatePass};

/// Mutual exclusion with two classes of acquirer.
///
/// Normal acquirers queue behind each other on a turnstile. A priority
/// acquirer closes a second turnstile that every normal acquirer has to pass
/// through, so once it arrives it waits for at most the one holder already
/// inside, however many normal acquirers are lined up. Several priority
/// acquirers may be outstanding at once; the priority turnstile reopens when
/// the last of them releases.
///
/// Normal acquirers can starve while priority traffic never lets up.
pub struct PriorityMutex<T> {
    turnstile_in: Gate,
    priority_turnstile: Gate,
    pending: AtomicUsize,
    resource: Mutex<T>,
}

impl<T> PriorityMutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            turnstile_in: Gate::new(),
            priority_turnstile: Gate::new(),
            pending: AtomicUsize::new(0),
            resource: Mutex::new(value),
        }
    }

    /// Acquires the lock at normal priority.
    pub fn lock_normal(&self) -> NormalGuard<'_, T> {
        let turnstile = self.turnstile_in.pass();
        let data = {
            let _wave = self.priority_turnstile.pass();
            self.lock_resource()
        };
        NormalGuard {
            data,
            _turnstile: turnstile,
        }
    }

    /// Acquires the lock ahead of any queued normal acquirers.
    pub fn lock_priority(&self) -> PriorityGuard<'_, T> {
        if self.pending.fetch_add(1, Ordering::AcqRel) == 0 {
            self.priority_turnstile.enter();
        }
        let wave = PriorityWave { mutex: self };
        PriorityGuard {
            data: self.lock_resource(),
            _wave: wave,
        }
    }

    /// Number of priority acquirers currently waiting for or holding the lock.
    pub fn pending_priority(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn into_inner(self) -> T {
        self.resource
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_resource(&self) -> MutexGuard<'_, T> {
        self.resource.lock().unwrap_or_else(|poisoned| {
            log::warn!("recovering world lock poisoned by a panicking holder");
            poisoned.into_inner()
        })
    }
}

impl<T: Default> Default for PriorityMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for PriorityMutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityMutex")
            .field("pending_priority", &self.pending_priority())
            .finish_non_exhaustive()
    }
}

// Guard fields drop in declaration order: the resource is released first,
// then the turnstile (normal) or the priority count (priority).

/// Scoped normal-priority hold on a [`PriorityMutex`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct NormalGuard<'a, T> {
    data: MutexGuard<'a, T>,
    _turnstile: GatePass<'a>,
}

/// Scoped priority hold on a [`PriorityMutex`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct PriorityGuard<'a, T> {
    data: MutexGuard<'a, T>,
    _wave: PriorityWave<'a, T>,
}

struct PriorityWave<'a, T> {
    mutex: &'a PriorityMutex<T>,
}

impl<T> Drop for PriorityWave<'_, T> {
    fn drop(&mut self) {
        if self.mutex.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.mutex.priority_turnstile.exit();
        }
    }
}

impl<T> Deref for NormalGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for NormalGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> Deref for PriorityGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for PriorityGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}
