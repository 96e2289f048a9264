//! Locking helpers shared across the crate.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// Mutex poisoning indicates that another task panicked while holding the
/// lock. The state protected here is either a best-effort map (alias cache,
/// pending acknowledgements) or a logger handle; there are no invariants
/// spanning multiple fields, so the worst outcome of continuing is a dropped
/// diagnostic line or an unmatched acknowledgement.
///
/// This also avoids propagating non-`Send` poison errors across async
/// boundaries.
pub(crate) fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Shared-mode counterpart of [`lock_ignore_poison`] for `RwLock`.
pub(crate) fn read_ignore_poison<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    // ---
    match l.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Exclusive-mode counterpart of [`lock_ignore_poison`] for `RwLock`.
pub(crate) fn write_ignore_poison<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    // ---
    match l.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
