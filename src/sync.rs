//! Poison recovery for std::sync locks
//!
//! Every lock in this crate guards plain data that stays consistent even if a
//! holder panicked mid-operation, so a poisoned lock is logged and reused.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Extension trait for Mutex with poison recovery
pub trait MutexExt<T> {
    fn lock_recovered(&self) -> MutexGuard<'_, T>;
}

/// Extension trait for RwLock with poison recovery
pub trait RwLockExt<T> {
    fn read_recovered(&self) -> RwLockReadGuard<'_, T>;

    fn write_recovered(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    fn lock_recovered(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|poisoned| {
            log::warn!("Mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl<T> RwLockExt<T> for RwLock<T> {
    fn read_recovered(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap_or_else(|poisoned| {
            log::warn!("RwLock was poisoned (read), recovering");
            poisoned.into_inner()
        })
    }

    fn write_recovered(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap_or_else(|poisoned| {
            log::warn!("RwLock was poisoned (write), recovering");
            poisoned.into_inner()
        })
    }
}
