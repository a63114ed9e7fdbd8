pub mod app;
pub mod autostart;
pub mod config;
pub mod desktop;
pub mod error;
pub mod event;
pub mod install;
pub mod mirrors;
pub mod process;
pub mod sink;
pub mod ui;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock ignoring poisoning; a panicked holder never leaves these flags half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
