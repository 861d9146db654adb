//! Cancel and pause flags shared between the caller and the session worker

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Raw flag pair
#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    /// Stop as soon as the worker reaches a boundary
    cancel: bool,
    /// Hold before the next character
    pause: bool,
}

/// Cooperative control signals, polled by the worker between characters.
///
/// Every change wakes the worker, so a paused or sleeping worker notices a
/// cancellation immediately.
#[derive(Debug, Default)]
pub struct Signals {
    /// Current flags
    flags: Mutex<Flags>,
    /// Notified on every change
    changed: Condvar,
}

impl Signals {
    /// Create cleared signals
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the flags, ignoring poisoning
    fn lock(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a change and wake the worker
    fn update<F: FnOnce(&mut Flags)>(&self, change: F) {
        change(&mut self.lock());
        self.changed.notify_all();
    }

    /// Ask the worker to stop. Also releases a paused worker.
    pub fn request_cancel(&self) {
        self.update(|flags| flags.cancel = true);
    }

    /// Ask the worker to hold before its next character
    pub fn request_pause(&self) {
        self.update(|flags| flags.pause = true);
    }

    /// Let a paused worker continue
    pub fn request_resume(&self) {
        self.update(|flags| flags.pause = false);
    }

    /// Whether a stop was requested
    pub fn is_cancel_requested(&self) -> bool {
        self.lock().cancel
    }

    /// Whether a pause is in effect
    pub fn is_pause_requested(&self) -> bool {
        self.lock().pause
    }

    /// Block while paused, with no timeout.
    ///
    /// Cancellation is checked before every wait. Returns `false` if the
    /// session was cancelled, `true` once it may continue.
    pub fn wait_while_paused(&self) -> bool {
        let mut flags = self.lock();
        loop {
            if flags.cancel {
                return false;
            }
            if !flags.pause {
                return true;
            }
            flags = self.changed.wait(flags).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Sleep for `duration`, waking early on cancellation.
    ///
    /// Returns `false` if cancelled before or during the sleep.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut flags = self.lock();
        loop {
            if flags.cancel {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            flags = self
                .changed
                .wait_timeout(flags, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }
}
