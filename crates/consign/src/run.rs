//! Terminal-state latches for one publication run.
//!
//! A run ends exactly once, as either completed or failed. Every later
//! transfer on the same run checks the latches and becomes a no-op, so a
//! client that keeps pushing files after a failure cannot half-publish a
//! second package.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct PublicationRun {
    failed: AtomicBool,
    completed: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl PublicationRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the run as failed and record the first failure's reason.
    ///
    /// Returns whether this call did the latching; later calls leave the
    /// recorded reason untouched.
    pub fn fail(&self, reason: &str) -> bool {
        let latched = self
            .failed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if latched && let Ok(mut slot) = self.reason.lock() {
            *slot = Some(reason.to_string());
        }
        latched
    }

    /// Latch the run as completed. Returns whether this call did it.
    pub fn complete(&self) -> bool {
        self.completed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_terminated(&self) -> bool {
        self.is_failed() || self.is_completed()
    }

    /// The first recorded failure reason, if the run has failed.
    pub fn failure(&self) -> Option<String> {
        self.reason.lock().ok().and_then(|slot| slot.clone())
    }
}
