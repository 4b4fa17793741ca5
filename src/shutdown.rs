//! Cooperative stop flag set by the Ctrl-C handler.
//!
//! The pipeline checks it before hashing each file and before each copy, so an
//! interrupted run never leaves a half-written destination behind and never deletes
//! a source whose copy did not happen. Relaxed ordering is enough for a one-way flag.

use std::sync::atomic::{AtomicBool, Ordering};

static STOP: AtomicBool = AtomicBool::new(false);

/// Ask the run to stop after the current file (idempotent, signal-safe).
#[inline]
pub fn request() {
    STOP.store(true, Ordering::Relaxed);
}

#[inline]
pub fn is_requested() -> bool {
    STOP.load(Ordering::Relaxed)
}

#[cfg(test)]
#[inline]
pub fn reset() {
    STOP.store(false, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_sticky_until_reset() {
        reset();
        assert!(!is_requested());
        request();
        request();
        assert!(is_requested());
        reset();
        assert!(!is_requested());
    }
}
