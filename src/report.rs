//! Process-wide fatal-error flag.
//!
//! Any component may set the flag on an unrecoverable error; only the CLI
//! entry point reads it, at exit, to pick the process exit status.

use std::sync::atomic::{AtomicBool, Ordering};

static FATAL: AtomicBool = AtomicBool::new(false);

/// Record that an unrecoverable error occurred somewhere in the run.
pub fn set_fatal() {
    FATAL.store(true, Ordering::Relaxed);
}

/// Whether any component reported an unrecoverable error.
pub fn fatal() -> bool {
    FATAL.load(Ordering::Relaxed)
}

/// Reset the flag. Test-only; the flag is process-global.
#[cfg(test)]
pub fn reset() {
    FATAL.store(false, Ordering::Relaxed);
}
