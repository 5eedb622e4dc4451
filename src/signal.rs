//! Process-wide quit requests from Ctrl+C and termination signals.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag for handling Ctrl+C across the application
static QUIT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if a quit signal has been received.
pub fn quit_requested() -> bool {
    QUIT_REQUESTED.load(Ordering::SeqCst)
}

/// Set up the signal handler.
///
/// This should be called once at program startup. The frontend turns the flag
/// into a quit event on its next poll.
pub fn setup_quit_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        QUIT_REQUESTED.store(true, Ordering::SeqCst);
        log::info!("Received termination signal, shutting down");
    })
}
