//! Millisecond tick sources for the session loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic millisecond counter.
pub trait Clock {
    /// Milliseconds elapsed since the clock was created.
    fn ticks(&self) -> u64;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn ticks(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same counter, so a test can keep one handle and pass
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute tick value.
    pub fn set(&self, ticks: u64) {
        self.now.store(ticks, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.ticks(), 0);
        clock.advance(Duration::from_millis(250));
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.ticks(), 1250);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.set(9_999);
        assert_eq!(clock.ticks(), 9_999);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.ticks();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.ticks() >= a + 5);
    }
}
