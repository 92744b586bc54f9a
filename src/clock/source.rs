//! Wall-clock sources sampled by the version clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of wall-clock readings in milliseconds since the Unix epoch.
///
/// The clock holds its source behind a trait object so tests can drive time
/// explicitly instead of racing the system clock.
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Reads `SystemTime::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        // A system clock set before 1970 reads as 0, which the clock then
        // reports as a regression.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A hand-driven time source.
///
/// Each reading can optionally advance the clock by a fixed step, which lets
/// busy-wait loops make progress without a real clock behind them.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    millis: Arc<AtomicU64>,
    step: u64,
}

impl ManualTimeSource {
    /// Creates a source frozen at `millis`.
    pub fn new(millis: u64) -> Self {
        Self::with_step(millis, 0)
    }

    /// Creates a source that advances by `step` after every reading.
    pub fn with_step(millis: u64, step: u64) -> Self {
        ManualTimeSource {
            millis: Arc::new(AtomicU64::new(millis)),
            step,
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, AtomicOrdering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, AtomicOrdering::SeqCst);
    }

    /// Current value without advancing.
    pub fn peek(&self) -> u64 {
        self.millis.load(AtomicOrdering::SeqCst)
    }
}

impl TimeSource for ManualTimeSource {
    fn now_millis(&self) -> u64 {
        self.millis.fetch_add(self.step, AtomicOrdering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_source_is_after_epoch() {
        // 2020-01-01
        assert!(SystemTimeSource.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_manual_source_step() {
        let source = ManualTimeSource::with_step(10, 2);
        assert_eq!(source.now_millis(), 10);
        assert_eq!(source.now_millis(), 12);
        assert_eq!(source.peek(), 14);
    }

    #[test]
    fn test_manual_source_shared_between_clones() {
        let source = ManualTimeSource::new(5);
        let handle = source.clone();
        handle.set(100);
        assert_eq!(source.now_millis(), 100);
        handle.advance(1);
        assert_eq!(source.now_millis(), 101);
    }
}
