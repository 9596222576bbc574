//! Injected time source.
//!
//! Metric timestamps are taken through a [`Clock`] rather than by calling
//! `Instant::now()` inline, so delay accounting can be tested with
//! fabricated timelines instead of real sleeps.  Production code uses
//! [`WallClock`]; tests use [`ManualClock`] and advance it explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Interior mutability (an atomic offset) lets tests share the clock with
/// code holding `&dyn Clock` while still advancing it.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_micros: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_micros: AtomicU64::new(0),
        }
    }

    /// Move the clock forward by `d` (truncated to microsecond precision).
    pub fn advance(&self, d: Duration) {
        self.offset_micros
            .fetch_add(d.as_micros() as u64, Ordering::Relaxed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_micros(self.offset_micros.load(Ordering::Relaxed))
    }
}
