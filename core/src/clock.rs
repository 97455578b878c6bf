//! Time sources. The core never reads the clock itself; callers pass
//! `now` into every operation, taken from one of these.

use crate::types::Timestamp;
use std::sync::atomic::{AtomicI64, Ordering};

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().into()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { millis: AtomicI64::new(start.as_millis()) }
    }

    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }

    /// Move forward (or backward, for skew scenarios) by `delta_ms`.
    pub fn advance_millis(&self, delta_ms: i64) -> Timestamp {
        let now = self.millis.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms;
        Timestamp::from_millis(now)
    }

    pub fn advance_secs(&self, secs: i64) -> Timestamp {
        self.advance_millis(secs * 1000)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}
