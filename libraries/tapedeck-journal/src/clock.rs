//! Wall-clock source for journal timestamps

use std::sync::atomic::{AtomicI64, Ordering};

/// Epoch seconds for 2016-01-01T00:00:00Z
///
/// A device that has not synchronised its clock boots near the epoch; any
/// reading before this instant is reported as "no timestamp".
pub const CLOCK_VALID_AFTER: i64 = 1_451_606_400;

/// Source of epoch-second timestamps
pub trait Clock: Send + Sync {
    /// Current time, or `None` if the clock is not set yet
    fn now(&self) -> Option<i64>;
}

/// System wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Option<i64> {
        let secs = chrono::Utc::now().timestamp();
        (secs >= CLOCK_VALID_AFTER).then_some(secs)
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    secs: AtomicI64,
}

impl FixedClock {
    const UNSET: i64 = i64::MIN;

    /// Clock frozen at `secs`
    pub fn at(secs: i64) -> Self {
        Self {
            secs: AtomicI64::new(secs),
        }
    }

    /// Clock that has never been synchronised
    pub fn unset() -> Self {
        Self::at(Self::UNSET)
    }

    /// Move the clock to `secs`
    pub fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Option<i64> {
        let secs = self.secs.load(Ordering::SeqCst);
        (secs != Self::UNSET).then_some(secs)
    }
}
