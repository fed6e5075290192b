//! Identifier stamping

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of wall-clock time in nanoseconds
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> i64;
}

/// The system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

/// Issues timestamp identifiers that never go backwards
pub struct IdStamp {
    clock: Arc<dyn Clock>,
    last: AtomicI64,
}

impl IdStamp {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: AtomicI64::new(i64::MIN),
        }
    }

    /// Current time, or the last issued id if the clock stepped back
    pub fn next(&self) -> i64 {
        let now = self.clock.now_nanos();
        let previous = self.last.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}

impl std::fmt::Debug for IdStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdStamp")
            .field("last", &self.last.load(Ordering::SeqCst))
            .finish()
    }
}
