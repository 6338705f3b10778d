use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Source of microsecond timestamps.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Strictly increasing nonce generator for private calls.
///
/// Nonces follow the wall clock in microseconds. If the clock stalls or steps back,
/// the previous nonce plus one is issued instead.
#[derive(Clone)]
pub struct NonceSequence {
    last: Arc<AtomicU64>,
    clock: Clock,
}

impl NonceSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(now_micros))
    }

    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            last: Arc::new(AtomicU64::new(0)),
            clock,
        }
    }

    /// Returns a nonce greater than every nonce previously issued by this sequence.
    pub fn next(&self) -> u64 {
        let now = (self.clock)();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);

        now.max(previous + 1)
    }

    /// Last nonce handed out, or zero if none.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}

impl Default for NonceSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NonceSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceSequence")
            .field("last", &self.last())
            .finish_non_exhaustive()
    }
}

fn now_micros() -> u64 {
    u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default()
}
