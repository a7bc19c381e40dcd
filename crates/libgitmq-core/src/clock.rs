//! Monotonic order-key generation
//!
//! Order keys name and order messages, so they must be strictly increasing
//! within a process even when the generator is called faster than the clock's
//! millisecond resolution or when the system clock steps backwards. The
//! generator CAS-loops against the last issued value and bumps to `last + 1`
//! whenever the wall clock has not moved ahead of it.
//!
//! Monotonicity does not extend across processes: peers on different hosts
//! are ordered only by wall-clock proximity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

/// Source of wall-clock milliseconds, injectable for deterministic tests.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Default time source backed by the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Generator of strictly increasing order keys.
///
/// One instance is shared (via `Arc`) by every producer and consumer of a
/// client so that keys issued by the same process never collide.
pub struct OrderKeyGenerator {
    last: AtomicU64,
    source: Arc<dyn TimeSource>,
}

impl OrderKeyGenerator {
    /// Generator driven by the system clock.
    pub fn new() -> Self {
        Self::with_source(Arc::new(SystemTimeSource))
    }

    /// Generator driven by an explicit time source.
    pub fn with_source(source: Arc<dyn TimeSource>) -> Self {
        Self {
            last: AtomicU64::new(0),
            source,
        }
    }

    /// Issue the next order key.
    ///
    /// Guaranteed strictly greater than every key previously issued by this
    /// instance, regardless of call rate or clock regression.
    pub fn next(&self) -> u64 {
        let mut candidate = self.source.now_ms();
        loop {
            let last = self.last.load(Ordering::SeqCst);
            if candidate <= last {
                candidate = last + 1;
            }
            if self
                .last
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return candidate;
            }
            candidate = self.source.now_ms();
        }
    }
}

impl Default for OrderKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderKeyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderKeyGenerator")
            .field("last", &self.last.load(Ordering::SeqCst))
            .finish()
    }
}
