/*!
 * Lock-Free Signal Counters
 * Atomic counters written from signal-handler context
 */

use crate::signals::types::PendingSignals;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters bumped by the signal handler and drained by the main flow
///
/// Only plain atomic operations are used, which keeps every method callable
/// from inside a signal handler.
#[repr(C, align(64))]
pub struct AtomicSignalCounters {
    hangups: AtomicU64,
    terminal_stops: AtomicU64,
    child_events: AtomicU64,
}

impl AtomicSignalCounters {
    #[inline]
    pub const fn new() -> Self {
        Self {
            hangups: AtomicU64::new(0),
            terminal_stops: AtomicU64::new(0),
            child_events: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_hangups(&self) {
        self.hangups.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_terminal_stops(&self) {
        self.terminal_stops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_child_events(&self) {
        self.child_events.fetch_add(1, Ordering::Release);
    }

    /// Read and zero every counter
    ///
    /// Each counter is swapped individually, so a signal landing between two
    /// swaps is carried over to the next drain rather than lost.
    #[inline]
    pub fn drain(&self) -> PendingSignals {
        PendingSignals {
            hangups: self.hangups.swap(0, Ordering::Relaxed),
            terminal_stops: self.terminal_stops.swap(0, Ordering::Relaxed),
            child_events: self.child_events.swap(0, Ordering::Acquire),
        }
    }

    /// Read without zeroing
    #[inline]
    pub fn snapshot(&self) -> PendingSignals {
        PendingSignals {
            hangups: self.hangups.load(Ordering::Relaxed),
            terminal_stops: self.terminal_stops.load(Ordering::Relaxed),
            child_events: self.child_events.load(Ordering::Acquire),
        }
    }
}

impl Default for AtomicSignalCounters {
    fn default() -> Self {
        Self::new()
    }
}
