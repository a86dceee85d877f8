//! Time source and binary signal primitives.
//!
//! Everything in the control core runs on one cooperative thread, so both
//! primitives use shared single-threaded cells instead of atomics. Neither
//! offers a blocking wait: consumers poll once per tick.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

// ─── Clock ──────────────────────────────────────────────────────────

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock handle shared by every component of one robot.
pub type SharedClock = Rc<dyn Clock>;

/// Wall clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock advanced explicitly by its owner.
///
/// Used for deterministic tick-by-tick runs where each scheduler pass
/// represents exactly one period.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ─── Event ──────────────────────────────────────────────────────────

/// Binary signal shared between producers and a polling consumer.
///
/// Clones refer to the same signal. Once set, an event stays signaled until
/// it is cleared. Two handles compare equal when they share one signal.
#[derive(Clone, Default)]
pub struct Event {
    signaled: Rc<Cell<bool>>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set(&self) {
        self.signaled.set(true);
    }

    #[inline]
    pub fn clear(&self) {
        self.signaled.set(false);
    }

    #[inline]
    pub fn is_signaled(&self) -> bool {
        self.signaled.get()
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.signaled, &other.signaled)
    }
}

impl Eq for Event {}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &Rc::as_ptr(&self.signaled))
            .field("signaled", &self.is_signaled())
            .finish()
    }
}

/// Deadline `timeout_ms` after `now_ms`; zero means no deadline.
#[inline]
pub fn deadline_after(now_ms: u64, timeout_ms: u64) -> Option<u64> {
    (timeout_ms != 0).then(|| now_ms.saturating_add(timeout_ms))
}

/// True once `now_ms` has reached an armed deadline.
#[inline]
pub fn deadline_reached(deadline_ms: Option<u64>, now_ms: u64) -> bool {
    deadline_ms.is_some_and(|d| now_ms >= d)
}

// ─── Tests ──────────────────────────────────────────────────────────
