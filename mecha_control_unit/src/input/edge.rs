//! Change detector for N-bit digital words.
//!
//! Each pre-periodic pass samples the source, XORs against the previous
//! sample, masks with the union of all registered channels and notifies
//! listeners once per changed bit. Bits are always visited in ascending
//! index order so simultaneous changes are delivered deterministically.

use heapless::Vec;
use static_assertions::const_assert;
use mecha_common::consts::{MAX_DIGITAL_WIDTH, MAX_EDGE_LISTENERS};
use mecha_common::hal::DigitalSource;
use mecha_common::robot::state::RobotMode;
use tracing::{trace, warn};

use crate::task::{Task, TaskPhases};

// Channel masks are single bits of a u32 sample.
const_assert!(MAX_DIGITAL_WIDTH <= u32::BITS);

/// One bit transition delivered to a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Source identifier (joystick port, module slot).
    pub source: u8,
    /// 1-based channel index (bit 0 is channel 1).
    pub channel: u32,
    /// Single-bit mask of the channel.
    pub mask: u32,
    /// Level of the bit in the new sample.
    pub active: bool,
}

pub type EdgeListener = Box<dyn FnMut(EdgeEvent)>;

struct Registration {
    mask: u32,
    listener: EdgeListener,
}

pub struct EdgeDispatcher {
    name: &'static str,
    source_id: u8,
    source: Box<dyn DigitalSource>,
    width_mask: u32,
    prev_sample: u32,
    channel_mask: u32,
    registrations: Vec<Registration, MAX_EDGE_LISTENERS>,
}

impl EdgeDispatcher {
    pub const PHASES: TaskPhases = TaskPhases::PRE_PERIODIC;

    /// Create a dispatcher over a `width`-bit source. The first sample is
    /// taken here so the first tick only reports real changes.
    pub fn new(
        name: &'static str,
        source_id: u8,
        mut source: Box<dyn DigitalSource>,
        width: u32,
    ) -> Self {
        let width = width.clamp(1, MAX_DIGITAL_WIDTH);
        let width_mask = if width == u32::BITS {
            u32::MAX
        } else {
            (1u32 << width) - 1
        };
        let prev_sample = source.sample() & width_mask;
        Self {
            name,
            source_id,
            source,
            width_mask,
            prev_sample,
            channel_mask: 0,
            registrations: Vec::new(),
        }
    }

    /// Register `listener` for the channels in `mask`.
    ///
    /// Returns `false` when the registration table is full; nothing is
    /// changed in that case.
    #[must_use]
    pub fn register_listener(&mut self, mask: u32, listener: EdgeListener) -> bool {
        let mask = mask & self.width_mask;
        if self
            .registrations
            .push(Registration { mask, listener })
            .is_err()
        {
            warn!(dispatcher = self.name, mask, "listener table full");
            return false;
        }
        self.channel_mask |= mask;
        true
    }

    /// Union of every registered channel mask.
    #[inline]
    pub fn channel_mask(&self) -> u32 {
        self.channel_mask
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.registrations.len()
    }

    /// Level of a 1-based channel in the most recent sample.
    pub fn state(&self, channel: u32) -> bool {
        channel_bit(channel).is_some_and(|bit| self.prev_sample & bit != 0)
    }

    /// Read a 4-bit active-low BCD thumbwheel. The digit occupies sample bits
    /// `low_channel..low_channel + 4`, so the wheel starts one channel above
    /// `low_channel`.
    pub fn bcd_switch(&self, low_channel: u32) -> u8 {
        if low_channel < u32::BITS {
            ((!self.prev_sample >> low_channel) & 0xF) as u8
        } else {
            0
        }
    }

    /// Sample the source and notify listeners. Returns the number of
    /// notifications delivered.
    pub fn dispatch(&mut self) -> usize {
        let sample = self.source.sample() & self.width_mask;
        let mut changed = (self.prev_sample ^ sample) & self.channel_mask;
        let mut delivered = 0;

        while changed != 0 {
            let bit = changed & changed.wrapping_neg();
            let event = EdgeEvent {
                source: self.source_id,
                channel: bit.trailing_zeros() + 1,
                mask: bit,
                active: sample & bit != 0,
            };
            trace!(dispatcher = self.name, channel = event.channel, active = event.active, "edge");
            for reg in self.registrations.iter_mut().filter(|r| r.mask & bit != 0) {
                (reg.listener)(event);
                delivered += 1;
            }
            changed &= !bit;
        }

        self.prev_sample = sample;
        delivered
    }
}

impl Task for EdgeDispatcher {
    fn pre_periodic(&mut self, _mode: RobotMode) {
        self.dispatch();
    }
}

/// Single-bit mask of a 1-based channel.
#[inline]
pub fn channel_bit(channel: u32) -> Option<u32> {
    match channel {
        1..=MAX_DIGITAL_WIDTH => Some(1 << (channel - 1)),
        _ => None,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
