//! Three-sensor light array for following a line on the floor.
//!
//! The left, center and right sensors pack into a 3-bit pattern
//! (`left << 2 | center << 1 | right`), which maps to a signed line
//! position: negative when the line is right of center, positive when it is
//! left. Patterns with no single position (no line, Y fork, T junction)
//! leave the last good position in place.

use mecha_common::hal::DigitalSource;
use tracing::trace;

/// Raw sensor pattern, bit 2 = left, bit 1 = center, bit 0 = right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinePattern(u8);

impl LinePattern {
    pub const NO_LINE: Self = Self(0b000);
    pub const Y_JUNCTION: Self = Self(0b101);
    pub const T_JUNCTION: Self = Self(0b111);

    pub const fn new(left: bool, center: bool, right: bool) -> Self {
        Self(((left as u8) << 2) | ((center as u8) << 1) | right as u8)
    }

    /// Only the low three bits are kept.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Line position for this pattern, `None` when there is no single line
    /// under the array.
    pub const fn position(self) -> Option<f64> {
        match self.0 {
            0b001 => Some(-2.0),
            0b010 => Some(0.0),
            0b011 => Some(-1.0),
            0b100 => Some(2.0),
            0b110 => Some(1.0),
            _ => None,
        }
    }

    /// Two branches under the array at once.
    #[inline]
    pub fn is_junction(self) -> bool {
        self == Self::Y_JUNCTION || self == Self::T_JUNCTION
    }
}

pub struct LineSensor {
    source: Box<dyn DigitalSource>,
    /// Sample bits of the left, center and right sensors.
    bits: [u32; 3],
    pattern: LinePattern,
    position: f64,
}

impl LineSensor {
    /// `channels` are the 1-based inputs of the left, center and right
    /// sensors within the sampled word. Callers validate them.
    pub fn new(source: Box<dyn DigitalSource>, channels: [u32; 3]) -> Self {
        Self {
            source,
            bits: channels.map(|ch| ch.saturating_sub(1).min(u32::BITS - 1)),
            pattern: LinePattern::NO_LINE,
            position: 0.0,
        }
    }

    /// Read the sensors. The held position only moves on a valid pattern.
    pub fn sample(&mut self) -> LinePattern {
        let word = self.source.sample();
        let [left, center, right] = self.bits.map(|bit| word & (1 << bit) != 0);
        self.pattern = LinePattern::new(left, center, right);
        if let Some(position) = self.pattern.position() {
            self.position = position;
        }
        trace!(pattern = self.pattern.bits(), position = self.position, "line sample");
        self.pattern
    }

    #[inline]
    pub fn pattern(&self) -> LinePattern {
        self.pattern
    }

    /// Last valid line position.
    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Word(Rc<Cell<u32>>);

    impl DigitalSource for Word {
        fn sample(&mut self) -> u32 {
            self.0.get()
        }
    }

    fn sensor() -> (LineSensor, Rc<Cell<u32>>) {
        let word = Rc::new(Cell::new(0));
        (LineSensor::new(Box::new(Word(word.clone())), [12, 13, 14]), word)
    }

    /// Word with the given sensors lit on channels 12, 13 and 14.
    fn lit(left: bool, center: bool, right: bool) -> u32 {
        ((left as u32) << 11) | ((center as u32) << 12) | ((right as u32) << 13)
    }

    #[test]
    fn pattern_table() {
        let table = [
            (0b000, None),
            (0b001, Some(-2.0)),
            (0b010, Some(0.0)),
            (0b011, Some(-1.0)),
            (0b100, Some(2.0)),
            (0b101, None),
            (0b110, Some(1.0)),
            (0b111, None),
        ];
        for (bits, expected) in table {
            assert_eq!(LinePattern::from_bits(bits).position(), expected, "{bits:03b}");
        }
    }

    #[test]
    fn pattern_packs_left_high() {
        assert_eq!(LinePattern::new(true, false, false).bits(), 0b100);
        assert_eq!(LinePattern::new(false, true, true).bits(), 0b011);
        assert_eq!(LinePattern::from_bits(0xFD), LinePattern::Y_JUNCTION);
        assert!(LinePattern::T_JUNCTION.is_junction());
        assert!(!LinePattern::NO_LINE.is_junction());
    }

    #[test]
    fn sample_reads_configured_channels() {
        let (mut s, word) = sensor();
        word.set(lit(true, true, false));
        assert_eq!(s.sample(), LinePattern::from_bits(0b110));
        assert_eq!(s.position(), 1.0);

        // Lower channels are not part of the array.
        word.set(lit(false, false, true) | 0x7FF);
        assert_eq!(s.sample(), LinePattern::from_bits(0b001));
        assert_eq!(s.position(), -2.0);
    }

    #[test]
    fn invalid_patterns_hold_previous_position() {
        let (mut s, word) = sensor();
        assert_eq!(s.position(), 0.0);

        word.set(lit(false, true, true));
        s.sample();
        assert_eq!(s.position(), -1.0);

        for (l, c, r) in [(false, false, false), (true, false, true), (true, true, true)] {
            word.set(lit(l, c, r));
            let pattern = s.sample();
            assert_eq!(pattern.position(), None);
            assert_eq!(s.position(), -1.0, "{:03b}", pattern.bits());
        }

        word.set(lit(true, false, false));
        s.sample();
        assert_eq!(s.position(), 2.0);
    }
}
