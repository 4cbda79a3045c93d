//! Engine configuration.

use embassy_time::Duration;
use heapless::Vec;

use crate::dma::MAX_MAJOR_COUNT;
use crate::edge_clock::EdgeTiming;
use crate::error::{Error, Result};

/// Number of lines on the combined output port.
pub const PORT_LINES: usize = 16;

/// Most strips one engine can drive: every port line but the clock line.
pub const MAX_STRIPS: usize = PORT_LINES - 1;

/// Quiet time the strips need after the last clock pulse before they latch
/// the received data and accept a new frame.
pub const LATCH_DELAY: Duration = Duration::from_micros(1000);

/// Default serial bit rate.
pub const DEFAULT_FREQUENCY_HZ: u32 = 1_000_000;

/// Default input clock of the edge generator timer.
pub const DEFAULT_TIMER_HZ: u32 = 48_000_000;

/// Port lines carrying the shared clock signal.
///
/// Bit `i` set marks line `i` as the clock wire. Every clear bit is an
/// independent data wire for one strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockMask(u16);

impl ClockMask {
    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Lines carrying strip data.
    pub const fn data_mask(self) -> u16 {
        !self.0
    }

    /// Port level between frames: clock low, data lines high.
    pub const fn idle_word(self) -> u16 {
        !self.0
    }

    pub const fn is_clock_line(self, line: u8) -> bool {
        line < PORT_LINES as u8 && self.0 & (1 << line) != 0
    }

    /// Number of strips the mask leaves room for.
    pub const fn strip_count(self) -> usize {
        PORT_LINES - self.0.count_ones() as usize
    }

    /// Indices of the data lines, lowest first.
    pub fn data_lines(self) -> Vec<u8, PORT_LINES> {
        let mut lines = Vec::new();
        for line in 0..PORT_LINES as u8 {
            if !self.is_clock_line(line) {
                let _ = lines.push(line);
            }
        }
        lines
    }
}

impl From<u16> for ClockMask {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

/// Construction parameters, fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Bytes in one frame. Must be even: the frame is streamed as words.
    pub buf_size: usize,
    /// Lines carrying the shared clock.
    pub clock_mask: ClockMask,
    /// Leave the caller's frame untouched instead of clearing clock bits in it.
    pub skip_clear: bool,
    /// Serial bit rate, one tick per cycle.
    pub frequency_hz: u32,
    /// Input clock of the edge generator timer.
    pub timer_hz: u32,
    /// Minimum quiet time after the last clock pulse of a frame.
    pub latch_delay: Duration,
}

impl EngineConfig {
    /// Config with the default timer clock and latch interval.
    pub const fn new(
        buf_size: usize,
        clock_mask: u16,
        skip_clear: bool,
        frequency_hz: u32,
    ) -> Self {
        Self {
            buf_size,
            clock_mask: ClockMask::new(clock_mask),
            skip_clear,
            frequency_hz,
            timer_hz: DEFAULT_TIMER_HZ,
            latch_delay: LATCH_DELAY,
        }
    }

    /// Words (ticks) in one frame.
    pub const fn words(&self) -> usize {
        self.buf_size / 2
    }

    /// Check the config and derive the edge generator timing from it.
    pub fn validate(&self) -> Result<EdgeTiming> {
        if self.buf_size == 0 || self.buf_size % 2 != 0 {
            return Err(Error::BufferSize {
                buf_size: self.buf_size,
            });
        }
        if self.words() > MAX_MAJOR_COUNT {
            return Err(Error::BufferTooLarge {
                words: self.words(),
                max: MAX_MAJOR_COUNT,
            });
        }
        match self.clock_mask.bits() {
            0 => return Err(Error::NoClockLine),
            u16::MAX => return Err(Error::NoDataLine),
            _ => {}
        }
        EdgeTiming::new(self.frequency_hz, self.timer_hz)
    }
}
