//! Frame layout helpers.
//!
//! A frame is a run of 16-bit words, one per tick. Bit `i` of a word is the
//! level of port line `i` during that tick.

use crate::config::{ClockMask, PORT_LINES};
use crate::error::{Error, Result};

/// Words in a frame of `buf_size` bytes.
pub const fn words_for(buf_size: usize) -> usize {
    buf_size / 2
}

/// Clear the clock bits of every word, so data writes never raise the clock.
pub fn scrub_clock_bits(frame: &mut [u16], mask: ClockMask) {
    let keep = mask.data_mask();
    for word in frame.iter_mut() {
        *word &= keep;
    }
}

pub(crate) fn check_length(frame: &[u16], expected: usize) -> Result<()> {
    if frame.len() == expected {
        Ok(())
    } else {
        Err(Error::FrameLength {
            expected,
            actual: frame.len(),
        })
    }
}

/// Levels of the data lines in one tick's word, as `(line, high)` pairs.
pub fn lane_levels(word: u16, mask: ClockMask) -> impl Iterator<Item = (u8, bool)> {
    (0..PORT_LINES as u8)
        .filter(move |&line| !mask.is_clock_line(line))
        .map(move |line| (line, word & (1 << line) != 0))
}
