//! Output port abstraction.
//!
//! The engine treats all sixteen lines as one port with two registers: a
//! data register that sets every line at once, and a set register that only
//! drives the selected lines high. Many parts expose this as two 8-bit GPIO
//! ports; [`PortPair`] glues two of those into one 16-bit port.

/// A 16-bit output port.
pub trait OutputPort {
    /// Drive every line to the level of the matching bit in `word`.
    fn write(&mut self, word: u16);

    /// Drive the lines selected by `mask` high and leave the others alone.
    fn set(&mut self, mask: u16);
}

/// An 8-bit output port, one half of an [`OutputPort`].
pub trait BytePort {
    /// Drive every line to the level of the matching bit in `byte`.
    fn write(&mut self, byte: u8);

    /// Drive the lines selected by `mask` high and leave the others alone.
    fn set(&mut self, mask: u8);
}

/// Split a port word into its low and high byte.
pub const fn split_word(word: u16) -> (u8, u8) {
    let [low, high] = word.to_le_bytes();
    (low, high)
}

/// Two 8-bit ports driven as one 16-bit port.
///
/// Lines 0..8 live on `low`, lines 8..16 on `high`. The low half is always
/// written first, matching the order in which a DMA minor loop walks the two
/// port registers.
#[derive(Debug)]
pub struct PortPair<L, H> {
    low: L,
    high: H,
}

impl<L: BytePort, H: BytePort> PortPair<L, H> {
    pub const fn new(low: L, high: H) -> Self {
        Self { low, high }
    }

    /// Give back both halves.
    pub fn into_parts(self) -> (L, H) {
        (self.low, self.high)
    }
}

impl<L: BytePort, H: BytePort> OutputPort for PortPair<L, H> {
    fn write(&mut self, word: u16) {
        let (low, high) = split_word(word);
        self.low.write(low);
        self.high.write(high);
    }

    fn set(&mut self, mask: u16) {
        let (low, high) = split_word(mask);
        self.low.set(low);
        self.high.set(high);
    }
}

impl<T: OutputPort + ?Sized> OutputPort for &mut T {
    fn write(&mut self, word: u16) {
        (**self).write(word);
    }

    fn set(&mut self, mask: u16) {
        (**self).set(mask);
    }
}
