//! Transfer channel abstraction.
//!
//! A channel copies one 16-bit word per hardware request, counts requests
//! down from `major_count`, and can switch itself off and raise an interrupt
//! when the count runs out. Nothing on the CPU side touches individual words.

/// Most requests a channel counts in one pass (15-bit iteration counter).
pub const MAX_MAJOR_COUNT: usize = 0x7FFF;

/// Edge that raises a channel's transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Early edge of each cycle: data word goes out.
    EdgeA,
    /// Late edge of each cycle: clock line rises.
    EdgeB,
}

/// Where a channel reads its words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Caller's frame, bound per transfer with [`DmaChannel::set_source`].
    /// The cursor advances one word per request and rewinds to the start of
    /// the frame after the last one.
    Frame,
    /// The same word on every request.
    Constant(u16),
}

/// Port register a channel writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Data register: every line takes the level of its bit.
    PortData,
    /// Set register: selected lines go high, others keep their level.
    PortSet,
}

/// Static programming of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferDescriptor {
    pub source: Source,
    pub destination: Destination,
    pub trigger: Trigger,
    /// Requests per pass.
    pub major_count: u16,
    /// Clear the request enable when the pass ends.
    pub disable_on_completion: bool,
    /// Raise the completion interrupt when the pass ends.
    pub interrupt_on_completion: bool,
}

/// One hardware transfer channel.
pub trait DmaChannel {
    /// Load the static programming. Called once during init.
    fn configure(&mut self, descriptor: &TransferDescriptor);

    /// Point a [`Source::Frame`] channel at `words`.
    ///
    /// Implementations keep the address, not a copy: the words are read in
    /// place while the transfer runs.
    fn set_source(&mut self, words: &[u16]);

    /// Accept hardware requests.
    fn enable(&mut self);

    /// Ignore hardware requests.
    fn disable(&mut self);

    fn is_enabled(&self) -> bool;
}

/// Completion flag of a channel that interrupts when its pass ends.
pub trait CompletionSignal {
    /// Acknowledge the interrupt so it does not fire again.
    fn clear(&mut self);
}
