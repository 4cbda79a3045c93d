use crate::config::ClockMask;
use crate::dma::{Destination, DmaChannel, Source, TransferDescriptor, Trigger};

/// Raises the clock lines through the port set register on every edge B.
///
/// The clock lines come down again with the next data word (whose clock
/// bits are clear) or with the idle write after the last tick. The pass ends
/// with the completion interrupt.
#[derive(Debug)]
pub struct ClockChannel<C> {
    dma: C,
    mask: ClockMask,
    words: u16,
}

impl<C: DmaChannel> ClockChannel<C> {
    pub const fn new(dma: C, mask: ClockMask, words: u16) -> Self {
        Self { dma, mask, words }
    }

    pub const fn descriptor(&self) -> TransferDescriptor {
        TransferDescriptor {
            source: Source::Constant(self.mask.bits()),
            destination: Destination::PortSet,
            trigger: Trigger::EdgeB,
            major_count: self.words,
            disable_on_completion: true,
            interrupt_on_completion: true,
        }
    }

    pub fn begin(&mut self) {
        let descriptor = self.descriptor();
        self.dma.configure(&descriptor);
    }

    pub fn start(&mut self) {
        self.dma.enable();
    }

    pub fn stop(&mut self) {
        self.dma.disable();
    }

    pub fn is_running(&self) -> bool {
        self.dma.is_enabled()
    }
}
