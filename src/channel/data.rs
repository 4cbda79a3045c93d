use crate::dma::{Destination, DmaChannel, Source, TransferDescriptor, Trigger};

/// Streams the frame onto the port data register, one word per edge A.
#[derive(Debug)]
pub struct DataChannel<D> {
    dma: D,
    words: u16,
}

impl<D: DmaChannel> DataChannel<D> {
    pub const fn new(dma: D, words: u16) -> Self {
        Self { dma, words }
    }

    pub const fn descriptor(&self) -> TransferDescriptor {
        TransferDescriptor {
            source: Source::Frame,
            destination: Destination::PortData,
            trigger: Trigger::EdgeA,
            major_count: self.words,
            disable_on_completion: true,
            interrupt_on_completion: false,
        }
    }

    pub fn begin(&mut self) {
        let descriptor = self.descriptor();
        self.dma.configure(&descriptor);
    }

    /// Bind the frame for the next pass. The channel reads it in place.
    pub fn arm(&mut self, frame: &[u16]) {
        self.dma.set_source(frame);
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
