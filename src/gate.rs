//! Public control surface of the engine.

use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::channel::{ClockChannel, DataChannel};
use crate::completion::CompletionHandler;
use crate::config::{ClockMask, EngineConfig};
use crate::dma::{CompletionSignal, DmaChannel};
use crate::edge_clock::{EdgeClock, EdgeClockGenerator, EdgeTiming};
use crate::error::Result;
use crate::frame::{check_length, scrub_clock_bits};
use crate::port::OutputPort;
use crate::state::{TransferPhase, TransferState};
use crate::time::Monotonic;

/// Peripherals one engine takes over.
#[derive(Debug)]
pub struct Hardware<P, D, C, S, E, K> {
    /// Combined 16-bit output port.
    pub port: P,
    /// Channel streaming the frame, triggered by edge A.
    pub data: D,
    /// Channel pulsing the clock lines, triggered by edge B.
    pub clock: C,
    /// Completion flag of `clock`.
    pub signal: S,
    /// Edge generator pacing both channels.
    pub edges: E,
    /// Time source shared by the gate and the completion handler.
    pub time: K,
}

/// Validate `config`, bring the pipeline up and split it into the gate and
/// the completion handler.
///
/// The port is driven to its idle level, both channels are programmed but
/// left stopped, and the edge generator is started free-running. Bind the
/// returned handler to the clock channel's completion interrupt before the
/// first [`TransferGate::show`].
pub fn init<'a, P, D, C, S, E, K>(
    config: &EngineConfig,
    state: &'a TransferState,
    hardware: Hardware<P, D, C, S, E, K>,
) -> Result<(TransferGate<'a, D, C, E, K>, CompletionHandler<'a, P, S, K>)>
where
    P: OutputPort,
    D: DmaChannel,
    C: DmaChannel,
    S: CompletionSignal,
    E: EdgeClock,
    K: Monotonic + Clone,
{
    let timing = config.validate()?;
    let Hardware {
        port,
        data,
        clock,
        signal,
        edges,
        time,
    } = hardware;

    #[allow(clippy::cast_possible_truncation)]
    let words = config.words() as u16;

    state.reset();
    let mut handler = CompletionHandler::new(
        state,
        port,
        signal,
        time.clone(),
        config.clock_mask.idle_word(),
    );
    handler.restore_idle();

    let mut data = DataChannel::new(data, words);
    let mut clock = ClockChannel::new(clock, config.clock_mask, words);
    data.stop();
    clock.stop();
    data.begin();
    clock.begin();

    let mut edges = EdgeClockGenerator::new(edges, timing);
    edges.begin();

    #[cfg(feature = "esp32-log")]
    println!(
        "[hexstrip] init: {} words/frame, clock mask {:#06x}, {} Hz",
        words,
        config.clock_mask.bits(),
        timing.frequency_hz()
    );

    let gate = TransferGate {
        state,
        clock_mask: config.clock_mask,
        skip_clear: config.skip_clear,
        words: config.words(),
        latch_delay: config.latch_delay,
        data,
        clock,
        edges,
        time,
    };
    Ok((gate, handler))
}

/// Starts frames and reports whether the engine is free.
///
/// At most one frame is in flight: a submit waits for the previous frame's
/// completion interrupt, and the edge generator is only released once the
/// previous frame's latch interval has passed.
///
/// All waits spin. A tick is a few hundred nanoseconds and the latch
/// interval one millisecond, well below what a scheduler round trip costs.
pub struct TransferGate<'a, D, C, E, K> {
    state: &'a TransferState,
    clock_mask: ClockMask,
    skip_clear: bool,
    words: usize,
    latch_delay: Duration,
    data: DataChannel<D>,
    clock: ClockChannel<C>,
    edges: EdgeClockGenerator<E>,
    time: K,
}

impl<D, C, E, K> TransferGate<'_, D, C, E, K>
where
    D: DmaChannel,
    C: DmaChannel,
    E: EdgeClock,
    K: Monotonic,
{
    /// Clock `frame` out and return once the strips have latched it.
    ///
    /// Unless the engine was built with `skip_clear`, the clock bits of every
    /// word in `frame` are cleared in place first and stay cleared.
    pub fn show(&mut self, frame: &mut [u16]) -> Result<()> {
        check_length(frame, self.words)?;
        self.launch(frame);
        self.wait_idle();
        Ok(())
    }

    /// Start clocking `frame` out and return while the hardware streams it.
    ///
    /// # Safety
    ///
    /// The channels keep reading `frame` after this returns. The caller must
    /// keep it alive and unmodified until [`busy`](Self::busy) reports
    /// `false`.
    pub unsafe fn start(&mut self, frame: &mut [u16]) -> Result<()> {
        check_length(frame, self.words)?;
        self.launch(frame);
        Ok(())
    }

    /// `true` while a frame is active or its latch interval is running.
    pub fn busy(&self) -> bool {
        self.phase() != TransferPhase::Idle
    }

    pub fn phase(&self) -> TransferPhase {
        self.state.phase(self.time.now(), self.latch_delay)
    }

    /// Spin until the last frame is out and latched.
    pub fn wait_idle(&self) {
        while self.busy() {
            core::hint::spin_loop();
        }
    }

    /// Words (ticks) per frame.
    pub const fn words(&self) -> usize {
        self.words
    }

    pub const fn clock_mask(&self) -> ClockMask {
        self.clock_mask
    }

    pub const fn timing(&self) -> &EdgeTiming {
        self.edges.timing()
    }

    fn launch(&mut self, frame: &mut [u16]) {
        while !self.state.try_activate() {
            core::hint::spin_loop();
        }

        if !self.skip_clear {
            scrub_clock_bits(frame, self.clock_mask);
        }
        self.data.arm(frame);

        self.edges.prepare_frame();
        self.data.start();
        self.clock.start();

        #[cfg(feature = "esp32-log")]
        println!("[TransferGate.launch] {} words armed", self.words);

        self.wait_latch();
        self.edges.release();
    }

    fn wait_latch(&self) {
        let zero = Duration::from_ticks(0);
        while self.state.latch_remaining(self.time.now(), self.latch_delay) > zero {
            core::hint::spin_loop();
        }
    }
}
