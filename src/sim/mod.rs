//! Software stand-in for the engine's peripherals.
//!
//! [`SimBus`] models the port, two transfer channels, the edge generator and
//! a time source on one simulated timeline with nanosecond resolution.
//! Every port access is recorded as a [`PortEvent`], so tests and previews
//! can check exactly what the strips would have seen.
//!
//! By default the pipeline runs to completion as soon as the edge generator
//! is released and the completion interrupt is dispatched right away. With
//! [`SimBus::set_autorun`] off, the pipeline waits for [`SimBus::run_pending`]
//! instead, which lets a caller observe the engine mid-frame.

use core::cell::RefCell;

use embassy_time::Instant;
use heapless::Vec;

use crate::completion::{InterruptHandler, InterruptSlot};
use crate::dma::{CompletionSignal, Destination, DmaChannel, Source, TransferDescriptor, Trigger};
use crate::edge_clock::{EdgeClock, EdgeTiming};
use crate::gate::Hardware;
use crate::port::OutputPort;
use crate::time::Monotonic;

/// Longest pass, in words, a simulated channel can model. Programming a
/// longer pass panics.
pub const SIM_MAX_WORDS: usize = 1024;

/// Port events kept before further ones are dropped. Room for every data
/// write and clock pulse of a [`SIM_MAX_WORDS`] frame plus the CPU writes
/// around it.
pub const TRACE_CAPACITY: usize = 2 * SIM_MAX_WORDS + 16;

/// Simulated time one clock read takes.
pub const DEFAULT_POLL_NANOS: u64 = 250;

/// Channel slots on the bus.
pub const CHANNELS: usize = 2;

/// Slot [`SimBus::hardware`] uses for the data channel.
pub const DATA_CHANNEL: usize = 0;

/// Slot [`SimBus::hardware`] uses for the clock channel.
pub const CLOCK_CHANNEL: usize = 1;

/// Who touched the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writer {
    Cpu,
    Dma(u8),
}

/// Which port register was written, and with what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAccess {
    Write(u16),
    Set(u16),
}

/// One recorded port access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortEvent {
    pub at_nanos: u64,
    /// Edge generator cycle that caused the access; `None` for CPU writes
    /// and for stale edges firing on release.
    pub tick: Option<u32>,
    pub writer: Writer,
    pub access: PortAccess,
    /// Port level right after the access.
    pub level: u16,
}

#[derive(Debug, Default)]
struct SimChannel {
    descriptor: Option<TransferDescriptor>,
    source: Vec<u16, SIM_MAX_WORDS>,
    cursor: usize,
    remaining: u16,
    enabled: bool,
    done: bool,
}

impl SimChannel {
    /// Serve one hardware request. Returns the port access and whether the
    /// pass ended with an interrupt.
    fn request(&mut self, trigger: Trigger) -> Option<(PortAccess, bool)> {
        let descriptor = self.descriptor?;
        if !self.enabled || descriptor.trigger != trigger {
            return None;
        }
        let word = match descriptor.source {
            Source::Frame => match self.source.get(self.cursor) {
                Some(&word) => word,
                None => panic!("simulated channel ran past its {}-word source", self.source.len()),
            },
            Source::Constant(word) => word,
        };
        self.cursor += 1;
        self.remaining = self.remaining.saturating_sub(1);

        let mut interrupt = false;
        if self.remaining == 0 {
            self.cursor = 0;
            self.remaining = descriptor.major_count;
            if descriptor.disable_on_completion {
                self.enabled = false;
            }
            if descriptor.interrupt_on_completion {
                self.done = true;
                interrupt = true;
            }
        }

        let access = match descriptor.destination {
            Destination::PortData => PortAccess::Write(word),
            Destination::PortSet => PortAccess::Set(word),
        };
        Some((access, interrupt))
    }

    fn stops_by_itself(&self) -> bool {
        self.enabled && self.descriptor.is_some_and(|d| d.disable_on_completion)
    }
}

#[derive(Debug, Default)]
struct SimEdges {
    timing: Option<EdgeTiming>,
    running: bool,
    flag_a: bool,
    flag_b: bool,
}

#[derive(Debug)]
struct Bus {
    now_nanos: u64,
    poll_nanos: u64,
    autorun: bool,
    level: u16,
    trace: Vec<PortEvent, TRACE_CAPACITY>,
    dropped: usize,
    channels: [SimChannel; CHANNELS],
    edges: SimEdges,
}

impl Bus {
    fn record(&mut self, writer: Writer, access: PortAccess, tick: Option<u32>) {
        self.level = match access {
            PortAccess::Write(word) => word,
            PortAccess::Set(mask) => self.level | mask,
        };
        let event = PortEvent {
            at_nanos: self.now_nanos,
            tick,
            writer,
            access,
            level: self.level,
        };
        if self.trace.push(event).is_err() {
            self.dropped += 1;
        }
    }

    fn fire(&mut self, trigger: Trigger, tick: Option<u32>) -> bool {
        let mut interrupt = false;
        for index in 0..CHANNELS {
            let Some((access, done)) = self.channels[index].request(trigger) else {
                continue;
            };
            #[allow(clippy::cast_possible_truncation)]
            self.record(Writer::Dma(index as u8), access, tick);
            interrupt |= done;
        }
        interrupt
    }

    /// Run the released pipeline until every self-stopping channel is done.
    fn run(&mut self) -> bool {
        let Some(timing) = self.edges.timing else {
            return false;
        };
        if !self.edges.running {
            return false;
        }

        // Edges latched while nobody listened fire as soon as a channel does.
        let mut interrupt = false;
        if self.edges.flag_a {
            interrupt |= self.fire(Trigger::EdgeA, None);
        }
        if self.edges.flag_b {
            interrupt |= self.fire(Trigger::EdgeB, None);
        }

        let start = self.now_nanos;
        let mut tick = 0;
        while self.channels.iter().any(SimChannel::stops_by_itself) {
            self.now_nanos = start + timing.edge_a_nanos(tick);
            interrupt |= self.fire(Trigger::EdgeA, Some(tick));
            self.now_nanos = start + timing.edge_b_nanos(tick);
            interrupt |= self.fire(Trigger::EdgeB, Some(tick));
            tick += 1;
        }

        // The generator keeps running; its next edges latch with nobody listening.
        self.edges.flag_a = true;
        self.edges.flag_b = true;
        interrupt
    }
}

/// Shared simulated hardware. Hand out peripherals with the accessor methods.
#[derive(Debug)]
pub struct SimBus {
    inner: RefCell<Bus>,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Bus {
                now_nanos: 0,
                poll_nanos: DEFAULT_POLL_NANOS,
                autorun: true,
                level: 0,
                trace: Vec::new(),
                dropped: 0,
                channels: [SimChannel::default(), SimChannel::default()],
                edges: SimEdges::default(),
            }),
        }
    }

    pub const fn port(&self) -> SimPort<'_> {
        SimPort { bus: self }
    }

    pub const fn dma(&self, index: usize) -> SimDma<'_> {
        SimDma { bus: self, index }
    }

    pub const fn signal(&self, index: usize) -> SimSignal<'_> {
        SimSignal { bus: self, index }
    }

    pub const fn clock(&self) -> SimClock<'_> {
        SimClock { bus: self }
    }

    /// Edge generator that dispatches `slot` when a pass ends with an interrupt.
    pub const fn edge_clock<'a, 's, H>(
        &'a self,
        slot: &'s InterruptSlot<H>,
    ) -> SimEdgeClock<'a, 's, H> {
        SimEdgeClock { bus: self, slot }
    }

    /// Full peripheral set for [`init`](crate::init), data channel in slot
    /// [`DATA_CHANNEL`] and clock channel in slot [`CLOCK_CHANNEL`].
    ///
    /// # Panics
    ///
    /// [`init`](crate::init) panics when handed this hardware with a frame
    /// longer than [`SIM_MAX_WORDS`] words.
    #[allow(clippy::type_complexity)]
    pub const fn hardware<'a, 's, H>(
        &'a self,
        slot: &'s InterruptSlot<H>,
    ) -> Hardware<
        SimPort<'a>,
        SimDma<'a>,
        SimDma<'a>,
        SimSignal<'a>,
        SimEdgeClock<'a, 's, H>,
        SimClock<'a>,
    > {
        Hardware {
            port: self.port(),
            data: self.dma(DATA_CHANNEL),
            clock: self.dma(CLOCK_CHANNEL),
            signal: self.signal(CLOCK_CHANNEL),
            edges: self.edge_clock(slot),
            time: self.clock(),
        }
    }

    /// Run the pipeline on release (the default) or only on [`run_pending`](Self::run_pending).
    pub fn set_autorun(&self, autorun: bool) {
        self.inner.borrow_mut().autorun = autorun;
    }

    /// Simulated time each clock read takes.
    pub fn set_poll_nanos(&self, nanos: u64) {
        self.inner.borrow_mut().poll_nanos = nanos;
    }

    /// Run a released pipeline by hand. Returns `true` when the pass ended
    /// with the completion interrupt, which the caller then dispatches.
    pub fn run_pending(&self) -> bool {
        self.inner.borrow_mut().run()
    }

    pub fn now_nanos(&self) -> u64 {
        self.inner.borrow().now_nanos
    }

    pub fn advance(&self, nanos: u64) {
        self.inner.borrow_mut().now_nanos += nanos;
    }

    /// Current port level.
    pub fn level(&self) -> u16 {
        self.inner.borrow().level
    }

    pub fn with_trace<R>(&self, f: impl FnOnce(&[PortEvent]) -> R) -> R {
        f(self.inner.borrow().trace.as_slice())
    }

    pub fn clear_trace(&self) {
        let mut bus = self.inner.borrow_mut();
        bus.trace.clear();
        bus.dropped = 0;
    }

    /// Events lost since the trace filled up.
    pub fn dropped_events(&self) -> usize {
        self.inner.borrow().dropped
    }

    /// Latched edge A and edge B flags.
    pub fn pending_edges(&self) -> (bool, bool) {
        let bus = self.inner.borrow();
        (bus.edges.flag_a, bus.edges.flag_b)
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().edges.running
    }

    pub fn interrupt_pending(&self, index: usize) -> bool {
        self.inner.borrow().channels[index].done
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated 16-bit port. Accesses through it are recorded as [`Writer::Cpu`].
#[derive(Debug, Clone, Copy)]
pub struct SimPort<'a> {
    bus: &'a SimBus,
}

impl OutputPort for SimPort<'_> {
    fn write(&mut self, word: u16) {
        self.bus
            .inner
            .borrow_mut()
            .record(Writer::Cpu, PortAccess::Write(word), None);
    }

    fn set(&mut self, mask: u16) {
        self.bus
            .inner
            .borrow_mut()
            .record(Writer::Cpu, PortAccess::Set(mask), None);
    }
}

/// Simulated transfer channel.
///
/// Unlike real hardware it snapshots the source words when bound. Passes
/// and sources longer than [`SIM_MAX_WORDS`] are refused with a panic.
#[derive(Debug, Clone, Copy)]
pub struct SimDma<'a> {
    bus: &'a SimBus,
    index: usize,
}

impl DmaChannel for SimDma<'_> {
    fn configure(&mut self, descriptor: &TransferDescriptor) {
        let words = usize::from(descriptor.major_count);
        assert!(
            words <= SIM_MAX_WORDS,
            "simulated channel models at most {SIM_MAX_WORDS} words per pass, got {words}"
        );
        let mut bus = self.bus.inner.borrow_mut();
        let channel = &mut bus.channels[self.index];
        channel.descriptor = Some(*descriptor);
        channel.remaining = descriptor.major_count;
        channel.cursor = 0;
    }

    fn set_source(&mut self, words: &[u16]) {
        let mut bus = self.bus.inner.borrow_mut();
        let channel = &mut bus.channels[self.index];
        channel.source.clear();
        if channel.source.extend_from_slice(words).is_err() {
            panic!(
                "simulated channel holds at most {SIM_MAX_WORDS} source words, got {}",
                words.len()
            );
        }
        channel.cursor = 0;
    }

    fn enable(&mut self) {
        let mut bus = self.bus.inner.borrow_mut();
        let channel = &mut bus.channels[self.index];
        channel.enabled = channel.descriptor.is_some();
    }

    fn disable(&mut self) {
        self.bus.inner.borrow_mut().channels[self.index].enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.bus.inner.borrow().channels[self.index].enabled
    }
}

/// Completion flag of a simulated channel.
#[derive(Debug, Clone, Copy)]
pub struct SimSignal<'a> {
    bus: &'a SimBus,
    index: usize,
}

impl CompletionSignal for SimSignal<'_> {
    fn clear(&mut self) {
        self.bus.inner.borrow_mut().channels[self.index].done = false;
    }
}

/// Simulated time. Every read costs [`DEFAULT_POLL_NANOS`] (see
/// [`SimBus::set_poll_nanos`]), so spin loops make progress.
#[derive(Debug, Clone, Copy)]
pub struct SimClock<'a> {
    bus: &'a SimBus,
}

impl Monotonic for SimClock<'_> {
    fn now(&self) -> Instant {
        let mut bus = self.bus.inner.borrow_mut();
        let poll = bus.poll_nanos;
        bus.now_nanos += poll;
        Instant::from_micros(bus.now_nanos / 1000)
    }
}

/// Simulated edge generator. Runs the pipeline when released and raises the
/// completion interrupt through its slot.
pub struct SimEdgeClock<'a, 's, H> {
    bus: &'a SimBus,
    slot: &'s InterruptSlot<H>,
}

impl<H: InterruptHandler> EdgeClock for SimEdgeClock<'_, '_, H> {
    fn configure(&mut self, timing: &EdgeTiming) {
        self.bus.inner.borrow_mut().edges.timing = Some(*timing);
    }

    fn halt(&mut self) {
        self.bus.inner.borrow_mut().edges.running = false;
    }

    fn rewind(&mut self) {
        // Cycles always start at the instant of release.
    }

    fn clear_edge_flags(&mut self) {
        let mut bus = self.bus.inner.borrow_mut();
        bus.edges.flag_a = false;
        bus.edges.flag_b = false;
    }

    fn release(&mut self) {
        let interrupt = {
            let mut bus = self.bus.inner.borrow_mut();
            bus.edges.running = true;
            bus.autorun && bus.run()
        };
        if interrupt {
            self.slot.dispatch();
        }
    }
}
