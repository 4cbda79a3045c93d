//! Free-running edge generator that paces both transfer channels.
//!
//! Every cycle produces edge A early in the period and edge B later. The
//! data channel moves on edge A, the clock channel on edge B, so the data
//! word is settled on the port before the clock line rises.

use crate::error::{Error, Result};

/// Position of edge A within a cycle, in percent of the period.
pub const EDGE_A_PERCENT: u32 = 20;

/// Position of edge B within a cycle, in percent of the period.
pub const EDGE_B_PERCENT: u32 = 50;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Counter values for one cycle of the edge generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTiming {
    timer_hz: u32,
    period: u32,
    edge_a: u32,
    edge_b: u32,
}

impl EdgeTiming {
    /// Timing for a `frequency_hz` line rate on a timer clocked at `timer_hz`.
    ///
    /// Fails when the timer cannot place edge A after the start of the cycle
    /// and strictly before edge B.
    pub fn new(frequency_hz: u32, timer_hz: u32) -> Result<Self> {
        if frequency_hz == 0 {
            return Err(Error::ZeroFrequency);
        }
        let period = timer_hz / frequency_hz;
        let edge_a = percent_of(period, EDGE_A_PERCENT);
        let edge_b = percent_of(period, EDGE_B_PERCENT);
        if edge_a == 0 || edge_b <= edge_a {
            return Err(Error::FrequencyTooHigh {
                frequency_hz,
                timer_hz,
            });
        }
        Ok(Self {
            timer_hz,
            period,
            edge_a,
            edge_b,
        })
    }

    pub const fn timer_hz(&self) -> u32 {
        self.timer_hz
    }

    /// Timer counts per cycle (the counter modulo).
    pub const fn period_counts(&self) -> u32 {
        self.period
    }

    pub const fn edge_a_count(&self) -> u32 {
        self.edge_a
    }

    pub const fn edge_b_count(&self) -> u32 {
        self.edge_b
    }

    /// Line rate actually produced, after integer division of the timer clock.
    pub const fn frequency_hz(&self) -> u32 {
        self.timer_hz / self.period
    }

    /// Convert timer counts to nanoseconds.
    pub const fn counts_to_nanos(&self, counts: u64) -> u64 {
        let nanos = counts as u128 * NANOS_PER_SECOND as u128 / self.timer_hz as u128;
        nanos as u64
    }

    pub const fn period_nanos(&self) -> u64 {
        self.counts_to_nanos(self.period as u64)
    }

    /// Time from edge A to edge B: how long a data word sits on the port
    /// before the clock line rises.
    pub const fn settle_nanos(&self) -> u64 {
        self.counts_to_nanos((self.edge_b - self.edge_a) as u64)
    }

    /// Offset of edge A of cycle `tick`, counted from a rewound counter.
    pub const fn edge_a_nanos(&self, tick: u32) -> u64 {
        self.counts_to_nanos(tick as u64 * self.period as u64 + self.edge_a as u64)
    }

    /// Offset of edge B of cycle `tick`, counted from a rewound counter.
    pub const fn edge_b_nanos(&self, tick: u32) -> u64 {
        self.counts_to_nanos(tick as u64 * self.period as u64 + self.edge_b as u64)
    }

    /// Time to clock out `words` ticks.
    pub const fn frame_nanos(&self, words: u32) -> u64 {
        self.counts_to_nanos(words as u64 * self.period as u64)
    }
}

const fn percent_of(value: u32, percent: u32) -> u32 {
    (value as u64 * percent as u64 / 100) as u32
}

/// Hardware behind the edge generator: a PWM timer plus the two pin-change
/// detectors that turn its edges into transfer requests.
pub trait EdgeClock {
    /// Program the period and both edge positions.
    fn configure(&mut self, timing: &EdgeTiming);

    /// Stop the counter.
    fn halt(&mut self);

    /// Park the counter at the end of its cycle, so the first edge after
    /// [`release`](Self::release) is edge A of a fresh cycle.
    fn rewind(&mut self);

    /// Drop edge-detect flags latched while no transfer was running.
    fn clear_edge_flags(&mut self);

    /// Let the counter run.
    fn release(&mut self);
}

/// The edge generator as the gate drives it.
#[derive(Debug)]
pub struct EdgeClockGenerator<E> {
    clock: E,
    timing: EdgeTiming,
}

impl<E: EdgeClock> EdgeClockGenerator<E> {
    pub const fn new(clock: E, timing: EdgeTiming) -> Self {
        Self { clock, timing }
    }

    pub const fn timing(&self) -> &EdgeTiming {
        &self.timing
    }

    /// Program the timer and start it free-running.
    pub fn begin(&mut self) {
        self.clock.configure(&self.timing);
        self.clock.release();
    }

    /// Stop on a cycle boundary with no stale edges pending.
    pub fn prepare_frame(&mut self) {
        self.clock.halt();
        self.clock.rewind();
        self.clock.clear_edge_flags();
    }

    pub fn release(&mut self) {
        self.clock.release();
    }
}
