//! Process-wide transfer state shared by the gate and the completion handler.

use core::cell::Cell;

use critical_section::Mutex;
use embassy_time::{Duration, Instant};

/// Where the engine is in its Idle → Active → Latching → Idle cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// No frame pending, a new one may start.
    Idle,
    /// Channels armed, the frame is being clocked out.
    Active,
    /// Last clock pulse sent, strips are waiting out the latch interval.
    Latching,
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    active: bool,
    completed_at: Option<Instant>,
}

const IDLE: Snapshot = Snapshot {
    active: false,
    completed_at: None,
};

/// Active flag and completion timestamp of one engine.
///
/// Lives in a `static` so the completion interrupt can reach it. Only the
/// gate raises the flag and only the completion handler clears it.
#[derive(Debug)]
pub struct TransferState {
    inner: Mutex<Cell<Snapshot>>,
}

impl TransferState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(IDLE)),
        }
    }

    pub(crate) fn reset(&self) {
        critical_section::with(|cs| self.inner.borrow(cs).set(IDLE));
    }

    pub fn is_active(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow(cs).get().active)
    }

    /// Instant the last frame finished, if any frame has.
    pub fn completed_at(&self) -> Option<Instant> {
        critical_section::with(|cs| self.inner.borrow(cs).get().completed_at)
    }

    /// Raise the active flag unless it is already up.
    pub(crate) fn try_activate(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut snapshot = cell.get();
            if snapshot.active {
                return false;
            }
            snapshot.active = true;
            cell.set(snapshot);
            true
        })
    }

    /// Stamp the finished frame and drop the active flag.
    pub(crate) fn complete(&self, now: Instant) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).set(Snapshot {
                active: false,
                completed_at: Some(now),
            });
        });
    }

    /// Time left in the latch interval of the last finished frame.
    pub fn latch_remaining(&self, now: Instant, latch: Duration) -> Duration {
        let Some(completed_at) = self.completed_at() else {
            return Duration::from_ticks(0);
        };
        let elapsed = now.saturating_duration_since(completed_at);
        if elapsed >= latch {
            Duration::from_ticks(0)
        } else {
            latch - elapsed
        }
    }

    pub fn phase(&self, now: Instant, latch: Duration) -> TransferPhase {
        if self.is_active() {
            TransferPhase::Active
        } else if self.latch_remaining(now, latch) > Duration::from_ticks(0) {
            TransferPhase::Latching
        } else {
            TransferPhase::Idle
        }
    }
}

impl Default for TransferState {
    fn default() -> Self {
        Self::new()
    }
}
