//! Time source used for the latch interval and completion timestamps.

use embassy_time::Instant;

/// Monotonic time source.
///
/// The gate polls it while spinning out the latch interval and the
/// completion handler stamps each finished frame with it, so it must be
/// cheap and callable from interrupt context.
pub trait Monotonic {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// [`Monotonic`] backed by the `embassy-time` driver of the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Monotonic for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Monotonic + ?Sized> Monotonic for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
