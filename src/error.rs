use derive_more::{Display, Error};

/// Errors reported while setting up the engine or submitting a frame.
///
/// Configuration problems surface from [`init`](crate::init); a frame of the
/// wrong length is rejected by [`TransferGate::show`](crate::TransferGate::show)
/// before any hardware is touched. The interrupt path has no error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum Error {
    /// The frame size in bytes is zero or odd.
    #[display("frame size must be a non-zero even number of bytes, got {buf_size}")]
    BufferSize { buf_size: usize },
    /// The frame needs more transfers than one channel pass can count.
    #[display("frame needs {words} transfers, a channel pass counts at most {max}")]
    BufferTooLarge { words: usize, max: usize },
    /// The clock mask selects no output line.
    #[display("clock mask selects no output line")]
    NoClockLine,
    /// The clock mask covers every output line, leaving no data line.
    #[display("clock mask leaves no data line")]
    NoDataLine,
    /// The line frequency is zero.
    #[display("line frequency must be non-zero")]
    ZeroFrequency,
    /// The edge timer is too slow to place edge A strictly before edge B.
    #[display("{frequency_hz} Hz is too fast for a {timer_hz} Hz edge timer")]
    FrequencyTooHigh { frequency_hz: u32, timer_hz: u32 },
    /// The submitted frame does not hold exactly one frame of words.
    #[display("frame holds {actual} words, engine expects {expected}")]
    FrameLength { expected: usize, actual: usize },
}

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;
