//! Zero-copy output engine for clocked LED strips (WS2801 style).
//!
//! Up to fifteen strips share one clock wire; every other line of a 16-bit
//! port carries one strip's data. A free-running edge generator paces two
//! transfer channels: on edge A of each cycle the data channel writes the
//! next frame word to the port, on edge B the clock channel raises the clock
//! line. The CPU only arms the channels and waits out the latch interval.
//!
//! Hardware is reached through traits ([`OutputPort`], [`DmaChannel`],
//! [`EdgeClock`], [`Monotonic`]). With the `sim` feature, the `sim` module
//! implements them in software for host tests and previews.
#![no_std]

pub mod channel;
pub mod completion;
pub mod config;
pub mod dma;
pub mod edge_clock;
mod error;
pub mod frame;
pub mod gate;
pub mod port;
#[cfg(feature = "sim")]
pub mod sim;
pub mod state;
pub mod time;

pub use completion::{CompletionHandler, InterruptHandler, InterruptSlot};
pub use config::{ClockMask, EngineConfig, LATCH_DELAY, MAX_STRIPS};
pub use dma::{CompletionSignal, DmaChannel, TransferDescriptor};
pub use edge_clock::{EdgeClock, EdgeTiming};
pub use error::{Error, Result};
pub use gate::{Hardware, TransferGate, init};
pub use port::{BytePort, OutputPort, PortPair};
pub use state::{TransferPhase, TransferState};
pub use time::{Monotonic, SystemClock};

pub use embassy_time::{Duration, Instant};
