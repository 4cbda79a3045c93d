//! The two transfer channels of one engine.
//!
//! Both run the same number of passes per frame and are always armed and
//! stopped together by the gate.

mod clock;
mod data;

pub use clock::ClockChannel;
pub use data::DataChannel;
