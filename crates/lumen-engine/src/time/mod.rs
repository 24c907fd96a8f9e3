//! Time subsystem.
//!
//! Frame pacing and frame-time statistics for the render loop.
//! - `FrameClock` is owned and mutated by the render thread only
//! - `ClockHandle` is the cloneable, thread-safe view used everywhere else
//!   (pause toggle, counters, last published stats)
//!
//! Every pacing query takes the current `Instant` as an argument so tests can
//! drive the clock with synthetic time.

mod frame_clock;
mod stats;

pub use frame_clock::{interval_for_rate, ClockHandle, FrameClock};
pub use stats::FrameStats;
