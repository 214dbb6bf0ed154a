//! Engine module housing the sampling loop.
//!
//! `clock` provides injectable time, `cadence` the tick interval and publish
//! throttle, `ticker` a single analysis step over an open capture handle, and
//! `sampling_loop` the start/stop lifecycle that runs ticks on a worker.

pub mod cadence;
pub mod clock;
pub mod sampling_loop;
pub mod ticker;

pub use cadence::{Cadence, Throttle};
pub use clock::{ManualClock, SystemTimeSource, TimeSource};
pub use sampling_loop::{SamplingLoop, READING_CHANNEL_CAPACITY};
pub use ticker::Ticker;
