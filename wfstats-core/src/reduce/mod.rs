//! Memory-bounded reducers that turn run and job records into statistics.
//!
//! Reducers take `&mut self` and hold no locks; concurrent callers wrap them
//! in whatever serialization they need.

mod jobs;
mod runs;
mod sample;

pub use jobs::JobReducer;
pub use runs::RunReducer;
pub use sample::{SampleBuffer, SampleLimits, SampleUsage, DEFAULT_SAMPLE_LIMIT};
