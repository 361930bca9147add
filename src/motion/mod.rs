//! Accelerometer and gyroscope analysis
//!
//! The motion pipeline denoises raw ~50 Hz sensor streams, promotes
//! significant filtered deltas to events, and derives the movement metrics
//! the scoring layer consumes: fidgeting, restlessness, debounced
//! direction-change and sudden-movement counts, and mean intensity.

mod filter;

pub mod processor;
pub mod shared;
pub mod types;

pub use processor::MotionSignalProcessor;
pub use shared::SharedMotionProcessor;
pub use types::{IntensityBand, MotionEvent, MotionMetrics, MotionSample};
