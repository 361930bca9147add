//! Motion stream types

use serde::{Deserialize, Serialize};

/// One raw inertial sample.
///
/// Accelerometer samples carry linear acceleration (m/s^2). Gyroscope
/// samples use the same shape with angular rates (rad/s) and travel in a
/// separate stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Sample timestamp (ms, monotonic within a stream)
    pub timestamp_ms: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MotionSample {
    pub fn new(timestamp_ms: u64, x: f32, y: f32, z: f32) -> Self {
        Self { timestamp_ms, x, y, z }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A filtered sample promoted over the noise floor.
///
/// `dx`/`dy`/`dz` are the per-axis deltas of the moving-average output
/// between consecutive filter steps; `magnitude` is their Euclidean norm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    pub timestamp_ms: u64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub magnitude: f64,
}

/// Intensity classification of one motion event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityBand {
    Fidget,
    Medium,
    Large,
    Sudden,
}

/// Derived movement metrics for one tracking session.
///
/// Scores are 0-100, counts are debounced and capped, and
/// `movement_intensity` stays in physical units (m/s^2). The all-zero
/// default stands in when fewer than the minimum number of events were
/// buffered; callers must read it as a valid low-confidence answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionMetrics {
    /// Repetitive, small-amplitude movement (0-100)
    pub fidgeting_score: f64,
    /// Severity-weighted movement volume across all bands (0-100)
    pub general_movement_score: f64,
    /// Debounced direction changes, capped per session
    pub direction_changes: u32,
    /// Debounced sudden movements, capped per session
    pub sudden_movements: u32,
    /// Mean event magnitude (m/s^2)
    pub movement_intensity: f64,
    /// Blend of large-movement, sudden, and direction-change activity (0-100)
    pub restlessness: f64,
}
