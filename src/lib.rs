//! Neurascreen - On-device behavioral scoring engine for ADHD screening sessions
//!
//! Neurascreen turns raw task performance, camera-derived face metrics, and
//! phone motion-sensor streams into calibrated screening scores through a
//! deterministic pipeline: motion signal processing → factor evaluation →
//! domain scoring → session aggregation → report encoding.
//!
//! ## Modules
//!
//! - **Motion**: Denoise ~50 Hz accelerometer/gyroscope streams into movement metrics
//! - **Scoring**: Fold one task's evaluated signals into domain scores and markers
//! - **Aggregation**: Merge a battery of tasks into one composite assessment
//!
//! The output is a screening aid, not a diagnosis.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod markers;
pub mod motion;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod session;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregate::SessionAggregator;
pub use config::{CalibrationConfig, CALIBRATION_VERSION};
pub use error::ScoringError;
pub use report::{ReportEncoder, ScreeningReport, REPORT_VERSION};
pub use scoring::DomainScorer;
pub use session::{score_recorded, ScreeningEngine, TaskSession};

// Motion exports
pub use motion::{MotionMetrics, MotionSample, MotionSignalProcessor, SharedMotionProcessor};

// Schema exports
pub use schema::{RecordedSession, SCHEMA_VERSION};

pub use types::{
    BehavioralMarker, CompositeResult, FaceMetrics, PerformanceMetrics, ScoringResult, TaskKind,
};

/// Engine version embedded in all report payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "neurascreen";
