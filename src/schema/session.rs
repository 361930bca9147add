//! screen.session.v1 schema definition
//!
//! A recorded screening session: the task's final performance counters,
//! the optional face-metrics snapshot, and the raw sensor streams needed
//! to replay motion analysis offline. Recordings are validated before
//! replay so corrupt files fail loudly instead of skewing scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::motion::MotionSample;
use crate::types::{FaceMetrics, PerformanceMetrics, TaskKind};

/// Current schema version
pub const SCHEMA_VERSION: &str = "screen.session.v1";

/// One recorded task session, replayable through the scoring pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSession {
    /// Schema version identifier
    pub schema_version: String,
    /// Unique session identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Wall-clock time the session was recorded (UTC)
    pub recorded_at: DateTime<Utc>,
    /// Task that was administered
    pub task: TaskKind,
    /// Final response counters
    pub performance: PerformanceMetrics,
    /// Face-metrics snapshot, absent when no camera was available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceMetrics>,
    /// Raw accelerometer stream (~50 Hz)
    #[serde(default)]
    pub accel_samples: Vec<MotionSample>,
    /// Raw gyroscope stream, absent on accelerometer-only devices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gyro_samples: Vec<MotionSample>,
}

impl RecordedSession {
    pub fn new(task: TaskKind, performance: PerformanceMetrics) -> Self {
        RecordedSession {
            schema_version: SCHEMA_VERSION.to_string(),
            session_id: Some(uuid::Uuid::new_v4().to_string()),
            recorded_at: Utc::now(),
            task,
            performance,
            face: None,
            accel_samples: Vec::new(),
            gyro_samples: Vec::new(),
        }
    }

    /// Attach a face-metrics snapshot
    pub fn with_face(mut self, face: FaceMetrics) -> Self {
        self.face = Some(face);
        self
    }

    /// Attach the accelerometer stream
    pub fn with_accel_samples(mut self, samples: Vec<MotionSample>) -> Self {
        self.accel_samples = samples;
        self
    }

    /// Attach the gyroscope stream
    pub fn with_gyro_samples(mut self, samples: Vec<MotionSample>) -> Self {
        self.gyro_samples = samples;
        self
    }

    /// Check structural invariants before replay
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ScoringError::UnsupportedVersion(
                self.schema_version.clone(),
            ));
        }
        if !self.performance.duration_seconds.is_finite()
            || self.performance.duration_seconds <= 0.0
        {
            return Err(ScoringError::InvalidSession(
                "session duration must be positive".to_string(),
            ));
        }
        for response_time in [
            self.performance.avg_response_time_ms,
            self.performance.response_time_std_dev_ms,
        ]
        .into_iter()
        .flatten()
        {
            if !response_time.is_finite() || response_time < 0.0 {
                return Err(ScoringError::InvalidSession(
                    "response times must be non-negative".to_string(),
                ));
            }
        }
        validate_stream(&self.accel_samples, "accelerometer")?;
        validate_stream(&self.gyro_samples, "gyroscope")?;
        Ok(())
    }

    /// Parse and validate a recorded session from JSON
    pub fn from_json(json: &str) -> Result<Self, ScoringError> {
        let session: RecordedSession =
            serde_json::from_str(json).map_err(|e| ScoringError::ParseError(e.to_string()))?;
        session.validate()?;
        Ok(session)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, ScoringError> {
        serde_json::to_string(self).map_err(ScoringError::from)
    }
}

fn validate_stream(samples: &[MotionSample], stream: &str) -> Result<(), ScoringError> {
    let mut last_timestamp: Option<u64> = None;
    for sample in samples {
        if !sample.is_finite() {
            return Err(ScoringError::InvalidSession(format!(
                "{stream} stream contains a non-finite sample"
            )));
        }
        if let Some(last) = last_timestamp {
            if sample.timestamp_ms < last {
                return Err(ScoringError::InvalidSession(format!(
                    "{stream} timestamps must be non-decreasing"
                )));
            }
        }
        last_timestamp = Some(sample.timestamp_ms);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn performance() -> PerformanceMetrics {
        PerformanceMetrics {
            correct: 24,
            incorrect: 3,
            missed: 4,
            avg_response_time_ms: Some(320.0),
            response_time_std_dev_ms: Some(90.0),
            duration_seconds: 60.0,
        }
    }

    fn samples(count: u64) -> Vec<MotionSample> {
        (0..count)
            .map(|i| MotionSample::new(i * 20, 0.1, 0.0, 9.81))
            .collect()
    }

    #[test]
    fn test_json_round_trip() {
        let session = RecordedSession::new(TaskKind::GoNoGo, performance())
            .with_accel_samples(samples(50))
            .with_gyro_samples(samples(50));
        let json = session.to_json().unwrap();
        let parsed = RecordedSession::from_json(&json).unwrap();
        assert_eq!(parsed.schema_version, SCHEMA_VERSION);
        assert_eq!(parsed.task, TaskKind::GoNoGo);
        assert_eq!(parsed.session_id, session.session_id);
        assert_eq!(parsed.performance.correct, 24);
        assert_eq!(parsed.accel_samples.len(), 50);
        assert_eq!(parsed.gyro_samples.len(), 50);
    }

    #[test]
    fn test_deserialize_minimal_session() {
        let json = r#"{
            "schema_version": "screen.session.v1",
            "recorded_at": "2026-03-02T09:15:00Z",
            "task": "continuous_performance",
            "performance": {
                "correct": 18,
                "incorrect": 2,
                "missed": 1,
                "avg_response_time_ms": 410.0,
                "response_time_std_dev_ms": null,
                "duration_seconds": 120.0
            }
        }"#;
        let session = RecordedSession::from_json(json).unwrap();
        assert_eq!(session.task, TaskKind::ContinuousPerformance);
        assert_eq!(session.session_id, None);
        assert!(session.face.is_none());
        assert!(session.accel_samples.is_empty());
        assert!(session.gyro_samples.is_empty());
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let mut session = RecordedSession::new(TaskKind::Reading, performance());
        session.schema_version = "screen.session.v2".to_string();
        assert!(matches!(
            session.validate(),
            Err(ScoringError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let mut session = RecordedSession::new(TaskKind::Reading, performance());
        session.performance.duration_seconds = 0.0;
        assert!(matches!(
            session.validate(),
            Err(ScoringError::InvalidSession(_))
        ));
    }

    #[test]
    fn test_rejects_negative_response_time() {
        let mut session = RecordedSession::new(TaskKind::Reading, performance());
        session.performance.avg_response_time_ms = Some(-15.0);
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_rejects_corrupt_motion_stream() {
        let mut session = RecordedSession::new(TaskKind::Reading, performance())
            .with_accel_samples(samples(10));
        session.accel_samples[4].x = f32::NAN;
        assert!(session.validate().is_err());

        let mut shuffled = RecordedSession::new(TaskKind::Reading, performance())
            .with_accel_samples(samples(10));
        shuffled.accel_samples[7].timestamp_ms = 0;
        assert!(matches!(
            shuffled.validate(),
            Err(ScoringError::InvalidSession(_))
        ));
    }
}
