//! Report encoding
//!
//! Encodes a completed screening battery into the versioned
//! screen.report.v1 JSON payload consumed by reviewing clinicians. The
//! payload carries the per-task results, the composite assessment, and
//! enough provenance (engine version, calibration version, instance id)
//! to reproduce the scores later.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CalibrationConfig;
use crate::error::ScoringError;
use crate::types::{CompositeResult, ScoringResult};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "screen.report.v1";

/// Identifies the engine build that produced a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// The screen.report.v1 payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// Report schema version identifier
    pub report_version: String,
    /// Engine build that produced this report
    pub producer: ReportProducer,
    /// Version of the calibration table the scores were computed against
    pub calibration_version: String,
    /// Wall-clock time the report was generated (RFC 3339, UTC)
    pub generated_at_utc: String,
    /// Per-task results in completion order
    pub tasks: Vec<ScoringResult>,
    /// Composite assessment over all tasks
    pub composite: CompositeResult,
}

/// Report encoder for producing screen.report.v1 payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a battery's results into a report payload
    pub fn encode(
        &self,
        tasks: &[ScoringResult],
        composite: &CompositeResult,
        calibration: &CalibrationConfig,
    ) -> ScreeningReport {
        ScreeningReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            calibration_version: calibration.version.clone(),
            generated_at_utc: Utc::now().to_rfc3339(),
            tasks: tasks.to_vec(),
            composite: composite.clone(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        tasks: &[ScoringResult],
        composite: &CompositeResult,
        calibration: &CalibrationConfig,
    ) -> Result<String, ScoringError> {
        let report = self.encode(tasks, composite, calibration);
        serde_json::to_string_pretty(&report).map_err(ScoringError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SessionAggregator;
    use crate::types::{BehavioralMarker, TaskKind};

    fn make_test_results() -> Vec<ScoringResult> {
        vec![
            ScoringResult {
                task: TaskKind::ContinuousPerformance,
                adhd_probability_score: 42.0,
                attention_score: 55.0,
                hyperactivity_score: 30.0,
                impulsivity_score: 35.0,
                confidence_level: 68.0,
                markers: vec![BehavioralMarker {
                    name: "missed_responses".to_string(),
                    value: 0.31,
                    threshold: 0.30,
                    significance: 2,
                    description: "Missed 31% of expected responses".to_string(),
                }],
                duration_ms: 120_000,
            },
            ScoringResult {
                task: TaskKind::GoNoGo,
                adhd_probability_score: 38.0,
                attention_score: 40.0,
                hyperactivity_score: 30.0,
                impulsivity_score: 45.0,
                confidence_level: 64.0,
                markers: Vec::new(),
                duration_ms: 90_000,
            },
        ]
    }

    #[test]
    fn test_encode_report_payload() {
        let results = make_test_results();
        let composite = SessionAggregator::default().combine(&results);
        let calibration = CalibrationConfig::default();

        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&results, &composite, &calibration);

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.version, ENGINE_VERSION);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.calibration_version, calibration.version);
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.composite.tasks_completed, 2);
        assert!(
            chrono::DateTime::parse_from_rfc3339(&report.generated_at_utc).is_ok(),
            "generated_at_utc must be RFC 3339"
        );
    }

    #[test]
    fn test_encode_to_json() {
        let results = make_test_results();
        let composite = SessionAggregator::default().combine(&results);
        let calibration = CalibrationConfig::default();

        let encoder = ReportEncoder::new();
        let json = encoder
            .encode_to_json(&results, &composite, &calibration)
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["report_version"], "screen.report.v1");
        assert!(parsed.get("producer").is_some());
        assert!(parsed.get("composite").is_some());
        assert_eq!(parsed["tasks"].as_array().unwrap().len(), 2);
        assert!(json.contains("missed_responses"));
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let results = make_test_results();
        let composite = SessionAggregator::default().combine(&results);
        let calibration = CalibrationConfig::default();

        let json = ReportEncoder::new()
            .encode_to_json(&results, &composite, &calibration)
            .unwrap();
        let parsed: ScreeningReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tasks, results);
        assert_eq!(parsed.composite, composite);
    }
}
