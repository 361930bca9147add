//! Core types for the Neurascreen scoring engine
//!
//! This module defines the data structures that flow through the scoring
//! pipeline: external metric inputs, behavioral markers, per-task scoring
//! results, and the composite assessment.

use serde::{Deserialize, Serialize};

/// Cognitive task that produced a session's metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ContinuousPerformance,
    GoNoGo,
    WorkingMemory,
    Reading,
    AttentionShifting,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ContinuousPerformance => "continuous_performance",
            TaskKind::GoNoGo => "go_no_go",
            TaskKind::WorkingMemory => "working_memory",
            TaskKind::Reading => "reading",
            TaskKind::AttentionShifting => "attention_shifting",
        }
    }
}

/// Final response counters for one completed task session.
///
/// The two response-time fields are optional because some tasks (reading)
/// structurally cannot measure per-trial response times. `None` means the
/// signal is absent from scoring, never that it was zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Correct responses
    pub correct: u32,
    /// Incorrect responses (commission errors)
    pub incorrect: u32,
    /// Missed responses (omission errors)
    pub missed: u32,
    /// Mean response time (ms)
    pub avg_response_time_ms: Option<f64>,
    /// Response-time standard deviation (ms)
    pub response_time_std_dev_ms: Option<f64>,
    /// Session duration (seconds)
    pub duration_seconds: f64,
}

impl PerformanceMetrics {
    /// Total trials attempted (correct + incorrect + missed)
    pub fn total_trials(&self) -> u32 {
        self.correct
            .saturating_add(self.incorrect)
            .saturating_add(self.missed)
    }

    /// Fraction of trials answered correctly, `None` when no trials were attempted
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total_trials();
        if total == 0 {
            return None;
        }
        Some(self.correct as f64 / total as f64)
    }
}

/// Camera-derived attention and expression metrics for one session.
///
/// Produced by an external face-analysis collaborator and consumed here as a
/// read-only value object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceMetrics {
    /// Times the gaze left the screen during the session
    pub look_away_count: u32,
    /// Blink rate (blinks per minute)
    pub blink_rate_per_min: f64,
    /// Sustained attention score (0-100, higher is better)
    pub sustained_attention_score: f64,
    /// Distractibility index (0-100, higher is worse)
    pub distractibility_index: f64,
    /// Facial expression changes per minute
    pub emotion_change_rate_per_min: f64,
    /// Expression variability (0-100, higher is worse)
    pub emotion_variability: f64,
    /// Percentage of frames with a detectable face (0-100, higher is better)
    pub face_visible_pct: f64,
    /// Attention lapses detected during the session
    pub attention_lapse_count: u32,
    /// Mean duration of a look-away episode (ms)
    pub avg_look_away_duration_ms: f64,
}

/// A named, thresholded observation used for human-readable explanation.
///
/// `value` is on the metric's direction-corrected raw scale (higher is
/// always worse) and `threshold` is the calibration constant it is judged
/// against, never a value derived from the session itself. `significance`
/// is a coarse severity tier in 1-3, independent of the numeric factor
/// used in domain math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralMarker {
    pub name: String,
    pub value: f64,
    pub threshold: f64,
    /// Severity tier: 1 = sub-threshold, 2 = above threshold, 3 = well above
    pub significance: u8,
    pub description: String,
}

impl BehavioralMarker {
    /// Ranking key for marker deduplication and display ordering.
    ///
    /// Formula: `significance * value / threshold`
    pub fn severity(&self) -> f64 {
        if self.threshold <= 0.0 {
            return self.significance as f64;
        }
        self.significance as f64 * self.value / self.threshold
    }
}

/// Scoring output for one completed task session.
///
/// Produced exactly once per session and never updated afterwards. All
/// percentage-scale fields are clamped to [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Task that produced this session
    pub task: TaskKind,
    /// Overall ADHD-likelihood probability (0-100)
    pub adhd_probability_score: f64,
    /// Inattention domain score (0-100)
    pub attention_score: f64,
    /// Hyperactivity domain score (0-100)
    pub hyperactivity_score: f64,
    /// Impulsivity domain score (0-100)
    pub impulsivity_score: f64,
    /// Data-quality confidence (0-100), not a statistical margin
    pub confidence_level: f64,
    /// One marker per evaluated signal, for explanation
    pub markers: Vec<BehavioralMarker>,
    /// Session duration (ms)
    pub duration_ms: u64,
}

/// Merged assessment across several task sessions.
///
/// Markers are deduplicated by name, keeping the highest-severity instance,
/// sorted descending by severity and truncated for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    /// Overall ADHD-likelihood probability (0-100), recomputed from the
    /// composite domain scores
    pub adhd_probability_score: f64,
    /// Composite inattention domain score (0-100)
    pub attention_score: f64,
    /// Composite hyperactivity domain score (0-100)
    pub hyperactivity_score: f64,
    /// Composite impulsivity domain score (0-100)
    pub impulsivity_score: f64,
    /// Composite data-quality confidence (0-100)
    pub confidence_level: f64,
    /// Deduplicated, severity-ranked markers
    pub markers: Vec<BehavioralMarker>,
    /// Number of task sessions merged into this assessment
    pub tasks_completed: u32,
    /// Summed duration across merged sessions (ms)
    pub total_duration_ms: u64,
}

impl CompositeResult {
    /// All-zero composite used when no sessions are available
    pub fn empty() -> Self {
        Self {
            adhd_probability_score: 0.0,
            attention_score: 0.0,
            hyperactivity_score: 0.0,
            impulsivity_score: 0.0,
            confidence_level: 0.0,
            markers: Vec::new(),
            tasks_completed: 0,
            total_duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_trials_and_accuracy() {
        let perf = PerformanceMetrics {
            correct: 24,
            incorrect: 3,
            missed: 4,
            avg_response_time_ms: Some(320.0),
            response_time_std_dev_ms: Some(90.0),
            duration_seconds: 60.0,
        };
        assert_eq!(perf.total_trials(), 31);
        assert!((perf.accuracy().unwrap() - 24.0 / 31.0).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_with_no_trials() {
        let perf = PerformanceMetrics {
            correct: 0,
            incorrect: 0,
            missed: 0,
            avg_response_time_ms: None,
            response_time_std_dev_ms: None,
            duration_seconds: 60.0,
        };
        assert!(perf.accuracy().is_none());
    }

    #[test]
    fn test_marker_severity() {
        let marker = BehavioralMarker {
            name: "fidgeting".to_string(),
            value: 78.0,
            threshold: 55.0,
            significance: 2,
            description: "test".to_string(),
        };
        assert!((marker.severity() - 2.0 * 78.0 / 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_marker_severity_guards_zero_threshold() {
        let marker = BehavioralMarker {
            name: "degenerate".to_string(),
            value: 10.0,
            threshold: 0.0,
            significance: 3,
            description: "test".to_string(),
        };
        assert_eq!(marker.severity(), 3.0);
    }

    #[test]
    fn test_task_kind_serialization() {
        let json = serde_json::to_string(&TaskKind::GoNoGo).unwrap();
        assert_eq!(json, "\"go_no_go\"");
        let back: TaskKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TaskKind::GoNoGo);
    }
}
