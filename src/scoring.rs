//! Domain scoring
//!
//! Folds the evaluated signals of one task into the three ADHD domains
//! and the overall probability score. Each domain is a weighted mean over
//! whichever factors were available: a missing stream removes both the
//! factor and its weight, so partial sessions are never diluted toward
//! zero. The overall score blends the domains with configured weights,
//! and the confidence level reflects how much evidence the session
//! actually carried.
//!
//! `analyze` is total. Whatever the inputs, it returns a fully-formed
//! result with every score clamped to 0-100.

use crate::config::CalibrationConfig;
use crate::markers::{BehavioralMarkerFactory, EvaluatedSignal};
use crate::motion::MotionMetrics;
use crate::types::{BehavioralMarker, FaceMetrics, PerformanceMetrics, ScoringResult, TaskKind};

/// Weighted mean over the factors that were actually available
#[derive(Debug, Default)]
struct WeightedSum {
    total: f64,
    weight: f64,
}

impl WeightedSum {
    fn add(&mut self, weight: f64, factor: Option<f64>) {
        if weight <= 0.0 {
            return;
        }
        if let Some(factor) = factor {
            self.total += weight * factor;
            self.weight += weight;
        }
    }

    fn value(&self) -> f64 {
        if self.weight > 0.0 {
            (self.total / self.weight).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

fn factor(signal: &Option<EvaluatedSignal>) -> Option<f64> {
    signal.as_ref().map(|signal| signal.factor)
}

/// Scores one task session against a calibration table.
///
/// Session-scoped and stateless between calls: every `analyze` depends
/// only on its inputs and the calibration handed in at construction.
#[derive(Debug, Clone)]
pub struct DomainScorer {
    calibration: CalibrationConfig,
    factory: BehavioralMarkerFactory,
}

impl Default for DomainScorer {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

impl DomainScorer {
    pub fn new(calibration: CalibrationConfig) -> Self {
        let factory = BehavioralMarkerFactory::new(calibration.factors.clone());
        Self {
            calibration,
            factory,
        }
    }

    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }

    /// Score one completed task.
    ///
    /// `face` and `motion` are optional streams; domain weights
    /// renormalize over whatever arrived. Never fails and never returns a
    /// score outside 0-100.
    pub fn analyze(
        &self,
        task: TaskKind,
        performance: &PerformanceMetrics,
        face: Option<&FaceMetrics>,
        motion: Option<&MotionMetrics>,
    ) -> ScoringResult {
        let duration = performance.duration_seconds;

        let missed = self.factory.missed_rate(performance);
        let error = self.factory.error_rate(performance);
        let response_time = self.factory.response_time(performance);
        let variability = self.factory.response_variability(performance);

        let look_away = face.and_then(|f| self.factory.look_away_rate(f, duration));
        let attention_deficit = face.and_then(|f| self.factory.attention_deficit(f));
        let distractibility = face.and_then(|f| self.factory.distractibility(f));
        let blink = face.and_then(|f| self.factory.blink_rate(f));
        let facial_movement = face.and_then(|f| self.factory.facial_movement(f));
        let emotion_changes = face.and_then(|f| self.factory.emotion_changes(f));
        let emotion_variability = face.and_then(|f| self.factory.emotion_variability(f));
        let visibility_gap = face.and_then(|f| self.factory.visibility_gap(f));
        let lapses = face.and_then(|f| self.factory.lapse_rate(f, duration));
        let look_away_duration = face.and_then(|f| self.factory.look_away_duration(f));

        let fidgeting = motion.map(|m| self.factory.fidgeting(m));
        let restlessness = motion.map(|m| self.factory.restlessness(m));
        let direction_changes = motion.and_then(|m| self.factory.direction_change_rate(m, duration));
        let sudden_movements = motion.and_then(|m| self.factory.sudden_movement_rate(m, duration));

        let weights = &self.calibration.weights;

        let mut attention = WeightedSum::default();
        attention.add(weights.attention.look_away, factor(&look_away));
        attention.add(weights.attention.sustained_attention, factor(&attention_deficit));
        attention.add(weights.attention.distractibility, factor(&distractibility));
        attention.add(weights.attention.missed_responses, Some(missed.factor));
        attention.add(weights.attention.accuracy, Some(error.factor));
        attention.add(weights.attention.response_time, factor(&response_time));

        let mut hyperactivity = WeightedSum::default();
        hyperactivity.add(weights.hyperactivity.fidgeting, factor(&fidgeting));
        hyperactivity.add(weights.hyperactivity.restlessness, factor(&restlessness));
        hyperactivity.add(weights.hyperactivity.facial_movement, factor(&facial_movement));
        hyperactivity.add(weights.hyperactivity.direction_changes, factor(&direction_changes));
        hyperactivity.add(weights.hyperactivity.blink_rate, factor(&blink));
        hyperactivity.add(weights.hyperactivity.face_visibility, factor(&visibility_gap));

        let mut impulsivity = WeightedSum::default();
        impulsivity.add(
            weights.impulsivity.response_time_variability,
            factor(&variability),
        );
        impulsivity.add(weights.impulsivity.sudden_movements, factor(&sudden_movements));
        impulsivity.add(weights.impulsivity.emotion_changes, factor(&emotion_changes));
        impulsivity.add(
            weights.impulsivity.emotion_variability,
            factor(&emotion_variability),
        );
        impulsivity.add(weights.impulsivity.accuracy, Some(error.factor));
        impulsivity.add(weights.impulsivity.response_time, factor(&response_time));

        let attention_score = attention.value();
        let hyperactivity_score = hyperactivity.value();
        let impulsivity_score = impulsivity.value();

        let mut overall = WeightedSum::default();
        overall.add(weights.overall.attention, Some(attention_score));
        overall.add(weights.overall.hyperactivity, Some(hyperactivity_score));
        overall.add(weights.overall.impulsivity, Some(impulsivity_score));
        let adhd_probability_score = overall.value();

        // The lapse and look-away-duration signals carry markers only;
        // the attention weights already cover their parent observables.
        let markers: Vec<BehavioralMarker> = [
            missed.marker,
            error.marker,
            response_time.and_then(|s| s.marker),
            variability.and_then(|s| s.marker),
            look_away.and_then(|s| s.marker),
            attention_deficit.and_then(|s| s.marker),
            distractibility.and_then(|s| s.marker),
            blink.and_then(|s| s.marker),
            facial_movement.and_then(|s| s.marker),
            emotion_changes.and_then(|s| s.marker),
            emotion_variability.and_then(|s| s.marker),
            visibility_gap.and_then(|s| s.marker),
            lapses.and_then(|s| s.marker),
            look_away_duration.and_then(|s| s.marker),
            fidgeting.and_then(|s| s.marker),
            restlessness.and_then(|s| s.marker),
            direction_changes.and_then(|s| s.marker),
            sudden_movements.and_then(|s| s.marker),
        ]
        .into_iter()
        .flatten()
        .collect();

        let confidence_level = self.confidence(performance, face, markers.len());

        ScoringResult {
            task,
            adhd_probability_score,
            attention_score,
            hyperactivity_score,
            impulsivity_score,
            confidence_level,
            markers,
            duration_ms: (duration.max(0.0) * 1000.0) as u64,
        }
    }

    fn confidence(
        &self,
        performance: &PerformanceMetrics,
        face: Option<&FaceMetrics>,
        marker_count: usize,
    ) -> f64 {
        let config = &self.calibration.confidence;
        let mut value = config.baseline;

        let duration = performance.duration_seconds;
        if duration < config.short_session_secs {
            value -= config.short_session_penalty;
        } else if duration >= config.full_session_secs {
            value += config.full_session_bonus;
        }

        let visible = face
            .map(|f| {
                if f.face_visible_pct.is_finite() {
                    f.face_visible_pct.clamp(0.0, 100.0)
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0);
        if visible < config.min_face_visibility_pct {
            value -= (config.min_face_visibility_pct - visible) * config.visibility_penalty_per_pct;
        }

        value += (marker_count as f64 * config.marker_bonus).min(config.marker_bonus_cap);
        value.clamp(0.0, 100.0)
    }
}
