//! Behavioral marker factory
//!
//! Converts raw observables into bucketed 0-100 factors plus the
//! clinician-facing markers attached to each result. Every signal is
//! direction-corrected first, so a larger raw value always means a more
//! atypical observation (inverted metrics such as sustained attention,
//! accuracy, and face visibility are stored as their deficit). Factors are
//! monotone step functions of the corrected raw value.
//!
//! A signal that cannot be evaluated (absent stream, zero session
//! duration, unusable input) is reported as absent so the scorer can
//! renormalize around it. The one exception is the trial-count ratios:
//! with zero trials their factor is a defined 0 and only the marker is
//! withheld.

use crate::config::{FactorCalibration, FactorConfig};
use crate::motion::MotionMetrics;
use crate::types::{BehavioralMarker, FaceMetrics, PerformanceMetrics};

/// One scored signal: its domain factor and the marker describing it
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedSignal {
    /// Bucketed factor in 0-100, ready for the weighted domain sums
    pub factor: f64,
    /// Absent only for degenerate ratios that still carry a defined factor
    pub marker: Option<BehavioralMarker>,
}

/// Produces [`EvaluatedSignal`]s from one session's observables.
///
/// Holds the factor calibration so repeated evaluations across tasks use
/// one consistent table set.
#[derive(Debug, Clone)]
pub struct BehavioralMarkerFactory {
    config: FactorConfig,
}

impl Default for BehavioralMarkerFactory {
    fn default() -> Self {
        Self::new(FactorConfig::default())
    }
}

impl BehavioralMarkerFactory {
    pub fn new(config: FactorConfig) -> Self {
        Self { config }
    }

    fn evaluate(
        &self,
        calibration: &FactorCalibration,
        name: &str,
        raw: f64,
        description: String,
    ) -> EvaluatedSignal {
        let significance = significance_tier(raw, calibration.threshold, self.config.tier3_ratio);
        EvaluatedSignal {
            factor: calibration.table.score(raw),
            marker: Some(BehavioralMarker {
                name: name.to_string(),
                value: raw,
                threshold: calibration.threshold,
                significance,
                description,
            }),
        }
    }

    /// Share of expected responses that never arrived. Zero trials yield a
    /// factor of 0 with no marker.
    pub fn missed_rate(&self, performance: &PerformanceMetrics) -> EvaluatedSignal {
        let total = performance.total_trials();
        if total == 0 {
            return EvaluatedSignal {
                factor: 0.0,
                marker: None,
            };
        }
        let rate = performance.missed as f64 / total as f64;
        self.evaluate(
            &self.config.performance.missed_rate,
            "missed_responses",
            rate,
            format!("Missed {:.0}% of expected responses", rate * 100.0),
        )
    }

    /// Percentage of trials answered wrongly or not at all. Zero trials
    /// yield a factor of 0 with no marker.
    pub fn error_rate(&self, performance: &PerformanceMetrics) -> EvaluatedSignal {
        let accuracy = match performance.accuracy() {
            Some(accuracy) => accuracy,
            None => {
                return EvaluatedSignal {
                    factor: 0.0,
                    marker: None,
                }
            }
        };
        let error_pct = (1.0 - accuracy) * 100.0;
        self.evaluate(
            &self.config.performance.error_rate,
            "low_accuracy",
            error_pct,
            format!("Response accuracy of {:.0}%", accuracy * 100.0),
        )
    }

    pub fn response_time(&self, performance: &PerformanceMetrics) -> Option<EvaluatedSignal> {
        let avg_ms = usable(performance.avg_response_time_ms?)?;
        Some(self.evaluate(
            &self.config.performance.response_time,
            "slow_response_time",
            avg_ms,
            format!("Mean response time of {avg_ms:.0} ms"),
        ))
    }

    pub fn response_variability(
        &self,
        performance: &PerformanceMetrics,
    ) -> Option<EvaluatedSignal> {
        let std_dev_ms = usable(performance.response_time_std_dev_ms?)?;
        Some(self.evaluate(
            &self.config.performance.response_time_variability,
            "response_time_variability",
            std_dev_ms,
            format!("Response-time variability of {std_dev_ms:.0} ms"),
        ))
    }

    pub fn look_away_rate(
        &self,
        face: &FaceMetrics,
        duration_seconds: f64,
    ) -> Option<EvaluatedSignal> {
        let rate = per_minute(face.look_away_count, duration_seconds)?;
        Some(self.evaluate(
            &self.config.face.look_away_rate,
            "look_away_rate",
            rate,
            format!("Looked away from the task {rate:.1} times per minute"),
        ))
    }

    /// Inverted: stored as 100 minus the sustained-attention score, so a
    /// perfect score lands in the lowest bucket.
    pub fn attention_deficit(&self, face: &FaceMetrics) -> Option<EvaluatedSignal> {
        let sustained = percent(face.sustained_attention_score)?;
        Some(self.evaluate(
            &self.config.face.attention_deficit,
            "low_sustained_attention",
            100.0 - sustained,
            format!("Sustained-attention score of {sustained:.0} out of 100"),
        ))
    }

    pub fn distractibility(&self, face: &FaceMetrics) -> Option<EvaluatedSignal> {
        let index = percent(face.distractibility_index)?;
        Some(self.evaluate(
            &self.config.face.distractibility,
            "distractibility",
            index,
            format!("Distractibility index of {index:.0} out of 100"),
        ))
    }

    pub fn blink_rate(&self, face: &FaceMetrics) -> Option<EvaluatedSignal> {
        let rate = usable(face.blink_rate_per_min)?;
        Some(self.evaluate(
            &self.config.face.blink_rate,
            "elevated_blink_rate",
            rate,
            format!("Blink rate of {rate:.1} per minute"),
        ))
    }

    /// Facial motor activity, observed through the expression-change rate
    /// but calibrated separately from the impulsivity signal.
    pub fn facial_movement(&self, face: &FaceMetrics) -> Option<EvaluatedSignal> {
        let rate = usable(face.emotion_change_rate_per_min)?;
        Some(self.evaluate(
            &self.config.face.facial_movement,
            "facial_movement",
            rate,
            format!("Facial expression shifted {rate:.1} times per minute"),
        ))
    }

    pub fn emotion_changes(&self, face: &FaceMetrics) -> Option<EvaluatedSignal> {
        let rate = usable(face.emotion_change_rate_per_min)?;
        Some(self.evaluate(
            &self.config.face.emotion_change_rate,
            "emotion_changes",
            rate,
            format!("Emotional expression changed {rate:.1} times per minute"),
        ))
    }

    pub fn emotion_variability(&self, face: &FaceMetrics) -> Option<EvaluatedSignal> {
        let variability = percent(face.emotion_variability)?;
        Some(self.evaluate(
            &self.config.face.emotion_variability,
            "emotion_variability",
            variability,
            format!("Emotion variability of {variability:.0} out of 100"),
        ))
    }

    /// Inverted: stored as the percentage of the session with no usable
    /// face.
    pub fn visibility_gap(&self, face: &FaceMetrics) -> Option<EvaluatedSignal> {
        let visible = percent(face.face_visible_pct)?;
        let gap = 100.0 - visible;
        Some(self.evaluate(
            &self.config.face.visibility_gap,
            "low_face_visibility",
            gap,
            format!("Face not visible for {gap:.0}% of the session"),
        ))
    }

    pub fn lapse_rate(&self, face: &FaceMetrics, duration_seconds: f64) -> Option<EvaluatedSignal> {
        let rate = per_minute(face.attention_lapse_count, duration_seconds)?;
        Some(self.evaluate(
            &self.config.face.lapse_rate,
            "attention_lapses",
            rate,
            format!("{rate:.1} attention lapses per minute"),
        ))
    }

    pub fn look_away_duration(&self, face: &FaceMetrics) -> Option<EvaluatedSignal> {
        let avg_ms = usable(face.avg_look_away_duration_ms)?;
        Some(self.evaluate(
            &self.config.face.look_away_duration,
            "look_away_duration",
            avg_ms,
            format!("Average look-away lasting {avg_ms:.0} ms"),
        ))
    }

    pub fn fidgeting(&self, motion: &MotionMetrics) -> EvaluatedSignal {
        self.evaluate(
            &self.config.motion.fidgeting,
            "fidgeting",
            motion.fidgeting_score,
            format!("Fidgeting score of {:.0} out of 100", motion.fidgeting_score),
        )
    }

    pub fn restlessness(&self, motion: &MotionMetrics) -> EvaluatedSignal {
        self.evaluate(
            &self.config.motion.restlessness,
            "restlessness",
            motion.restlessness,
            format!("Restlessness score of {:.0} out of 100", motion.restlessness),
        )
    }

    pub fn direction_change_rate(
        &self,
        motion: &MotionMetrics,
        duration_seconds: f64,
    ) -> Option<EvaluatedSignal> {
        let rate = per_minute(motion.direction_changes, duration_seconds)?;
        Some(self.evaluate(
            &self.config.motion.direction_change_rate,
            "direction_changes",
            rate,
            format!("{rate:.1} movement direction changes per minute"),
        ))
    }

    pub fn sudden_movement_rate(
        &self,
        motion: &MotionMetrics,
        duration_seconds: f64,
    ) -> Option<EvaluatedSignal> {
        let rate = per_minute(motion.sudden_movements, duration_seconds)?;
        Some(self.evaluate(
            &self.config.motion.sudden_movement_rate,
            "sudden_movements",
            rate,
            format!("{rate:.1} sudden movements per minute"),
        ))
    }
}

/// Marker tier: 1 noted, 2 at threshold, 3 only on a wide margin past it
fn significance_tier(value: f64, threshold: f64, tier3_ratio: f64) -> u8 {
    if threshold <= 0.0 {
        return 1;
    }
    if value >= threshold * tier3_ratio {
        3
    } else if value >= threshold {
        2
    } else {
        1
    }
}

/// Rejects non-finite or negative raw values at the evaluation boundary
fn usable(raw: f64) -> Option<f64> {
    if raw.is_finite() && raw >= 0.0 {
        Some(raw)
    } else {
        None
    }
}

/// Clamps a 0-100 scale input, rejecting non-finite values
fn percent(raw: f64) -> Option<f64> {
    if raw.is_finite() {
        Some(raw.clamp(0.0, 100.0))
    } else {
        None
    }
}

fn per_minute(count: u32, duration_seconds: f64) -> Option<f64> {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return None;
    }
    Some(count as f64 / (duration_seconds / 60.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn factory() -> BehavioralMarkerFactory {
        BehavioralMarkerFactory::default()
    }

    fn neutral_face() -> FaceMetrics {
        FaceMetrics {
            look_away_count: 2,
            blink_rate_per_min: 15.0,
            sustained_attention_score: 85.0,
            distractibility_index: 15.0,
            emotion_change_rate_per_min: 1.0,
            emotion_variability: 20.0,
            face_visible_pct: 95.0,
            attention_lapse_count: 1,
            avg_look_away_duration_ms: 400.0,
        }
    }

    fn performance(correct: u32, incorrect: u32, missed: u32) -> PerformanceMetrics {
        PerformanceMetrics {
            correct,
            incorrect,
            missed,
            avg_response_time_ms: Some(320.0),
            response_time_std_dev_ms: Some(90.0),
            duration_seconds: 60.0,
        }
    }

    #[test]
    fn test_significance_tiers() {
        assert_eq!(significance_tier(3.0, 6.0, 1.5), 1);
        assert_eq!(significance_tier(6.0, 6.0, 1.5), 2);
        assert_eq!(significance_tier(8.0, 6.0, 1.5), 2);
        assert_eq!(significance_tier(9.0, 6.0, 1.5), 3);
    }

    #[test]
    fn test_zero_trials_give_zero_factor_and_no_marker() {
        let empty = performance(0, 0, 0);
        let accuracy = factory().error_rate(&empty);
        let missed = factory().missed_rate(&empty);
        assert_eq!(accuracy.factor, 0.0);
        assert_eq!(accuracy.marker, None);
        assert_eq!(missed.factor, 0.0);
        assert_eq!(missed.marker, None);
    }

    #[test]
    fn test_perfect_sustained_attention_scores_minimum_bucket() {
        let mut face = neutral_face();
        face.sustained_attention_score = 100.0;
        let signal = factory().attention_deficit(&face).unwrap();
        assert_eq!(signal.factor, 5.0);
        let marker = signal.marker.unwrap();
        assert_eq!(marker.value, 0.0);
        assert_eq!(marker.significance, 1);
    }

    #[test]
    fn test_inverted_metric_stored_as_deficit() {
        let mut face = neutral_face();
        face.sustained_attention_score = 30.0;
        let marker = factory().attention_deficit(&face).unwrap().marker.unwrap();
        assert_eq!(marker.name, "low_sustained_attention");
        assert_eq!(marker.value, 70.0);
        // 70 is past 1.5x the 45-point threshold
        assert_eq!(marker.significance, 3);
    }

    #[test]
    fn test_factor_is_monotone_in_raw_value() {
        let factory = factory();
        let mut face = neutral_face();
        let mut previous = -1.0;
        for distractibility in [0.0, 10.0, 20.0, 35.0, 55.0, 75.0, 90.0, 100.0] {
            face.distractibility_index = distractibility;
            let signal = factory.distractibility(&face).unwrap();
            assert!(
                signal.factor >= previous,
                "factor regressed at raw {distractibility}"
            );
            previous = signal.factor;
        }
    }

    #[test]
    fn test_look_away_rate_uses_session_duration() {
        let mut face = neutral_face();
        face.look_away_count = 12;
        let signal = factory().look_away_rate(&face, 120.0).unwrap();
        let marker = signal.marker.unwrap();
        assert!((marker.value - 6.0).abs() < 1e-9);
        assert_eq!(signal.factor, 55.0);
        assert_eq!(marker.significance, 2);
    }

    #[test]
    fn test_rate_signals_absent_without_duration() {
        let face = neutral_face();
        assert_eq!(factory().look_away_rate(&face, 0.0), None);
        assert_eq!(factory().lapse_rate(&face, -5.0), None);
        let motion = MotionMetrics::default();
        assert_eq!(factory().direction_change_rate(&motion, 0.0), None);
    }

    #[test]
    fn test_non_finite_inputs_rejected() {
        let mut face = neutral_face();
        face.sustained_attention_score = f64::NAN;
        face.blink_rate_per_min = f64::INFINITY;
        assert_eq!(factory().attention_deficit(&face), None);
        assert_eq!(factory().blink_rate(&face), None);

        let mut perf = performance(10, 2, 1);
        perf.avg_response_time_ms = Some(f64::NAN);
        assert_eq!(factory().response_time(&perf), None);
        perf.avg_response_time_ms = None;
        assert_eq!(factory().response_time(&perf), None);
    }

    #[test]
    fn test_out_of_range_percent_clamped() {
        let mut face = neutral_face();
        face.distractibility_index = 180.0;
        let marker = factory().distractibility(&face).unwrap().marker.unwrap();
        assert_eq!(marker.value, 100.0);

        face.face_visible_pct = -20.0;
        let marker = factory().visibility_gap(&face).unwrap().marker.unwrap();
        assert_eq!(marker.value, 100.0);
    }

    #[test]
    fn test_every_available_signal_carries_one_marker() {
        let factory = factory();
        let face = neutral_face();
        let perf = performance(24, 3, 4);
        let motion = MotionMetrics {
            fidgeting_score: 10.0,
            restlessness: 8.0,
            ..MotionMetrics::default()
        };

        let signals = vec![
            factory.missed_rate(&perf),
            factory.error_rate(&perf),
            factory.response_time(&perf).unwrap(),
            factory.response_variability(&perf).unwrap(),
            factory.look_away_rate(&face, 60.0).unwrap(),
            factory.attention_deficit(&face).unwrap(),
            factory.distractibility(&face).unwrap(),
            factory.blink_rate(&face).unwrap(),
            factory.facial_movement(&face).unwrap(),
            factory.emotion_changes(&face).unwrap(),
            factory.emotion_variability(&face).unwrap(),
            factory.visibility_gap(&face).unwrap(),
            factory.lapse_rate(&face, 60.0).unwrap(),
            factory.look_away_duration(&face).unwrap(),
            factory.fidgeting(&motion),
            factory.restlessness(&motion),
            factory.direction_change_rate(&motion, 60.0).unwrap(),
            factory.sudden_movement_rate(&motion, 60.0).unwrap(),
        ];
        for signal in &signals {
            let marker = signal.marker.as_ref().unwrap();
            assert!((1..=3).contains(&marker.significance));
            assert!(marker.threshold > 0.0);
            assert!(!marker.description.is_empty());
        }
        assert_eq!(signals.len(), 18);
    }

    #[test]
    fn test_error_rate_scenario_values() {
        let perf = performance(24, 3, 4);
        let signal = factory().error_rate(&perf);
        // 24 of 31 correct is roughly 22.6% error
        assert_eq!(signal.factor, 35.0);
        let marker = signal.marker.unwrap();
        assert_eq!(marker.significance, 1);
    }
}
