//! Calibration configuration
//!
//! Every threshold, weight, and cap used by the engine lives in one
//! versioned table so the scoring algorithms stay free of magic numbers
//! and calibration revisions can be swapped without touching them.
//! `CalibrationConfig::default()` is the shipped calibration; hosts may
//! load an overriding table from JSON.

use crate::error::ScoringError;
use crate::types::TaskKind;
use serde::{Deserialize, Serialize};

/// Revision identifier of the shipped calibration table
pub const CALIBRATION_VERSION: &str = "2026.2";

/// Tolerance for weight sums that must equal 1.0
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// One step of a bucket table: values at or below `limit` map to `score`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketStep {
    pub limit: f64,
    pub score: f64,
}

/// Monotone bucketed mapping from a raw metric to a 0-100 factor.
///
/// Steps are ordered by ascending `limit`; the first step whose limit is
/// at or above the value wins, and values beyond the last step map to
/// `ceiling`. Non-finite inputs map to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTable {
    pub steps: Vec<BucketStep>,
    pub ceiling: f64,
}

impl StepTable {
    pub fn new(steps: &[(f64, f64)], ceiling: f64) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|&(limit, score)| BucketStep { limit, score })
                .collect(),
            ceiling,
        }
    }

    /// Map a raw value onto the 0-100 factor scale
    pub fn score(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        for step in &self.steps {
            if value <= step.limit {
                return step.score;
            }
        }
        self.ceiling
    }

    fn validate(&self, name: &str) -> Result<(), ScoringError> {
        if self.steps.is_empty() {
            return Err(ScoringError::InvalidCalibration(format!(
                "{name}: bucket table must have at least one step"
            )));
        }
        let mut prev_limit = f64::NEG_INFINITY;
        let mut prev_score = f64::NEG_INFINITY;
        for step in &self.steps {
            if !step.limit.is_finite() || !step.score.is_finite() {
                return Err(ScoringError::InvalidCalibration(format!(
                    "{name}: non-finite bucket entry"
                )));
            }
            if step.limit <= prev_limit {
                return Err(ScoringError::InvalidCalibration(format!(
                    "{name}: bucket limits must be strictly ascending"
                )));
            }
            if step.score < prev_score {
                return Err(ScoringError::InvalidCalibration(format!(
                    "{name}: bucket scores must be non-decreasing"
                )));
            }
            if !(0.0..=100.0).contains(&step.score) {
                return Err(ScoringError::InvalidCalibration(format!(
                    "{name}: bucket scores must be in 0-100"
                )));
            }
            prev_limit = step.limit;
            prev_score = step.score;
        }
        if !(prev_score..=100.0).contains(&self.ceiling) {
            return Err(ScoringError::InvalidCalibration(format!(
                "{name}: ceiling must be in 0-100 and at least the last bucket score"
            )));
        }
        Ok(())
    }
}

/// Bucket table plus the marker threshold for one evaluated signal.
///
/// The threshold is on the metric's direction-corrected raw scale and is
/// used for marker significance tiers, not for domain math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCalibration {
    pub table: StepTable,
    pub threshold: f64,
}

impl FactorCalibration {
    fn new(steps: &[(f64, f64)], ceiling: f64, threshold: f64) -> Self {
        Self {
            table: StepTable::new(steps, ceiling),
            threshold,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ScoringError> {
        self.table.validate(name)?;
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ScoringError::InvalidCalibration(format!(
                "{name}: marker threshold must be positive"
            )));
        }
        Ok(())
    }
}

/// Motion-processor thresholds, debounce intervals, and caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Moving-average window length (samples). 5-7 at 50 Hz keeps tremor
    /// while suppressing sensor jitter.
    pub filter_window: usize,
    /// Minimum filtered-delta magnitude for event promotion (m/s^2)
    pub noise_threshold: f64,
    /// Lower bound of the medium intensity bin (m/s^2); the fidget bin
    /// spans noise_threshold..medium_threshold
    pub medium_threshold: f64,
    /// Lower bound of the large intensity bin (m/s^2)
    pub large_threshold: f64,
    /// Lower bound of the sudden intensity bin (m/s^2)
    pub sudden_threshold: f64,
    /// Rolling window for repetitive-movement pairing (ms)
    pub repetitive_window_ms: u64,
    /// Minimum absolute cosine similarity for an aligned pair
    pub repetitive_similarity: f64,
    /// Aligned pairs per minute mapping to ~63% of the repetitive term
    pub repetitive_rate_scale: f64,
    /// Minimum interval between counted direction changes (ms)
    pub direction_debounce_ms: u64,
    /// Minimum interval between counted sudden movements (ms)
    pub sudden_debounce_ms: u64,
    /// Hard cap on direction changes per session
    pub max_direction_changes: u32,
    /// Hard cap on sudden movements per session
    pub max_sudden_movements: u32,
    /// Event buffer capacity; the oldest events are dropped beyond this
    pub max_events: usize,
    /// Minimum buffered events before analysis yields non-zero metrics
    pub min_events: usize,
    /// Mean rotational delta (rad/s) mapping to ~63% of the rotation term
    pub rotation_energy_scale: f64,
    /// Fidgeting blend weight for the repetitive-movement term
    pub repetitive_weight: f64,
    /// Fidgeting blend weight for the fidget-bin fraction
    pub fidget_band_weight: f64,
    /// Fidgeting blend weight for the gyroscope rotation term
    pub rotation_weight: f64,
    /// Restlessness blend weight for large-movement frequency
    pub restless_large_weight: f64,
    /// Restlessness blend weight for the sudden-movement rate
    pub restless_sudden_weight: f64,
    /// Restlessness blend weight for the direction-change rate
    pub restless_direction_weight: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            filter_window: 6,
            noise_threshold: 0.15,
            medium_threshold: 1.2,
            large_threshold: 2.5,
            sudden_threshold: 4.0,
            repetitive_window_ms: 3000,
            repetitive_similarity: 0.75,
            repetitive_rate_scale: 40.0,
            direction_debounce_ms: 200,
            sudden_debounce_ms: 400,
            max_direction_changes: 120,
            max_sudden_movements: 50,
            max_events: 4096,
            min_events: 5,
            rotation_energy_scale: 1.5,
            repetitive_weight: 0.55,
            fidget_band_weight: 0.30,
            rotation_weight: 0.15,
            restless_large_weight: 0.35,
            restless_sudden_weight: 0.35,
            restless_direction_weight: 0.30,
        }
    }
}

impl MotionConfig {
    fn validate(&self) -> Result<(), ScoringError> {
        if self.filter_window < 2 {
            return Err(ScoringError::InvalidCalibration(
                "motion: filter window must hold at least 2 samples".to_string(),
            ));
        }
        let thresholds = [
            self.noise_threshold,
            self.medium_threshold,
            self.large_threshold,
            self.sudden_threshold,
        ];
        if thresholds.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(ScoringError::InvalidCalibration(
                "motion: intensity thresholds must be positive".to_string(),
            ));
        }
        if !(self.noise_threshold < self.medium_threshold
            && self.medium_threshold < self.large_threshold
            && self.large_threshold < self.sudden_threshold)
        {
            return Err(ScoringError::InvalidCalibration(
                "motion: intensity thresholds must be strictly ascending".to_string(),
            ));
        }
        if self.direction_debounce_ms == 0 || self.sudden_debounce_ms == 0 {
            return Err(ScoringError::InvalidCalibration(
                "motion: debounce intervals must be positive".to_string(),
            ));
        }
        if self.max_direction_changes == 0 || self.max_sudden_movements == 0 {
            return Err(ScoringError::InvalidCalibration(
                "motion: event caps must be positive".to_string(),
            ));
        }
        if self.min_events == 0 || self.max_events < self.min_events {
            return Err(ScoringError::InvalidCalibration(
                "motion: event buffer bounds are inconsistent".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.repetitive_similarity) || self.repetitive_similarity == 0.0 {
            return Err(ScoringError::InvalidCalibration(
                "motion: repetitive similarity must be in (0, 1]".to_string(),
            ));
        }
        if self.repetitive_window_ms == 0 {
            return Err(ScoringError::InvalidCalibration(
                "motion: repetitive window must be positive".to_string(),
            ));
        }
        if self.repetitive_rate_scale <= 0.0 || self.rotation_energy_scale <= 0.0 {
            return Err(ScoringError::InvalidCalibration(
                "motion: saturation scales must be positive".to_string(),
            ));
        }
        let fidget_sum = self.repetitive_weight + self.fidget_band_weight + self.rotation_weight;
        if (fidget_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidCalibration(
                "motion: fidgeting blend weights must sum to 1.0".to_string(),
            ));
        }
        let restless_sum = self.restless_large_weight
            + self.restless_sudden_weight
            + self.restless_direction_weight;
        if (restless_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidCalibration(
                "motion: restlessness blend weights must sum to 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bucket tables for performance-derived signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceFactors {
    /// Missed-response fraction of total trials (0-1)
    pub missed_rate: FactorCalibration,
    /// Error percentage, 100 minus accuracy (0-100)
    pub error_rate: FactorCalibration,
    /// Mean response time (ms)
    pub response_time: FactorCalibration,
    /// Response-time standard deviation (ms)
    pub response_time_variability: FactorCalibration,
}

impl Default for PerformanceFactors {
    fn default() -> Self {
        Self {
            missed_rate: FactorCalibration::new(
                &[(0.05, 5.0), (0.15, 20.0), (0.30, 40.0), (0.45, 65.0), (0.60, 85.0)],
                95.0,
                0.30,
            ),
            error_rate: FactorCalibration::new(
                &[(5.0, 5.0), (15.0, 15.0), (30.0, 35.0), (45.0, 60.0), (60.0, 80.0)],
                95.0,
                45.0,
            ),
            response_time: FactorCalibration::new(
                &[(350.0, 10.0), (500.0, 25.0), (650.0, 45.0), (850.0, 70.0), (1100.0, 85.0)],
                95.0,
                650.0,
            ),
            response_time_variability: FactorCalibration::new(
                &[(80.0, 5.0), (140.0, 20.0), (200.0, 40.0), (260.0, 60.0), (340.0, 80.0)],
                92.0,
                260.0,
            ),
        }
    }
}

/// Bucket tables for face-derived signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceFactors {
    /// Look-aways per minute
    pub look_away_rate: FactorCalibration,
    /// Attention deficit, 100 minus the sustained-attention score (0-100)
    pub attention_deficit: FactorCalibration,
    /// Distractibility index (0-100)
    pub distractibility: FactorCalibration,
    /// Blinks per minute
    pub blink_rate: FactorCalibration,
    /// Expression changes per minute, read as facial movement
    pub facial_movement: FactorCalibration,
    /// Expression changes per minute, read as emotional lability
    pub emotion_change_rate: FactorCalibration,
    /// Expression variability (0-100)
    pub emotion_variability: FactorCalibration,
    /// Visibility gap, 100 minus the face-visible percentage (0-100)
    pub visibility_gap: FactorCalibration,
    /// Attention lapses per minute
    pub lapse_rate: FactorCalibration,
    /// Mean look-away episode duration (ms)
    pub look_away_duration: FactorCalibration,
}

impl Default for FaceFactors {
    fn default() -> Self {
        Self {
            look_away_rate: FactorCalibration::new(
                &[(0.5, 5.0), (1.5, 15.0), (3.0, 25.0), (6.0, 55.0), (10.0, 75.0)],
                90.0,
                6.0,
            ),
            attention_deficit: FactorCalibration::new(
                &[(10.0, 5.0), (25.0, 20.0), (40.0, 40.0), (55.0, 60.0), (70.0, 80.0)],
                95.0,
                45.0,
            ),
            distractibility: FactorCalibration::new(
                &[(15.0, 5.0), (30.0, 20.0), (50.0, 45.0), (70.0, 70.0), (85.0, 85.0)],
                95.0,
                60.0,
            ),
            blink_rate: FactorCalibration::new(
                &[(18.0, 5.0), (25.0, 15.0), (32.0, 35.0), (40.0, 60.0), (50.0, 80.0)],
                92.0,
                32.0,
            ),
            facial_movement: FactorCalibration::new(
                &[(1.0, 5.0), (2.5, 20.0), (4.0, 40.0), (6.0, 60.0), (9.0, 80.0)],
                92.0,
                6.0,
            ),
            emotion_change_rate: FactorCalibration::new(
                &[(1.0, 5.0), (2.5, 20.0), (4.0, 45.0), (6.0, 65.0), (9.0, 85.0)],
                95.0,
                6.0,
            ),
            emotion_variability: FactorCalibration::new(
                &[(20.0, 5.0), (35.0, 20.0), (50.0, 45.0), (65.0, 65.0), (80.0, 85.0)],
                95.0,
                65.0,
            ),
            visibility_gap: FactorCalibration::new(
                &[(5.0, 5.0), (15.0, 15.0), (30.0, 40.0), (50.0, 65.0), (70.0, 85.0)],
                95.0,
                30.0,
            ),
            lapse_rate: FactorCalibration::new(
                &[(0.5, 5.0), (1.5, 15.0), (3.0, 35.0), (5.0, 60.0), (8.0, 80.0)],
                92.0,
                5.0,
            ),
            look_away_duration: FactorCalibration::new(
                &[(300.0, 5.0), (700.0, 15.0), (1200.0, 35.0), (1800.0, 60.0), (2600.0, 80.0)],
                92.0,
                1500.0,
            ),
        }
    }
}

/// Bucket tables for motion-derived signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionFactors {
    /// Fidgeting score from the motion processor (0-100)
    pub fidgeting: FactorCalibration,
    /// Restlessness score from the motion processor (0-100)
    pub restlessness: FactorCalibration,
    /// Direction changes per minute
    pub direction_change_rate: FactorCalibration,
    /// Sudden movements per minute
    pub sudden_movement_rate: FactorCalibration,
}

impl Default for MotionFactors {
    fn default() -> Self {
        Self {
            fidgeting: FactorCalibration::new(
                &[(10.0, 5.0), (25.0, 20.0), (40.0, 45.0), (55.0, 65.0), (70.0, 82.0)],
                95.0,
                55.0,
            ),
            restlessness: FactorCalibration::new(
                &[(10.0, 5.0), (25.0, 20.0), (40.0, 45.0), (55.0, 65.0), (70.0, 82.0)],
                95.0,
                55.0,
            ),
            direction_change_rate: FactorCalibration::new(
                &[(5.0, 5.0), (12.0, 20.0), (25.0, 40.0), (40.0, 60.0), (70.0, 80.0)],
                92.0,
                40.0,
            ),
            sudden_movement_rate: FactorCalibration::new(
                &[(1.0, 5.0), (3.0, 20.0), (6.0, 40.0), (12.0, 65.0), (20.0, 85.0)],
                95.0,
                12.0,
            ),
        }
    }
}

/// All factor bucket tables plus marker tier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorConfig {
    /// Value-to-threshold ratio at which a marker reaches tier 3
    pub tier3_ratio: f64,
    pub performance: PerformanceFactors,
    pub face: FaceFactors,
    pub motion: MotionFactors,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            tier3_ratio: 1.5,
            performance: PerformanceFactors::default(),
            face: FaceFactors::default(),
            motion: MotionFactors::default(),
        }
    }
}

impl FactorConfig {
    fn validate(&self) -> Result<(), ScoringError> {
        if !self.tier3_ratio.is_finite() || self.tier3_ratio <= 1.0 {
            return Err(ScoringError::InvalidCalibration(
                "factors: tier-3 ratio must exceed 1.0".to_string(),
            ));
        }
        self.performance.missed_rate.validate("missed_rate")?;
        self.performance.error_rate.validate("error_rate")?;
        self.performance.response_time.validate("response_time")?;
        self.performance
            .response_time_variability
            .validate("response_time_variability")?;
        self.face.look_away_rate.validate("look_away_rate")?;
        self.face.attention_deficit.validate("attention_deficit")?;
        self.face.distractibility.validate("distractibility")?;
        self.face.blink_rate.validate("blink_rate")?;
        self.face.facial_movement.validate("facial_movement")?;
        self.face.emotion_change_rate.validate("emotion_change_rate")?;
        self.face.emotion_variability.validate("emotion_variability")?;
        self.face.visibility_gap.validate("visibility_gap")?;
        self.face.lapse_rate.validate("lapse_rate")?;
        self.face.look_away_duration.validate("look_away_duration")?;
        self.motion.fidgeting.validate("fidgeting")?;
        self.motion.restlessness.validate("restlessness")?;
        self.motion
            .direction_change_rate
            .validate("direction_change_rate")?;
        self.motion
            .sudden_movement_rate
            .validate("sudden_movement_rate")?;
        Ok(())
    }
}

/// Attention domain weights; attention-specific metrics carry ~65% combined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionWeights {
    pub look_away: f64,
    pub sustained_attention: f64,
    pub distractibility: f64,
    pub missed_responses: f64,
    pub accuracy: f64,
    pub response_time: f64,
}

impl Default for AttentionWeights {
    fn default() -> Self {
        Self {
            look_away: 0.22,
            sustained_attention: 0.25,
            distractibility: 0.18,
            missed_responses: 0.15,
            accuracy: 0.12,
            response_time: 0.08,
        }
    }
}

impl AttentionWeights {
    fn sum(&self) -> f64 {
        self.look_away
            + self.sustained_attention
            + self.distractibility
            + self.missed_responses
            + self.accuracy
            + self.response_time
    }
}

/// Hyperactivity domain weights; fidgeting plus restlessness carry ~55%
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperactivityWeights {
    pub fidgeting: f64,
    pub restlessness: f64,
    pub facial_movement: f64,
    pub direction_changes: f64,
    pub blink_rate: f64,
    pub face_visibility: f64,
}

impl Default for HyperactivityWeights {
    fn default() -> Self {
        Self {
            fidgeting: 0.30,
            restlessness: 0.25,
            facial_movement: 0.15,
            direction_changes: 0.12,
            blink_rate: 0.10,
            face_visibility: 0.08,
        }
    }
}

impl HyperactivityWeights {
    fn sum(&self) -> f64 {
        self.fidgeting
            + self.restlessness
            + self.facial_movement
            + self.direction_changes
            + self.blink_rate
            + self.face_visibility
    }
}

/// Impulsivity domain weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulsivityWeights {
    pub response_time_variability: f64,
    pub sudden_movements: f64,
    pub emotion_changes: f64,
    pub emotion_variability: f64,
    pub accuracy: f64,
    pub response_time: f64,
}

impl Default for ImpulsivityWeights {
    fn default() -> Self {
        Self {
            response_time_variability: 0.28,
            sudden_movements: 0.22,
            emotion_changes: 0.18,
            emotion_variability: 0.12,
            accuracy: 0.10,
            response_time: 0.10,
        }
    }
}

impl ImpulsivityWeights {
    fn sum(&self) -> f64 {
        self.response_time_variability
            + self.sudden_movements
            + self.emotion_changes
            + self.emotion_variability
            + self.accuracy
            + self.response_time
    }
}

/// Weights combining the three domains into the overall probability.
///
/// Inattention is the most diagnostically central domain, hence its
/// largest share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallWeights {
    pub attention: f64,
    pub hyperactivity: f64,
    pub impulsivity: f64,
}

impl Default for OverallWeights {
    fn default() -> Self {
        Self {
            attention: 0.45,
            hyperactivity: 0.30,
            impulsivity: 0.25,
        }
    }
}

impl OverallWeights {
    fn sum(&self) -> f64 {
        self.attention + self.hyperactivity + self.impulsivity
    }
}

/// All domain weight tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    pub attention: AttentionWeights,
    pub hyperactivity: HyperactivityWeights,
    pub impulsivity: ImpulsivityWeights,
    pub overall: OverallWeights,
}

impl WeightConfig {
    fn validate(&self) -> Result<(), ScoringError> {
        let sums = [
            ("attention", self.attention.sum()),
            ("hyperactivity", self.hyperactivity.sum()),
            ("impulsivity", self.impulsivity.sum()),
            ("overall", self.overall.sum()),
        ];
        for (name, sum) in sums {
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(ScoringError::InvalidCalibration(format!(
                    "weights: {name} weights must sum to 1.0 (got {sum})"
                )));
            }
        }
        Ok(())
    }
}

/// Confidence baseline and adjustment table.
///
/// Confidence estimates data quality, never a statistical margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Starting confidence before adjustments (0-100)
    pub baseline: f64,
    /// Sessions shorter than this draw the short-session penalty (seconds)
    pub short_session_secs: f64,
    pub short_session_penalty: f64,
    /// Sessions at least this long earn the full-session bonus (seconds)
    pub full_session_secs: f64,
    pub full_session_bonus: f64,
    /// Face visibility below this percentage starts costing confidence
    pub min_face_visibility_pct: f64,
    /// Penalty per percentage point of visibility below the floor
    pub visibility_penalty_per_pct: f64,
    /// Bonus per emitted marker, up to the cap
    pub marker_bonus: f64,
    pub marker_bonus_cap: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            baseline: 75.0,
            short_session_secs: 90.0,
            short_session_penalty: 20.0,
            full_session_secs: 240.0,
            full_session_bonus: 5.0,
            min_face_visibility_pct: 70.0,
            visibility_penalty_per_pct: 0.6,
            marker_bonus: 0.8,
            marker_bonus_cap: 8.0,
        }
    }
}

impl ConfidenceConfig {
    fn validate(&self) -> Result<(), ScoringError> {
        if !(0.0..=100.0).contains(&self.baseline) {
            return Err(ScoringError::InvalidCalibration(
                "confidence: baseline must be in 0-100".to_string(),
            ));
        }
        if !self.short_session_secs.is_finite()
            || !self.full_session_secs.is_finite()
            || self.short_session_secs >= self.full_session_secs
        {
            return Err(ScoringError::InvalidCalibration(
                "confidence: short-session bound must be below the full-session bound".to_string(),
            ));
        }
        let magnitudes = [
            self.short_session_penalty,
            self.full_session_bonus,
            self.visibility_penalty_per_pct,
            self.marker_bonus,
            self.marker_bonus_cap,
        ];
        if magnitudes.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(ScoringError::InvalidCalibration(
                "confidence: adjustment magnitudes must be non-negative".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_face_visibility_pct) {
            return Err(ScoringError::InvalidCalibration(
                "confidence: visibility floor must be in 0-100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-domain weighting of one task in the composite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainMultipliers {
    pub attention: f64,
    pub hyperactivity: f64,
    pub impulsivity: f64,
}

/// How diagnostic each task is for each domain.
///
/// A response-inhibition task's impulsivity score counts more than a
/// reading task's, and vice versa for restlessness during passive reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMultipliers {
    pub continuous_performance: DomainMultipliers,
    pub go_no_go: DomainMultipliers,
    pub working_memory: DomainMultipliers,
    pub reading: DomainMultipliers,
    pub attention_shifting: DomainMultipliers,
}

impl Default for TaskMultipliers {
    fn default() -> Self {
        Self {
            continuous_performance: DomainMultipliers {
                attention: 1.3,
                hyperactivity: 1.0,
                impulsivity: 1.0,
            },
            go_no_go: DomainMultipliers {
                attention: 1.0,
                hyperactivity: 1.0,
                impulsivity: 1.4,
            },
            working_memory: DomainMultipliers {
                attention: 1.2,
                hyperactivity: 1.0,
                impulsivity: 1.0,
            },
            reading: DomainMultipliers {
                attention: 1.1,
                hyperactivity: 1.2,
                impulsivity: 0.9,
            },
            attention_shifting: DomainMultipliers {
                attention: 1.2,
                hyperactivity: 1.0,
                impulsivity: 1.1,
            },
        }
    }
}

impl TaskMultipliers {
    pub fn for_task(&self, task: TaskKind) -> &DomainMultipliers {
        match task {
            TaskKind::ContinuousPerformance => &self.continuous_performance,
            TaskKind::GoNoGo => &self.go_no_go,
            TaskKind::WorkingMemory => &self.working_memory,
            TaskKind::Reading => &self.reading,
            TaskKind::AttentionShifting => &self.attention_shifting,
        }
    }

    fn all(&self) -> [&DomainMultipliers; 5] {
        [
            &self.continuous_performance,
            &self.go_no_go,
            &self.working_memory,
            &self.reading,
            &self.attention_shifting,
        ]
    }
}

/// Composite-assessment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Number of tasks in the full battery
    pub expected_tasks: u32,
    /// Confidence bonus per completed task
    pub per_task_bonus: f64,
    /// Confidence penalty per task missing from the battery
    pub missing_task_penalty: f64,
    /// Markers kept in a composite result after severity ranking
    pub max_markers: usize,
    pub multipliers: TaskMultipliers,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            expected_tasks: 5,
            per_task_bonus: 3.0,
            missing_task_penalty: 12.0,
            max_markers: 10,
            multipliers: TaskMultipliers::default(),
        }
    }
}

impl AggregationConfig {
    fn validate(&self) -> Result<(), ScoringError> {
        if self.expected_tasks == 0 {
            return Err(ScoringError::InvalidCalibration(
                "aggregation: expected task count must be positive".to_string(),
            ));
        }
        if self.max_markers == 0 {
            return Err(ScoringError::InvalidCalibration(
                "aggregation: marker limit must be positive".to_string(),
            ));
        }
        if self.per_task_bonus < 0.0 || self.missing_task_penalty < 0.0 {
            return Err(ScoringError::InvalidCalibration(
                "aggregation: confidence adjustments must be non-negative".to_string(),
            ));
        }
        for m in self.multipliers.all() {
            let values = [m.attention, m.hyperactivity, m.impulsivity];
            if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(ScoringError::InvalidCalibration(
                    "aggregation: task multipliers must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// The full versioned calibration table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Calibration revision this table was tuned as
    pub version: String,
    pub motion: MotionConfig,
    pub factors: FactorConfig,
    pub weights: WeightConfig,
    pub confidence: ConfidenceConfig,
    pub aggregation: AggregationConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            version: CALIBRATION_VERSION.to_string(),
            motion: MotionConfig::default(),
            factors: FactorConfig::default(),
            weights: WeightConfig::default(),
            confidence: ConfidenceConfig::default(),
            aggregation: AggregationConfig::default(),
        }
    }
}

impl CalibrationConfig {
    /// Check internal consistency of the whole table
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.version.trim().is_empty() {
            return Err(ScoringError::InvalidCalibration(
                "version must not be empty".to_string(),
            ));
        }
        self.motion.validate()?;
        self.factors.validate()?;
        self.weights.validate()?;
        self.confidence.validate()?;
        self.aggregation.validate()?;
        Ok(())
    }

    /// Load a calibration table from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ScoringError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the calibration table to JSON
    pub fn to_json(&self) -> Result<String, ScoringError> {
        serde_json::to_string_pretty(self).map_err(|e| ScoringError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_calibration_is_valid() {
        let config = CalibrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.version, CALIBRATION_VERSION);
    }

    #[test]
    fn test_step_table_lookup() {
        let table = StepTable::new(&[(0.5, 5.0), (1.5, 15.0), (3.0, 25.0)], 90.0);
        assert_eq!(table.score(0.0), 5.0);
        assert_eq!(table.score(0.5), 5.0);
        assert_eq!(table.score(0.51), 15.0);
        assert_eq!(table.score(3.0), 25.0);
        assert_eq!(table.score(14.0), 90.0);
    }

    #[test]
    fn test_step_table_rejects_non_finite_input() {
        let table = StepTable::new(&[(1.0, 10.0)], 50.0);
        assert_eq!(table.score(f64::NAN), 0.0);
        assert_eq!(table.score(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_non_monotone_table_rejected() {
        let mut config = CalibrationConfig::default();
        config.factors.face.look_away_rate.table =
            StepTable::new(&[(1.0, 30.0), (2.0, 10.0)], 90.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_descending_limits_rejected() {
        let mut config = CalibrationConfig::default();
        config.factors.motion.fidgeting.table = StepTable::new(&[(10.0, 5.0), (5.0, 20.0)], 90.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_broken_weight_sum_rejected() {
        let mut config = CalibrationConfig::default();
        config.weights.attention.look_away = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_broken_threshold_order_rejected() {
        let mut config = CalibrationConfig::default();
        config.motion.medium_threshold = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = CalibrationConfig::default();
        let json = config.to_json().unwrap();
        let loaded = CalibrationConfig::from_json(&json).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_from_json_rejects_invalid_table() {
        let mut config = CalibrationConfig::default();
        config.weights.overall.attention = 0.9;
        let json = serde_json::to_string(&config).unwrap();
        assert!(CalibrationConfig::from_json(&json).is_err());
    }

    #[test]
    fn test_multiplier_lookup() {
        let multipliers = TaskMultipliers::default();
        assert!(multipliers.for_task(TaskKind::GoNoGo).impulsivity > 1.0);
        assert!(multipliers.for_task(TaskKind::ContinuousPerformance).attention > 1.0);
    }
}
