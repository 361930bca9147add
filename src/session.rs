//! Session orchestration
//!
//! Wires the pipeline together for the two ways a session reaches the
//! scorer: live (a [`TaskSession`] collecting sensor samples while the
//! child works through a task) and recorded (a [`RecordedSession`] file
//! replayed through the same motion analysis). The [`ScreeningEngine`]
//! accumulates per-task results across a battery and produces the
//! composite assessment.

use log::debug;

use crate::aggregate::SessionAggregator;
use crate::config::CalibrationConfig;
use crate::error::ScoringError;
use crate::motion::{MotionMetrics, MotionSignalProcessor, SharedMotionProcessor};
use crate::schema::RecordedSession;
use crate::scoring::DomainScorer;
use crate::types::{CompositeResult, FaceMetrics, PerformanceMetrics, ScoringResult, TaskKind};

/// Validate and score a recorded session.
///
/// The motion streams are replayed through a fresh processor, so a
/// recording scores identically to the live session that produced it. A
/// recording without accelerometer data scores with the motion stream
/// absent.
pub fn score_recorded(
    session: &RecordedSession,
    calibration: &CalibrationConfig,
) -> Result<ScoringResult, ScoringError> {
    session.validate()?;

    let mut processor = MotionSignalProcessor::new(calibration.motion.clone());
    processor.start();
    for sample in &session.accel_samples {
        processor.ingest(*sample);
    }
    for sample in &session.gyro_samples {
        processor.ingest_gyro(*sample);
    }
    processor.stop();
    debug!(
        "replayed {} accel samples into {} motion events",
        processor.sample_count(),
        processor.event_count()
    );
    let motion = if processor.sample_count() > 0 {
        Some(processor.final_metrics())
    } else {
        None
    };

    let scorer = DomainScorer::new(calibration.clone());
    Ok(scorer.analyze(
        session.task,
        &session.performance,
        session.face.as_ref(),
        motion.as_ref(),
    ))
}

/// One live task in progress.
///
/// Owns the shared motion processor for the task and scores the session
/// when it completes. Dropping a session without calling [`complete`]
/// simply discards it.
///
/// [`complete`]: TaskSession::complete
#[derive(Debug)]
pub struct TaskSession {
    task: TaskKind,
    motion: SharedMotionProcessor,
    scorer: DomainScorer,
}

impl TaskSession {
    fn new(task: TaskKind, calibration: CalibrationConfig) -> Self {
        debug!("starting {} task session", task.as_str());
        let motion = SharedMotionProcessor::new(calibration.motion.clone());
        motion.start();
        TaskSession {
            task,
            motion,
            scorer: DomainScorer::new(calibration),
        }
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    /// Handle for the sensor callback thread to feed samples into
    pub fn motion_handle(&self) -> SharedMotionProcessor {
        self.motion.clone()
    }

    /// Snapshot of the motion metrics so far, for live UI feedback
    pub fn live_motion(&self) -> MotionMetrics {
        self.motion.analyze()
    }

    /// Abandon the session and discard its buffered samples
    pub fn abort(self) {
        self.motion.reset();
    }

    /// Stop tracking and score the session.
    ///
    /// If no accelerometer samples ever arrived the motion stream is
    /// treated as absent rather than as zero movement.
    pub fn complete(
        self,
        performance: &PerformanceMetrics,
        face: Option<&FaceMetrics>,
    ) -> ScoringResult {
        self.motion.stop();
        let metrics = if self.motion.sample_count() > 0 {
            Some(self.motion.final_metrics())
        } else {
            None
        };
        let result = self
            .scorer
            .analyze(self.task, performance, face, metrics.as_ref());
        debug!(
            "{} task complete: {} markers, confidence {:.0}",
            self.task.as_str(),
            result.markers.len(),
            result.confidence_level
        );
        result
    }
}

/// Accumulates task results across one screening battery.
///
/// The calibration is fixed at construction and handed to every session
/// the engine starts, so all tasks in a battery score against the same
/// table.
#[derive(Debug)]
pub struct ScreeningEngine {
    calibration: CalibrationConfig,
    aggregator: SessionAggregator,
    results: Vec<ScoringResult>,
}

impl Default for ScreeningEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreeningEngine {
    pub fn new() -> Self {
        ScreeningEngine {
            aggregator: SessionAggregator::default(),
            calibration: CalibrationConfig::default(),
            results: Vec::new(),
        }
    }

    /// Build an engine around a custom calibration, rejecting tables that
    /// fail validation
    pub fn with_calibration(calibration: CalibrationConfig) -> Result<Self, ScoringError> {
        calibration.validate()?;
        Ok(ScreeningEngine {
            aggregator: SessionAggregator::new(calibration.clone()),
            calibration,
            results: Vec::new(),
        })
    }

    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }

    /// Start a live task session. The session begins tracking motion
    /// immediately.
    pub fn begin_task(&self, task: TaskKind) -> TaskSession {
        TaskSession::new(task, self.calibration.clone())
    }

    /// Record a completed task result
    pub fn record(&mut self, result: ScoringResult) {
        self.results.push(result);
    }

    /// Score a recorded session and record the result
    pub fn process_session(
        &mut self,
        session: &RecordedSession,
    ) -> Result<ScoringResult, ScoringError> {
        let result = score_recorded(session, &self.calibration)?;
        self.results.push(result.clone());
        Ok(result)
    }

    pub fn results(&self) -> &[ScoringResult] {
        &self.results
    }

    /// Composite assessment over every recorded result so far
    pub fn composite(&self) -> CompositeResult {
        self.aggregator.combine(&self.results)
    }

    /// Drop all recorded results, keeping the calibration
    pub fn clear(&mut self) {
        self.results.clear();
    }
}
