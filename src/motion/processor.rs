//! Motion signal processing
//!
//! Turns a ~50 Hz accelerometer stream (plus an optional gyroscope stream)
//! into denoised, rate-limited movement metrics. Samples pass through a
//! moving-average filter; the per-step delta of the filtered signal is
//! promoted to a motion event when it clears the noise floor. Analysis is
//! a pure function of the buffered events, so repeated calls over an
//! unchanged buffer return identical metrics.

use log::{debug, warn};

use crate::config::MotionConfig;
use crate::motion::filter::MovingAverageFilter;
use crate::motion::types::{IntensityBand, MotionEvent, MotionMetrics, MotionSample};
use std::collections::VecDeque;

/// Severity weight of a fidget-band event in the general-movement score
const SEVERITY_FIDGET: f64 = 0.15;
/// Severity weight of a medium-band event
const SEVERITY_MEDIUM: f64 = 0.45;
/// Severity weight of a large-band event
const SEVERITY_LARGE: f64 = 0.75;
/// Severity weight of a sudden-band event
const SEVERITY_SUDDEN: f64 = 1.0;

/// Stateful processor for one tracking session.
///
/// The sensor callback is the only writer; analysis snapshots may be taken
/// from another context through [`SharedMotionProcessor`]. A session runs
/// `start` -> `ingest`* -> `stop` -> `final_metrics`; `reset` abandons the
/// buffered data at any point.
///
/// [`SharedMotionProcessor`]: crate::motion::SharedMotionProcessor
#[derive(Debug, Clone)]
pub struct MotionSignalProcessor {
    config: MotionConfig,
    tracking: bool,
    accel_filter: MovingAverageFilter,
    gyro_filter: MovingAverageFilter,
    prev_accel: Option<[f64; 3]>,
    prev_gyro: Option<[f64; 3]>,
    events: VecDeque<MotionEvent>,
    gyro_deltas: VecDeque<f64>,
    accel_samples_seen: u64,
    gyro_samples_seen: u64,
    last_accel_ts: Option<u64>,
    last_gyro_ts: Option<u64>,
    dropped_events: u64,
}

impl Default for MotionSignalProcessor {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

impl MotionSignalProcessor {
    pub fn new(config: MotionConfig) -> Self {
        let window = config.filter_window;
        Self {
            config,
            tracking: false,
            accel_filter: MovingAverageFilter::new(window),
            gyro_filter: MovingAverageFilter::new(window),
            prev_accel: None,
            prev_gyro: None,
            events: VecDeque::new(),
            gyro_deltas: VecDeque::new(),
            accel_samples_seen: 0,
            gyro_samples_seen: 0,
            last_accel_ts: None,
            last_gyro_ts: None,
            dropped_events: 0,
        }
    }

    /// Begin a tracking session. No-op while already tracking, so repeated
    /// calls cannot wipe a session in progress.
    pub fn start(&mut self) {
        if self.tracking {
            return;
        }
        self.clear_buffers();
        self.tracking = true;
        debug!("motion tracking started");
    }

    /// Stop accepting samples. The event buffer is retained so the final
    /// snapshot can still be taken.
    pub fn stop(&mut self) {
        self.tracking = false;
    }

    /// Discard all buffered data and return to the idle state
    pub fn reset(&mut self) {
        self.clear_buffers();
        self.tracking = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Accelerometer samples accepted this session
    pub fn sample_count(&self) -> u64 {
        self.accel_samples_seen
    }

    /// Events currently buffered
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Feed one accelerometer sample.
    ///
    /// Ignored while not tracking. Non-finite and out-of-order samples are
    /// rejected at this boundary so they cannot corrupt the session.
    pub fn ingest(&mut self, sample: MotionSample) {
        if !self.tracking {
            return;
        }
        if !sample.is_finite() {
            debug!("rejected non-finite accelerometer sample");
            return;
        }
        if let Some(last) = self.last_accel_ts {
            if sample.timestamp_ms < last {
                debug!("rejected out-of-order accelerometer sample");
                return;
            }
        }
        self.last_accel_ts = Some(sample.timestamp_ms);
        self.accel_samples_seen += 1;

        let axes = [sample.x as f64, sample.y as f64, sample.z as f64];
        let filtered = match self.accel_filter.push(axes) {
            Some(filtered) => filtered,
            None => return,
        };
        if let Some(prev) = self.prev_accel {
            let dx = filtered[0] - prev[0];
            let dy = filtered[1] - prev[1];
            let dz = filtered[2] - prev[2];
            let magnitude = (dx * dx + dy * dy + dz * dz).sqrt();
            if magnitude > self.config.noise_threshold {
                self.push_event(MotionEvent {
                    timestamp_ms: sample.timestamp_ms,
                    dx,
                    dy,
                    dz,
                    magnitude,
                });
            }
        }
        self.prev_accel = Some(filtered);
    }

    /// Feed one gyroscope sample. The rotational deltas contribute to the
    /// fidgeting score when this stream is present.
    pub fn ingest_gyro(&mut self, sample: MotionSample) {
        if !self.tracking {
            return;
        }
        if !sample.is_finite() {
            debug!("rejected non-finite gyroscope sample");
            return;
        }
        if let Some(last) = self.last_gyro_ts {
            if sample.timestamp_ms < last {
                debug!("rejected out-of-order gyroscope sample");
                return;
            }
        }
        self.last_gyro_ts = Some(sample.timestamp_ms);
        self.gyro_samples_seen += 1;

        let axes = [sample.x as f64, sample.y as f64, sample.z as f64];
        let filtered = match self.gyro_filter.push(axes) {
            Some(filtered) => filtered,
            None => return,
        };
        if let Some(prev) = self.prev_gyro {
            let dx = filtered[0] - prev[0];
            let dy = filtered[1] - prev[1];
            let dz = filtered[2] - prev[2];
            self.gyro_deltas
                .push_back((dx * dx + dy * dy + dz * dz).sqrt());
            while self.gyro_deltas.len() > self.config.max_events {
                self.gyro_deltas.pop_front();
            }
        }
        self.prev_gyro = Some(filtered);
    }

    /// Compute metrics from the current buffer.
    ///
    /// Fewer than the configured minimum of events yields the all-zero
    /// default. Never fails.
    pub fn analyze(&self) -> MotionMetrics {
        let events: Vec<MotionEvent> = self.events.iter().copied().collect();
        let gyro_deltas: Vec<f64> = self.gyro_deltas.iter().copied().collect();
        analyze_events(&events, &gyro_deltas, &self.config)
    }

    /// The authoritative end-of-session snapshot: runs the analysis once
    /// more over the final buffer.
    pub fn final_metrics(&self) -> MotionMetrics {
        self.analyze()
    }

    fn clear_buffers(&mut self) {
        self.accel_filter.clear();
        self.gyro_filter.clear();
        self.prev_accel = None;
        self.prev_gyro = None;
        self.events.clear();
        self.gyro_deltas.clear();
        self.accel_samples_seen = 0;
        self.gyro_samples_seen = 0;
        self.last_accel_ts = None;
        self.last_gyro_ts = None;
        self.dropped_events = 0;
    }

    fn push_event(&mut self, event: MotionEvent) {
        self.events.push_back(event);
        while self.events.len() > self.config.max_events {
            self.events.pop_front();
            self.dropped_events += 1;
            if self.dropped_events == 1 {
                warn!("motion event buffer full, dropping oldest events");
            }
        }
    }
}

fn band(magnitude: f64, config: &MotionConfig) -> IntensityBand {
    if magnitude >= config.sudden_threshold {
        IntensityBand::Sudden
    } else if magnitude >= config.large_threshold {
        IntensityBand::Large
    } else if magnitude >= config.medium_threshold {
        IntensityBand::Medium
    } else {
        IntensityBand::Fidget
    }
}

fn axis_sign(value: f64, noise_threshold: f64) -> i8 {
    if value > noise_threshold {
        1
    } else if value < -noise_threshold {
        -1
    } else {
        0
    }
}

fn debounce_ok(last: Option<u64>, timestamp_ms: u64, interval_ms: u64) -> bool {
    match last {
        None => true,
        Some(last) => timestamp_ms.saturating_sub(last) >= interval_ms,
    }
}

fn is_aligned(a: &MotionEvent, b: &MotionEvent, min_similarity: f64) -> bool {
    if a.magnitude <= 0.0 || b.magnitude <= 0.0 {
        return false;
    }
    let dot = a.dx * b.dx + a.dy * b.dy + a.dz * b.dz;
    (dot / (a.magnitude * b.magnitude)).abs() >= min_similarity
}

/// Pure analysis over a time-ordered event buffer.
///
/// Derives intensity bins, the repetitive-movement term, the debounced and
/// capped direction-change and sudden-movement counts, and the blended
/// scores. Debounce state lives inside this fold, which is what keeps
/// repeated analysis of an unchanged buffer idempotent.
fn analyze_events(
    events: &[MotionEvent],
    gyro_deltas: &[f64],
    config: &MotionConfig,
) -> MotionMetrics {
    if events.len() < config.min_events {
        return MotionMetrics::default();
    }
    let (first, last) = match (events.first(), events.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return MotionMetrics::default(),
    };
    let n = events.len() as f64;
    let duration_sec = last.timestamp_ms.saturating_sub(first.timestamp_ms) as f64 / 1000.0;

    let mut band_counts = [0usize; 4];
    let mut magnitude_sum = 0.0;
    let mut direction_changes: u32 = 0;
    let mut sudden_movements: u32 = 0;
    let mut last_direction_ts: Option<u64> = None;
    let mut last_sudden_ts: Option<u64> = None;
    let mut axis_signs = [0i8; 3];
    let mut aligned_pairs: u64 = 0;
    let mut window_start = 0usize;

    for (i, event) in events.iter().enumerate() {
        magnitude_sum += event.magnitude;
        band_counts[band(event.magnitude, config) as usize] += 1;

        // A direction change needs at least one axis to flip sign on a
        // previously non-zero axis; the sign state always tracks the
        // physical signal even when the debounce suppresses the count.
        let signs = [
            axis_sign(event.dx, config.noise_threshold),
            axis_sign(event.dy, config.noise_threshold),
            axis_sign(event.dz, config.noise_threshold),
        ];
        let mut flipped = false;
        for axis in 0..3 {
            if signs[axis] != 0 {
                if axis_signs[axis] != 0 && signs[axis] != axis_signs[axis] {
                    flipped = true;
                }
                axis_signs[axis] = signs[axis];
            }
        }
        if flipped
            && direction_changes < config.max_direction_changes
            && debounce_ok(last_direction_ts, event.timestamp_ms, config.direction_debounce_ms)
        {
            direction_changes += 1;
            last_direction_ts = Some(event.timestamp_ms);
        }

        if event.magnitude >= config.sudden_threshold
            && sudden_movements < config.max_sudden_movements
            && debounce_ok(last_sudden_ts, event.timestamp_ms, config.sudden_debounce_ms)
        {
            sudden_movements += 1;
            last_sudden_ts = Some(event.timestamp_ms);
        }

        // Repetitive movement: pairs inside the rolling window whose
        // directions are aligned or anti-aligned (back-and-forth).
        while events[window_start]
            .timestamp_ms
            .saturating_add(config.repetitive_window_ms)
            < event.timestamp_ms
        {
            window_start += 1;
        }
        for other in events.iter().take(i).skip(window_start) {
            if is_aligned(other, event, config.repetitive_similarity) {
                aligned_pairs += 1;
            }
        }
    }

    let duration_min = duration_sec / 60.0;
    let pairs_per_min = if duration_min > 0.0 {
        aligned_pairs as f64 / duration_min
    } else {
        0.0
    };
    let repetitive = 1.0 - (-pairs_per_min / config.repetitive_rate_scale).exp();
    let fidget_fraction = band_counts[IntensityBand::Fidget as usize] as f64 / n;

    // Blend weights renormalize over the available terms when the
    // gyroscope stream is absent.
    let mut weighted = config.repetitive_weight * repetitive
        + config.fidget_band_weight * fidget_fraction;
    let mut weight_sum = config.repetitive_weight + config.fidget_band_weight;
    if !gyro_deltas.is_empty() {
        let mean_rotation = gyro_deltas.iter().sum::<f64>() / gyro_deltas.len() as f64;
        let rotation = 1.0 - (-mean_rotation / config.rotation_energy_scale).exp();
        weighted += config.rotation_weight * rotation;
        weight_sum += config.rotation_weight;
    }
    let fidgeting_score = if weight_sum > 0.0 {
        (100.0 * weighted / weight_sum).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let large_share = band_counts[IntensityBand::Large as usize] as f64 / n;
    let sudden_ratio = sudden_movements as f64 / config.max_sudden_movements as f64;
    let direction_ratio = direction_changes as f64 / config.max_direction_changes as f64;
    let dampening = (duration_sec / 60.0).min(1.0);
    let restlessness = (100.0
        * dampening
        * (config.restless_large_weight * large_share
            + config.restless_sudden_weight * sudden_ratio
            + config.restless_direction_weight * direction_ratio))
        .clamp(0.0, 100.0);

    let severity_sum = SEVERITY_FIDGET * band_counts[IntensityBand::Fidget as usize] as f64
        + SEVERITY_MEDIUM * band_counts[IntensityBand::Medium as usize] as f64
        + SEVERITY_LARGE * band_counts[IntensityBand::Large as usize] as f64
        + SEVERITY_SUDDEN * band_counts[IntensityBand::Sudden as usize] as f64;
    let general_movement_score = (100.0 * severity_sum / n).clamp(0.0, 100.0);

    MotionMetrics {
        fidgeting_score,
        general_movement_score,
        direction_changes,
        sudden_movements,
        movement_intensity: magnitude_sum / n,
        restlessness,
    }
}
