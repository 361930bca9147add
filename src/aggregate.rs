//! Session aggregation
//!
//! Merges several task results into one composite assessment. Each task
//! emphasizes different domains, so per-task multipliers reweight the
//! domain averages before the overall score is recomputed from the
//! composite domains. Confidence grows with the number of completed tasks
//! and drops sharply when the battery is incomplete.

use std::collections::HashMap;

use crate::config::CalibrationConfig;
use crate::types::{BehavioralMarker, CompositeResult, ScoringResult};

/// Combines per-task [`ScoringResult`]s into a [`CompositeResult`].
///
/// Stateless: `combine` depends only on its inputs and the calibration
/// handed in at construction. Never fails; an empty slice yields the
/// all-zero composite.
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    calibration: CalibrationConfig,
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

impl SessionAggregator {
    pub fn new(calibration: CalibrationConfig) -> Self {
        Self { calibration }
    }

    pub fn combine(&self, results: &[ScoringResult]) -> CompositeResult {
        if results.is_empty() {
            return CompositeResult::empty();
        }
        let aggregation = &self.calibration.aggregation;
        let task_count = results.len() as f64;

        let mut attention = MultipliedMean::default();
        let mut hyperactivity = MultipliedMean::default();
        let mut impulsivity = MultipliedMean::default();
        let mut confidence_sum = 0.0;
        let mut total_duration_ms: u64 = 0;

        for result in results {
            let multipliers = aggregation.multipliers.for_task(result.task);
            attention.add(result.attention_score, multipliers.attention);
            hyperactivity.add(result.hyperactivity_score, multipliers.hyperactivity);
            impulsivity.add(result.impulsivity_score, multipliers.impulsivity);
            confidence_sum += result.confidence_level;
            total_duration_ms = total_duration_ms.saturating_add(result.duration_ms);
        }

        let attention_score = attention.value();
        let hyperactivity_score = hyperactivity.value();
        let impulsivity_score = impulsivity.value();

        // The composite overall comes from the composite domains, not
        // from averaging the per-task overall scores.
        let overall_weights = &self.calibration.weights.overall;
        let weight_sum =
            overall_weights.attention + overall_weights.hyperactivity + overall_weights.impulsivity;
        let adhd_probability_score = if weight_sum > 0.0 {
            ((overall_weights.attention * attention_score
                + overall_weights.hyperactivity * hyperactivity_score
                + overall_weights.impulsivity * impulsivity_score)
                / weight_sum)
                .clamp(0.0, 100.0)
        } else {
            0.0
        };

        let missing_tasks = f64::from(aggregation.expected_tasks) - task_count;
        let confidence_level = (confidence_sum / task_count
            + aggregation.per_task_bonus * task_count
            - aggregation.missing_task_penalty * missing_tasks.max(0.0))
        .clamp(0.0, 100.0);

        CompositeResult {
            adhd_probability_score,
            attention_score,
            hyperactivity_score,
            impulsivity_score,
            confidence_level,
            markers: merge_markers(results, aggregation.max_markers),
            tasks_completed: results.len() as u32,
            total_duration_ms,
        }
    }
}

#[derive(Debug, Default)]
struct MultipliedMean {
    total: f64,
    weight: f64,
}

impl MultipliedMean {
    fn add(&mut self, score: f64, multiplier: f64) {
        if multiplier <= 0.0 {
            return;
        }
        self.total += score * multiplier;
        self.weight += multiplier;
    }

    fn value(&self) -> f64 {
        if self.weight > 0.0 {
            (self.total / self.weight).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Deduplicate by name keeping the highest-severity instance, rank by
/// severity descending, and keep the top entries.
fn merge_markers(results: &[ScoringResult], max_markers: usize) -> Vec<BehavioralMarker> {
    let mut by_name: HashMap<&str, &BehavioralMarker> = HashMap::new();
    for marker in results.iter().flat_map(|result| result.markers.iter()) {
        match by_name.get(marker.name.as_str()) {
            Some(existing) if existing.severity() >= marker.severity() => {}
            _ => {
                by_name.insert(marker.name.as_str(), marker);
            }
        }
    }
    let mut merged: Vec<BehavioralMarker> = by_name.into_values().cloned().collect();
    merged.sort_by(|a, b| {
        b.severity()
            .partial_cmp(&a.severity())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    merged.truncate(max_markers);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskKind;

    fn marker(name: &str, value: f64, threshold: f64, significance: u8) -> BehavioralMarker {
        BehavioralMarker {
            name: name.to_string(),
            value,
            threshold,
            significance,
            description: format!("{name} test marker"),
        }
    }

    fn result(task: TaskKind, attention: f64, hyperactivity: f64, impulsivity: f64) -> ScoringResult {
        ScoringResult {
            task,
            adhd_probability_score: 0.45 * attention + 0.30 * hyperactivity + 0.25 * impulsivity,
            attention_score: attention,
            hyperactivity_score: hyperactivity,
            impulsivity_score: impulsivity,
            confidence_level: 70.0,
            markers: Vec::new(),
            duration_ms: 60_000,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_composite() {
        let composite = SessionAggregator::default().combine(&[]);
        assert_eq!(composite, CompositeResult::empty());
    }

    #[test]
    fn test_single_task_passes_domains_through() {
        let aggregator = SessionAggregator::default();
        let composite = aggregator.combine(&[result(TaskKind::GoNoGo, 40.0, 30.0, 60.0)]);
        // One task: multipliers cancel in the weighted mean
        assert!((composite.attention_score - 40.0).abs() < 1e-9);
        assert!((composite.hyperactivity_score - 30.0).abs() < 1e-9);
        assert!((composite.impulsivity_score - 60.0).abs() < 1e-9);
        assert_eq!(composite.tasks_completed, 1);
        assert_eq!(composite.total_duration_ms, 60_000);
    }

    #[test]
    fn test_task_multipliers_emphasize_domains() {
        let aggregator = SessionAggregator::default();
        // Go/no-go carries a 1.4x impulsivity multiplier, reading 0.9x
        let go_no_go = result(TaskKind::GoNoGo, 50.0, 50.0, 80.0);
        let reading = result(TaskKind::Reading, 50.0, 50.0, 20.0);
        let composite = aggregator.combine(&[go_no_go, reading]);
        let plain_mean = (80.0 + 20.0) / 2.0;
        let weighted = (1.4 * 80.0 + 0.9 * 20.0) / (1.4 + 0.9);
        assert!((composite.impulsivity_score - weighted).abs() < 1e-9);
        assert!(composite.impulsivity_score > plain_mean);
    }

    #[test]
    fn test_overall_recomputed_from_composite_domains() {
        let aggregator = SessionAggregator::default();
        let first = result(TaskKind::WorkingMemory, 80.0, 10.0, 10.0);
        let second = result(TaskKind::Reading, 10.0, 80.0, 10.0);
        let composite = aggregator.combine(&[first.clone(), second.clone()]);

        let expected = 0.45 * composite.attention_score
            + 0.30 * composite.hyperactivity_score
            + 0.25 * composite.impulsivity_score;
        assert!((composite.adhd_probability_score - expected).abs() < 1e-9);

        let averaged_overalls =
            (first.adhd_probability_score + second.adhd_probability_score) / 2.0;
        assert!((composite.adhd_probability_score - averaged_overalls).abs() > 0.1);
    }

    #[test]
    fn test_confidence_rises_with_completed_tasks() {
        let aggregator = SessionAggregator::default();
        let tasks = [
            TaskKind::ContinuousPerformance,
            TaskKind::GoNoGo,
            TaskKind::WorkingMemory,
            TaskKind::Reading,
            TaskKind::AttentionShifting,
        ];
        let mut previous = -1.0;
        for count in 1..=tasks.len() {
            let results: Vec<ScoringResult> = tasks[..count]
                .iter()
                .map(|task| result(*task, 40.0, 40.0, 40.0))
                .collect();
            let composite = aggregator.combine(&results);
            assert!(
                composite.confidence_level > previous,
                "confidence did not rise at {count} tasks"
            );
            previous = composite.confidence_level;
        }
        // Full battery: mean 70 plus the per-task bonus, no penalty
        assert!((previous - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_incomplete_battery_reduces_confidence_sharply() {
        let aggregator = SessionAggregator::default();
        let one = aggregator.combine(&[result(TaskKind::GoNoGo, 40.0, 40.0, 40.0)]);
        // One of five tasks: 70 + 3 - 4 * 12
        assert!((one.confidence_level - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_markers_deduplicated_by_highest_severity() {
        let aggregator = SessionAggregator::default();
        let mut first = result(TaskKind::GoNoGo, 40.0, 40.0, 40.0);
        first.markers = vec![
            marker("fidgeting", 50.0, 55.0, 1),
            marker("low_accuracy", 40.0, 45.0, 1),
        ];
        let mut second = result(TaskKind::Reading, 40.0, 40.0, 40.0);
        second.markers = vec![marker("fidgeting", 80.0, 55.0, 3)];

        let composite = aggregator.combine(&[first, second]);
        let fidgeting: Vec<&BehavioralMarker> = composite
            .markers
            .iter()
            .filter(|m| m.name == "fidgeting")
            .collect();
        assert_eq!(fidgeting.len(), 1);
        assert_eq!(fidgeting[0].significance, 3);
        assert!((fidgeting[0].value - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_markers_sorted_by_severity_and_truncated() {
        let aggregator = SessionAggregator::default();
        let mut session = result(TaskKind::GoNoGo, 40.0, 40.0, 40.0);
        session.markers = (0..15)
            .map(|i| marker(&format!("signal_{i:02}"), 10.0 + i as f64, 10.0, 2))
            .collect();
        let composite = aggregator.combine(&[session]);

        assert_eq!(composite.markers.len(), 10);
        for pair in composite.markers.windows(2) {
            assert!(pair[0].severity() >= pair[1].severity());
        }
        // The weakest entries fell off the end
        assert!(composite.markers.iter().all(|m| m.value >= 15.0));
    }
}
