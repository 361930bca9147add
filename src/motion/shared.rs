//! Thread-safe handle around the motion processor
//!
//! Sensor callbacks typically arrive on a platform thread while scoring
//! happens elsewhere. This wrapper serializes all access through one
//! mutex, keeping the single-writer rule without asking callers to manage
//! locking themselves.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::MotionConfig;
use crate::motion::processor::MotionSignalProcessor;
use crate::motion::types::{MotionMetrics, MotionSample};

/// Cloneable, lock-guarded view of one [`MotionSignalProcessor`].
///
/// Clones share the same underlying processor. Every method takes the lock
/// for the duration of one call; a poisoned lock is recovered rather than
/// propagated, since the processor holds no invariants that a panic
/// mid-call could break.
#[derive(Debug, Clone)]
pub struct SharedMotionProcessor {
    inner: Arc<Mutex<MotionSignalProcessor>>,
}

impl Default for SharedMotionProcessor {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

impl SharedMotionProcessor {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MotionSignalProcessor::new(config))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MotionSignalProcessor> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn start(&self) {
        self.lock().start();
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn is_tracking(&self) -> bool {
        self.lock().is_tracking()
    }

    pub fn ingest(&self, sample: MotionSample) {
        self.lock().ingest(sample);
    }

    pub fn ingest_gyro(&self, sample: MotionSample) {
        self.lock().ingest_gyro(sample);
    }

    pub fn sample_count(&self) -> u64 {
        self.lock().sample_count()
    }

    pub fn event_count(&self) -> usize {
        self.lock().event_count()
    }

    pub fn analyze(&self) -> MotionMetrics {
        self.lock().analyze()
    }

    pub fn final_metrics(&self) -> MotionMetrics {
        self.lock().final_metrics()
    }
}
