//! Sliding-window smoothing for inertial streams

use std::collections::VecDeque;

/// Fixed-size moving-average filter over a 3-axis stream.
///
/// Emits nothing until the window is full, which suppresses transient
/// startup noise, then yields the window mean for every pushed sample.
#[derive(Debug, Clone)]
pub(crate) struct MovingAverageFilter {
    window: VecDeque<[f64; 3]>,
    capacity: usize,
}

impl MovingAverageFilter {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Push one sample and return the filtered axes once the window is full
    pub fn push(&mut self, axes: [f64; 3]) -> Option<[f64; 3]> {
        self.window.push_back(axes);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
        if self.window.len() < self.capacity {
            return None;
        }
        let n = self.window.len() as f64;
        let mut mean = [0.0; 3];
        for sample in &self.window {
            mean[0] += sample[0];
            mean[1] += sample[1];
            mean[2] += sample[2];
        }
        Some([mean[0] / n, mean[1] / n, mean[2] / n])
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
