//! Temporal smoothing of quadrant weights.
//!
//! Camera noise makes raw weights flicker from frame to frame, which is very
//! audible once mapped to volume. Each quadrant keeps a fixed-length ring of
//! recent weights and reports their mean.

use std::collections::VecDeque;

use crate::normalize::WeightVector;

/// Fixed-capacity history, oldest sample evicted on insert.
///
/// Starts full of zeros, so the mean ramps up over the first `capacity`
/// pushes.
#[derive(Debug, Clone)]
pub struct WeightHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl WeightHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: std::iter::repeat(0.0).take(capacity).collect(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a sample, evicting the oldest.
    pub fn push(&mut self, weight: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(weight);
    }

    /// Arithmetic mean of the whole buffer.
    pub fn mean(&self) -> f64 {
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Refill with zeros.
    pub fn clear(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0.0);
    }
}

/// One [`WeightHistory`] per quadrant.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    histories: [WeightHistory; 4],
}

impl TemporalSmoother {
    pub fn new(history_size: usize) -> Self {
        Self {
            histories: std::array::from_fn(|_| WeightHistory::new(history_size)),
        }
    }

    /// Record `weights` and return the per-quadrant means.
    pub fn smooth(&mut self, weights: &WeightVector) -> WeightVector {
        let mut smoothed = [0.0; 4];
        for (i, history) in self.histories.iter_mut().enumerate() {
            history.push(weights.0[i]);
            smoothed[i] = history.mean();
        }
        WeightVector(smoothed)
    }

    pub fn history(&self, index: usize) -> Option<&WeightHistory> {
        self.histories.get(index)
    }

    pub fn reset(&mut self) {
        self.histories.iter_mut().for_each(WeightHistory::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_keeps_the_last_n_samples() {
        let mut history = WeightHistory::new(3);
        for w in [0.1, 0.2, 0.3, 0.4, 0.5] {
            history.push(w);
        }
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![0.3, 0.4, 0.5]);
    }

    #[test]
    fn history_starts_at_zero() {
        let mut history = WeightHistory::new(10);
        assert_eq!(history.mean(), 0.0);
        history.push(1.0);
        assert!((history.mean() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn smoother_converges_on_constant_input() {
        let mut smoother = TemporalSmoother::new(10);
        let input = WeightVector::new(1.0, 0.1, 0.5, 0.25);
        let mut out = WeightVector::default();
        for _ in 0..10 {
            out = smoother.smooth(&input);
        }
        for i in 0..4 {
            assert!((out.0[i] - input.0[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn reset_returns_to_zeros() {
        let mut smoother = TemporalSmoother::new(4);
        smoother.smooth(&WeightVector::uniform(1.0));
        smoother.reset();
        assert_eq!(smoother.history(0).unwrap().mean(), 0.0);
        assert_eq!(smoother.history(0).unwrap().capacity(), 4);
        assert!(smoother.history(4).is_none());
    }
}
