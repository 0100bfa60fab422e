//! Rolling per-class score history

use crate::constants::calibration::{
    FP_PRIOR_WEIGHT, HISTORY_CAPACITY, HISTORY_DECAY, LOW_BUCKET_UPPER, MEDIUM_BUCKET_UPPER,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bucketed counts of calibrated scores for one class
///
/// Counts are fractional: once the total passes the capacity every bucket
/// decays, so old observations fade instead of being dropped outright.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassHistory {
    /// Scores below 0.4
    pub low: f32,
    /// Scores in `[0.4, 0.7)`
    pub medium: f32,
    /// Scores of 0.7 and above
    pub high: f32,
}

impl ClassHistory {
    /// Count one calibrated score
    pub fn record(&mut self, score: f32) {
        if score < LOW_BUCKET_UPPER {
            self.low += 1.0;
        } else if score < MEDIUM_BUCKET_UPPER {
            self.medium += 1.0;
        } else {
            self.high += 1.0;
        }

        if self.total() > HISTORY_CAPACITY {
            self.low *= HISTORY_DECAY;
            self.medium *= HISTORY_DECAY;
            self.high *= HISTORY_DECAY;
        }
    }

    /// Total (decayed) observation count
    pub fn total(&self) -> f32 {
        self.low + self.medium + self.high
    }

    /// Share of low-confidence observations, or `None` without history
    pub fn low_fraction(&self) -> Option<f32> {
        let total = self.total();
        if total > 0.0 {
            Some(self.low / total)
        } else {
            None
        }
    }

    /// Empirical false-positive rate smoothed towards `static_rate`
    ///
    /// ```text
    /// fp = (low + w·static_rate) / (total + w),   w = 10
    /// ```
    pub fn false_positive_rate(&self, static_rate: f32) -> f32 {
        (self.low + FP_PRIOR_WEIGHT * static_rate) / (self.total() + FP_PRIOR_WEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_by_score() {
        let mut history = ClassHistory::default();
        history.record(0.1);
        history.record(0.39);
        history.record(0.4);
        history.record(0.7);

        assert_eq!(history.low, 2.0);
        assert_eq!(history.medium, 1.0);
        assert_eq!(history.high, 1.0);
        assert_eq!(history.low_fraction(), Some(0.5));
    }

    #[test]
    fn empty_history_uses_static_rate() {
        let history = ClassHistory::default();
        assert_eq!(history.low_fraction(), None);
        assert!((history.false_positive_rate(0.1) - 0.1).abs() < 1e-7);
    }

    #[test]
    fn estimate_moves_towards_observations() {
        let mut history = ClassHistory::default();
        for _ in 0..90 {
            history.record(0.05);
        }

        // (90 + 1) / (90 + 10)
        assert!((history.false_positive_rate(0.1) - 0.91).abs() < 1e-5);
    }

    #[test]
    fn total_stays_bounded() {
        let mut history = ClassHistory::default();
        for i in 0..10_000 {
            history.record((i % 10) as f32 / 10.0);
        }

        assert!(history.total() <= HISTORY_CAPACITY);
        let fraction = history.low_fraction().unwrap_or(0.0);
        assert!(fraction > 0.3 && fraction < 0.5);
    }
}
