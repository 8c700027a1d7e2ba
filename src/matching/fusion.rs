//! Combination of classifier output and heuristic bonus into a 0-100 score

use crate::classifier::Prediction;
use crate::config::ScoringConfig;

/// Result of fusing one candidate's signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedScore {
    /// Classifier probability clamped to [0, 1]; non-finite values become 0
    pub probability: f64,
    /// Classifier probability plus heuristic bonus
    pub raw_total: f64,
    /// Normalized score in [0, 100], one decimal
    pub score: f64,
    /// Whether the candidate makes it into the result set
    pub include: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreFusion {
    theoretical_max: f64,
    inclusion_threshold: f64,
}

impl ScoreFusion {
    pub fn new(theoretical_max: f64, inclusion_threshold: f64) -> Self {
        Self {
            theoretical_max,
            inclusion_threshold,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.theoretical_max, config.inclusion_threshold)
    }

    pub fn fuse(&self, prediction: Prediction, bonus: f64) -> FusedScore {
        let probability = if prediction.probability.is_finite() {
            prediction.probability.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let raw_total = probability + bonus;
        let normalized = (raw_total / self.theoretical_max * 100.0).clamp(0.0, 100.0);

        FusedScore {
            probability,
            raw_total,
            score: round_one_decimal(normalized),
            include: prediction.relevant || raw_total > self.inclusion_threshold,
        }
    }
}

impl Default for ScoreFusion {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

/// Round to one decimal place, ties to even
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
