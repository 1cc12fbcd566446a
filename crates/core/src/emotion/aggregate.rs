use crate::emotion::{EmotionDistribution, EmotionWeights};
use serde::{Deserialize, Serialize};
use std::fmt;

const SCORE_DECIMALS: i32 = 4;

/// Stress level in [0.0, 1.0], rounded to four decimals.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct StressScore(f64);

impl StressScore {
    pub const ZERO: StressScore = StressScore(0.0);

    /// Clamps `raw` into range and rounds it. Non-finite input maps to zero.
    pub fn new(raw: f64) -> Self {
        if !raw.is_finite() {
            return Self::ZERO;
        }
        let scale = 10f64.powi(SCORE_DECIMALS);
        Self((raw.clamp(0.0, 1.0) * scale).round() / scale)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for StressScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Reduces a label distribution to a single stress score.
///
/// Each confidence is divided by the total before weighting, so the result is
/// a weighted average and does not depend on whether the scores sum to one.
/// A zero total means no signal and yields zero.
pub fn aggregate(emotions: &EmotionDistribution, weights: &EmotionWeights) -> StressScore {
    let total: f64 = emotions.values().sum();
    if total == 0.0 || !total.is_finite() {
        return StressScore::ZERO;
    }

    let score: f64 = emotions
        .iter()
        .map(|(label, value)| (value / total) * weights.weight(label))
        .sum();

    StressScore::new(score)
}
