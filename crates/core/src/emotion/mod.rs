mod aggregate;
mod classifier;
mod fixed;
mod huggingface;
mod serialized;
mod weights;

use std::collections::BTreeMap;

pub use aggregate::{aggregate, StressScore};
pub use classifier::{ClassifyError, EmotionClassifier};
pub use fixed::FixedClassifier;
pub use huggingface::HuggingFaceClassifier;
pub use serialized::SerializedClassifier;
pub use weights::{EmotionWeights, WeightError, DEFAULT_WEIGHT};

/// Label -> confidence as reported by the classifier, untouched.
///
/// Scores are not required to sum to one. Ordered so iteration, and therefore
/// floating-point summation, is the same for equal maps.
pub type EmotionDistribution = BTreeMap<String, f64>;

/// The labels carried by the default weighting table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    /// How strongly the emotion signals stress, in [0, 1].
    pub fn stress_weight(self) -> f64 {
        match self {
            Emotion::Angry => 0.9,
            Emotion::Disgust => 0.7,
            Emotion::Fear => 0.8,
            Emotion::Happy => 0.1,
            Emotion::Sad => 0.6,
            Emotion::Surprise => 0.5,
            Emotion::Neutral => 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_lowercase_and_weights_in_unit_range() {
        for e in Emotion::ALL {
            assert_eq!(e.label(), e.label().to_lowercase());
            assert!((0.0..=1.0).contains(&e.stress_weight()), "{e:?}");
        }
    }
}
