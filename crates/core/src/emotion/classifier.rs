use crate::decode::CanonicalAudio;
use crate::emotion::EmotionDistribution;
use futures::future::BoxFuture;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("classifier request failed: {}", crate::util::error_chain(.0))]
    Http(#[from] reqwest::Error),

    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),

    #[error("audio encoding failed: {0}")]
    Encode(String),

    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

/// The speech-emotion model, seen as a function from waveform to label scores.
///
/// Implementations pass scores through unchanged. When the model reports a
/// label twice the later score wins.
pub trait EmotionClassifier: Send + Sync {
    fn classify(
        &self,
        audio: CanonicalAudio,
    ) -> BoxFuture<'_, Result<EmotionDistribution, ClassifyError>>;
}

impl<C: EmotionClassifier + ?Sized> EmotionClassifier for Arc<C> {
    fn classify(
        &self,
        audio: CanonicalAudio,
    ) -> BoxFuture<'_, Result<EmotionDistribution, ClassifyError>> {
        (**self).classify(audio)
    }
}

/// Collects `(label, score)` pairs, later duplicates overwriting earlier ones.
pub(crate) fn collect_scores<I, S>(pairs: I) -> EmotionDistribution
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    let mut out = EmotionDistribution::new();
    for (label, score) in pairs {
        out.insert(label.into(), score);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_duplicate_label_wins() {
        let d = collect_scores([("sad", 0.1), ("happy", 0.4), ("sad", 0.5)]);
        assert_eq!(d.len(), 2);
        assert_eq!(d["sad"], 0.5);
        assert_eq!(d["happy"], 0.4);
    }
}
