use crate::decode::{AudioDecoder, DecodeError};
use crate::emotion::{
    aggregate, ClassifyError, EmotionClassifier, EmotionDistribution, EmotionWeights, StressScore,
};
use crate::fetch::{FetchError, ResourceFetcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

const LOG_TARGET: &str = "pipeline";

/// Failure in a stage after the resource was retrieved.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// The single error surfaced by [`Pipeline::analyze`].
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("parameter 'url' not provided")]
    MissingUrl,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("audio analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

impl PipelineError {
    /// Input problems detected before any stage ran.
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::MissingUrl)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub stress_level: StressScore,
    pub emotions: EmotionDistribution,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    /// Stored filename, not a path.
    pub file: String,
    pub analysis_result: AnalysisResult,
}

/// Fetch -> decode -> classify -> aggregate, one url at a time.
///
/// Holds no per-request state and may be shared across tasks. Nothing is
/// retried; the first failing stage ends the run.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn ResourceFetcher>,
    decoder: Arc<dyn AudioDecoder>,
    classifier: Arc<dyn EmotionClassifier>,
    weights: Arc<EmotionWeights>,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        decoder: Arc<dyn AudioDecoder>,
        classifier: Arc<dyn EmotionClassifier>,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            classifier,
            weights: Arc::new(EmotionWeights::default()),
        }
    }

    pub fn with_weights(mut self, weights: EmotionWeights) -> Self {
        self.weights = Arc::new(weights);
        self
    }

    pub async fn analyze(&self, url: &str) -> Result<AnalysisReport, PipelineError> {
        let result = self.run(url).await;
        match &result {
            Ok(report) => tracing::info!(
                target: LOG_TARGET,
                file = %report.file,
                stress_level = report.analysis_result.stress_level.value(),
                "analysis complete"
            ),
            Err(e) => tracing::warn!(target: LOG_TARGET, url, error = %e, "analysis failed"),
        }
        result
    }

    async fn run(&self, url: &str) -> Result<AnalysisReport, PipelineError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(PipelineError::MissingUrl);
        }
        let url = Url::parse(url).map_err(FetchError::from)?;

        let resource = self.fetcher.fetch(url).await?;
        let audio = self
            .decoder
            .decode(resource.path.clone())
            .await
            .map_err(AnalysisError::from)?;
        let emotions = self
            .classifier
            .classify(audio)
            .await
            .map_err(AnalysisError::from)?;
        let stress_level = aggregate(&emotions, &self.weights);

        Ok(AnalysisReport {
            file: resource.filename,
            analysis_result: AnalysisResult {
                stress_level,
                emotions,
            },
        })
    }
}
