use crate::config::{ApiToken, ClassifierConfig};
use crate::decode::{f32_to_i16_pcm, CanonicalAudio};
use crate::emotion::classifier::collect_scores;
use crate::emotion::{ClassifyError, EmotionClassifier, EmotionDistribution};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;

const LOG_TARGET: &str = "emotion::huggingface";

/// Audio-classification model served over HTTP in the Hugging Face inference
/// format: WAV bytes in, `[{"label", "score"}]` out.
#[derive(Clone)]
pub struct HuggingFaceClassifier {
    client: Client,
    endpoint: String,
    token: Option<ApiToken>,
}

impl HuggingFaceClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        if config.endpoint.trim().is_empty() {
            return Err(ClassifyError::Unavailable(
                "classifier endpoint is empty".to_owned(),
            ));
        }
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }

    async fn infer(&self, audio: CanonicalAudio) -> Result<EmotionDistribution, ClassifyError> {
        let wav = encode_wav(&audio)?;
        tracing::debug!(
            target: LOG_TARGET,
            endpoint = %self.endpoint,
            samples = audio.samples.len(),
            sample_rate = audio.sample_rate,
            "classifying audio"
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "audio/wav")
            .body(wav);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token.expose()));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(target: LOG_TARGET, status = status.as_u16(), "classifier rejected request");
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        parse_scores(&bytes)
    }
}

impl EmotionClassifier for HuggingFaceClassifier {
    fn classify(
        &self,
        audio: CanonicalAudio,
    ) -> BoxFuture<'_, Result<EmotionDistribution, ClassifyError>> {
        self.infer(audio).boxed()
    }
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

// Single inputs come back flat; some deployments wrap them in a batch.
#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Flat(Vec<LabelScore>),
    Batched(Vec<Vec<LabelScore>>),
}

fn parse_scores(body: &[u8]) -> Result<EmotionDistribution, ClassifyError> {
    let parsed: InferenceResponse = serde_json::from_slice(body)
        .map_err(|e| ClassifyError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

    let scores = match parsed {
        InferenceResponse::Flat(scores) => scores,
        InferenceResponse::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
    };
    Ok(collect_scores(scores.into_iter().map(|s| (s.label, s.score))))
}

/// 16-bit mono WAV at the audio's own sample rate.
fn encode_wav(audio: &CanonicalAudio) -> Result<Vec<u8>, ClassifyError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| ClassifyError::Encode(e.to_string()))?;
        for sample in f32_to_i16_pcm(&audio.samples) {
            writer
                .write_sample(sample)
                .map_err(|e| ClassifyError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| ClassifyError::Encode(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}
