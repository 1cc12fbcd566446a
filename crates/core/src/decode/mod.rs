use futures::future::BoxFuture;
use std::path::PathBuf;

mod resample;
mod symphonia_backend;

pub use resample::resample_fast;
pub use symphonia_backend::SymphoniaDecoder;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Mono f32 waveform at [`TARGET_SAMPLE_RATE`], peak-normalized to 1.0
/// unless silent.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalAudio {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl CanonicalAudio {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    #[cfg(test)]
    pub(crate) fn peak(&self) -> f32 {
        peak_abs(&self.samples)
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("failed to open audio file: {0}")]
    Open(#[from] std::io::Error),

    #[error("unrecognized audio format: {0}")]
    Probe(String),

    #[error("no decodable audio track")]
    MissingTrack,

    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("audio stream has no sample rate")]
    MissingSampleRate,

    #[error("resample failed: {0}")]
    Resample(String),

    #[error("audio contains non-finite samples")]
    NonFinite,

    #[error("decode task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

pub trait AudioDecoder: Send + Sync {
    fn decode(&self, path: PathBuf) -> BoxFuture<'_, Result<CanonicalAudio>>;
}

/// Scales `samples` in place so the largest magnitude becomes 1.0.
///
/// All-zero input is left untouched. Non-finite samples are rejected.
pub fn normalize_peak(samples: &mut [f32]) -> Result<()> {
    if samples.iter().any(|s| !s.is_finite()) {
        return Err(DecodeError::NonFinite);
    }
    let peak = peak_abs(samples);
    if peak < f32::MIN_POSITIVE {
        return Ok(());
    }
    let scale = 1.0 / peak;
    for s in samples.iter_mut() {
        *s *= scale;
    }
    Ok(())
}

/// Averages interleaved frames down to one channel.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

pub fn f32_to_i16_pcm(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16)
        .collect()
}

fn peak_abs(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scales_peak_to_one() {
        let mut v = vec![0.1, -0.25, 0.2];
        normalize_peak(&mut v).unwrap();
        assert!((v[1] + 1.0).abs() < 1e-6);
        assert!((v[0] - 0.4).abs() < 1e-6);
        assert!((v[2] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_silence_alone() {
        let mut v = vec![0.0; 16];
        normalize_peak(&mut v).unwrap();
        assert!(v.iter().all(|&s| s == 0.0));

        let mut empty: Vec<f32> = Vec::new();
        normalize_peak(&mut empty).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn normalize_rejects_non_finite() {
        let mut v = vec![0.5, f32::NAN];
        assert!(matches!(normalize_peak(&mut v), Err(DecodeError::NonFinite)));
    }

    #[test]
    fn downmix_averages_frames() {
        let mono = downmix_to_mono(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
        assert_eq!(downmix_to_mono(&[0.3, 0.4], 1), vec![0.3, 0.4]);
    }

    #[test]
    fn f32_to_i16_clamps_out_of_range() {
        let v = f32_to_i16_pcm(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(v, vec![-32767, -32767, 0, 32767, 32767]);
    }

    #[test]
    fn zeroed_buffer_is_silent() {
        let audio = CanonicalAudio::new(TARGET_SAMPLE_RATE, vec![0.0; 16_000]);
        assert!(audio.is_silent());
        assert_eq!(audio.peak(), 0.0);
    }
}
