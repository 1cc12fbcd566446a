use super::{
    downmix_to_mono, normalize_peak, resample_fast, AudioDecoder, CanonicalAudio, DecodeError,
    Result, TARGET_SAMPLE_RATE,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

const LOG_TARGET: &str = "decode::symphonia";

/// Decodes wav, mp3, ogg/vorbis and flac files into [`CanonicalAudio`].
///
/// The container is detected from the file contents only. The filename
/// extension is never passed as a hint, so a `.wav` name holding mp3 bytes
/// still decodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Blocking decode of `path`. Runs the whole canonicalization chain.
    pub fn decode_blocking(path: &Path) -> Result<CanonicalAudio> {
        let (mono, source_rate) = read_mono(path)?;

        let mut samples = if source_rate == TARGET_SAMPLE_RATE {
            mono
        } else {
            tracing::debug!(
                target: LOG_TARGET,
                from_hz = source_rate,
                to_hz = TARGET_SAMPLE_RATE,
                "resampling"
            );
            resample_fast(&mono, source_rate, TARGET_SAMPLE_RATE)?
        };
        normalize_peak(&mut samples)?;

        let audio = CanonicalAudio::new(TARGET_SAMPLE_RATE, samples);
        if audio.is_silent() {
            tracing::warn!(target: LOG_TARGET, path = %path.display(), "decoded audio is silent");
        }
        Ok(audio)
    }
}

fn read_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Probe(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::MissingTrack)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedCodec(e.to_string()))?;

    let mut mono = Vec::new();
    let mut channels_seen = 0usize;
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = sample_rate.or(Some(spec.rate));
                let channels = spec.channels.count();
                channels_seen = channels_seen.max(channels);

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                mono.extend(downmix_to_mono(buf.samples(), channels));
            }
            Err(SymphoniaError::DecodeError(e)) => {
                skipped += 1;
                tracing::warn!(target: LOG_TARGET, error = %e, "skipping corrupt packet");
            }
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        }
    }

    let sample_rate = sample_rate.ok_or(DecodeError::MissingSampleRate)?;
    tracing::info!(
        target: LOG_TARGET,
        path = %path.display(),
        sample_rate,
        channels = channels_seen,
        frames = mono.len(),
        skipped_packets = skipped,
        "audio decoded"
    );
    Ok((mono, sample_rate))
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: PathBuf) -> BoxFuture<'_, Result<CanonicalAudio>> {
        async move {
            tokio::task::spawn_blocking(move || Self::decode_blocking(&path))
                .await
                .map_err(|e| DecodeError::Task(e.to_string()))?
        }
        .boxed()
    }
}
