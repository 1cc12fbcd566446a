use super::{DecodeError, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

const CHUNK_FRAMES: usize = 1024;

/// Converts mono `input` from `from_hz` to `to_hz` with rubato's polynomial
/// (non-sinc) resampler, trading some quality for speed.
///
/// The resampler's output delay is trimmed so the result lines up with the
/// input and holds `ceil(len * to_hz / from_hz)` samples.
pub fn resample_fast(input: &[f32], from_hz: u32, to_hz: u32) -> Result<Vec<f32>> {
    if from_hz == 0 || to_hz == 0 {
        return Err(DecodeError::Resample(format!(
            "invalid sample rates {from_hz} Hz -> {to_hz} Hz"
        )));
    }
    if from_hz == to_hz || input.is_empty() {
        return Ok(input.to_vec());
    }

    let ratio = f64::from(to_hz) / f64::from(from_hz);
    let mut resampler =
        FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, CHUNK_FRAMES, 1)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;

    let expected = (input.len() as f64 * ratio).ceil() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + CHUNK_FRAMES);

    let mut pos = 0;
    while input.len() - pos >= resampler.input_frames_next() {
        let needed = resampler.input_frames_next();
        let block = resampler
            .process(&[&input[pos..pos + needed]], None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        output.extend_from_slice(&block[0]);
        pos += needed;
    }

    if pos < input.len() {
        let tail: [&[f32]; 1] = [&input[pos..]];
        let block = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        output.extend_from_slice(&block[0]);
    }

    // Flush what is still buffered behind the delay line.
    while output.len() < expected + delay {
        let block = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        if block[0].is_empty() {
            break;
        }
        output.extend_from_slice(&block[0]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);
    Ok(output)
}
