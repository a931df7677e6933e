//! Sample rate conversion for bringing two clips onto a common time base.

use crate::error::AudioError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Input frames handed to the resampler per call.
const CHUNK_FRAMES: usize = 4096;

/// The common rate for a pair of clips: the lower of the two, capped at `cap`.
pub fn detail_rate(rate_a: u32, rate_b: u32, cap: u32) -> u32 {
    rate_a.min(rate_b).min(cap)
}

/// Number of samples `len` input samples become when converted `from` -> `to` Hz.
pub fn resampled_len(len: usize, from: u32, to: u32) -> usize {
    if from == to {
        return len;
    }
    (len as u64 * to as u64).div_ceil(from as u64) as usize
}

/// Convert `samples` from `from` Hz to `to` Hz with band-limited sinc interpolation.
///
/// The result is delay-compensated and exactly [`resampled_len`] samples long,
/// so index `i` of the output lines up with time `i / to` in the input.
pub fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, AudioError> {
    if from == to {
        return Ok(samples.to_vec());
    }

    let fail = |reason: String| AudioError::Resample { from, to, reason };

    if from == 0 || to == 0 {
        return Err(fail("sample rates must be non-zero".to_string()));
    }

    let expected = resampled_len(samples.len(), from, to);
    if expected == 0 {
        return Ok(Vec::new());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler =
        SincFixedIn::<f32>::new(to as f64 / from as f64, 1.0, params, CHUNK_FRAMES, 1)
            .map_err(|e| fail(e.to_string()))?;

    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay);
    let mut position = 0;

    while samples.len() - position >= resampler.input_frames_next() {
        let frames = resampler.input_frames_next();
        let block: [&[f32]; 1] = [&samples[position..position + frames]];
        let chunk = resampler
            .process(&block, None)
            .map_err(|e| fail(e.to_string()))?;
        output.extend_from_slice(&chunk[0]);
        position += frames;
    }

    if position < samples.len() {
        let tail: [&[f32]; 1] = [&samples[position..]];
        let chunk = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|e| fail(e.to_string()))?;
        output.extend_from_slice(&chunk[0]);
    }

    // Flush the filter tail until the delayed signal is fully out.
    while output.len() < expected + delay {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| fail(e.to_string()))?;
        if chunk[0].is_empty() {
            break;
        }
        output.extend_from_slice(&chunk[0]);
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected, 0.0);

    tracing::debug!(from, to, input = samples.len(), output = output.len(), "Resampled");

    Ok(output)
}
