//! Sample rate conversion using rubato
//!
//! Two consumers:
//! - the decode boundary, which normalizes every source file to the working
//!   44.1 kHz rate before it enters the mix engine
//! - the playback-rate warp, which resamples by an arbitrary ratio to slow a
//!   tail down (tape-stop style effects)

use crate::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Working sample rate for all mix engine buffers
pub const WORKING_SAMPLE_RATE: u32 = 44_100;

/// Resample interleaved audio to the working 44.1 kHz rate.
///
/// Returns the input unchanged when it is already at the working rate.
pub fn resample_to_working(input: &[f32], input_rate: u32, channels: u16) -> Result<Vec<f32>> {
    if input_rate == WORKING_SAMPLE_RATE {
        return Ok(input.to_vec());
    }

    debug!(
        "Resampling {} Hz -> {} Hz ({} channels)",
        input_rate, WORKING_SAMPLE_RATE, channels
    );
    resample_by_ratio(
        input,
        channels,
        WORKING_SAMPLE_RATE as f64 / input_rate as f64,
    )
}

/// Resample interleaved audio by an arbitrary output/input ratio.
///
/// A ratio above 1.0 lengthens the audio (more output frames than input).
pub fn resample_by_ratio(input: &[f32], channels: u16, ratio: f64) -> Result<Vec<f32>> {
    let channels = channels.max(1) as usize;
    let input_frames = input.len() / channels;
    if input_frames == 0 {
        return Ok(Vec::new());
    }

    // One fixed-size chunk covering the whole input; the engine works on
    // fully decoded clips, not streams
    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        channels,
    )
    .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

    let planar_input = deinterleave(input, channels);
    let planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

    Ok(interleave(&planar_output))
}

/// Split interleaved samples into per-channel vectors for rubato
fn deinterleave(input: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = input.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in input.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            planar[ch].push(sample);
        }
    }
    planar
}

/// Merge per-channel vectors back into interleaved samples
fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let channels = planar.len();
    let frames = planar.first().map_or(0, |c| c.len());
    let mut out = Vec::with_capacity(frames * channels);
    for i in 0..frames {
        for channel in planar {
            out.push(channel[i]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_rate_is_passthrough() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        let out = resample_to_working(&input, WORKING_SAMPLE_RATE, 2).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_resample_48k_to_working() {
        let input = vec![0.5f32; 48_000 * 2]; // 1 second of stereo at 48 kHz
        let out = resample_to_working(&input, 48_000, 2).unwrap();
        let frames = out.len() / 2;
        assert!(
            (frames as i64 - 44_100).abs() < 500,
            "expected ~44100 frames, got {}",
            frames
        );
    }

    #[test]
    fn test_ratio_above_one_lengthens() {
        let input = vec![0.5f32; 44_100 * 2];
        let out = resample_by_ratio(&input, 2, 1.25).unwrap();
        let frames = out.len() / 2;
        assert!(
            (frames as i64 - 55_125).abs() < 500,
            "expected ~55125 frames, got {}",
            frames
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(resample_by_ratio(&[], 2, 1.5).unwrap().is_empty());
    }

    #[test]
    fn test_deinterleave_interleave_roundtrip() {
        let input = vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let planar = deinterleave(&input, 2);
        assert_eq!(planar[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(planar[1], vec![-1.0, -2.0, -3.0]);
        assert_eq!(interleave(&planar), input);
    }
}
