//! Core audio data types
//!
//! `AudioBuffer` is the immutable value type every stage of the mix engine
//! trades in. Each transform allocates and returns a new buffer; the input is
//! never touched, so callers can hold on to intermediate results freely.
//!
//! **Format:**
//! - Samples are f32 (floating point -1.0 to 1.0, unclamped after mixing)
//! - Interleaved by channel: [L, R, L, R, ...] for stereo
//! - Buffers entering the mix engine are normalized to 44100 Hz stereo at the
//!   decode boundary; transforms reject mismatched formats instead of
//!   resampling on the fly.

use crate::audio::resampler;
use crate::{Error, Result};

/// Number of channels in the working format
pub const WORKING_CHANNELS: u16 = 2;

/// A block of decoded PCM audio plus its format.
///
/// Declared duration is always derived from the payload, so slicing and
/// concatenation cannot drift out of agreement with the sample data.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// PCM audio samples, interleaved by channel
    samples: Vec<f32>,

    /// Sample rate in Hz
    sample_rate: u32,

    /// Channel count (2 for the working format)
    channel_count: u16,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples.
    ///
    /// Trailing samples that do not fill a whole frame are dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channel_count: u16) -> Self {
        let channels = channel_count.max(1) as usize;
        let whole = (samples.len() / channels) * channels;
        samples.truncate(whole);

        Self {
            samples,
            sample_rate,
            channel_count: channel_count.max(1),
        }
    }

    /// Zero-amplitude buffer of the given duration in the working format
    pub fn silence(ms: u64) -> Self {
        Self::silence_with(ms, resampler::WORKING_SAMPLE_RATE, WORKING_CHANNELS)
    }

    /// Zero-amplitude buffer of the given duration and format
    pub fn silence_with(ms: u64, sample_rate: u32, channel_count: u16) -> Self {
        let frames = frames_for_ms(ms, sample_rate);
        Self::new(
            vec![0.0; frames * channel_count as usize],
            sample_rate,
            channel_count,
        )
    }

    /// Zero-amplitude buffer of the given duration matching this buffer's format
    pub fn silence_like(&self, ms: u64) -> Self {
        Self::silence_with(ms, self.sample_rate, self.channel_count)
    }

    /// Interleaved sample payload
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count
    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// Number of frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channel_count as usize
    }

    /// Duration in milliseconds (derived from the payload, rounded down)
    pub fn duration_ms(&self) -> u64 {
        self.frame_count() as u64 * 1000 / self.sample_rate as u64
    }

    /// True when the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Extract `[start_ms, end_ms)` as a new buffer.
    ///
    /// Negative offsets are measured from the end, so the last 500 ms of a
    /// buffer is `slice(-500, duration)`. The resolved window must lie inside
    /// `[0, duration]` and must not be inverted.
    pub fn slice(&self, start_ms: i64, end_ms: i64) -> Result<AudioBuffer> {
        let duration = self.duration_ms() as i64;
        let start = if start_ms < 0 { duration + start_ms } else { start_ms };
        let end = if end_ms < 0 { duration + end_ms } else { end_ms };

        if start < 0 || end < start || end > duration {
            return Err(Error::Range(format!(
                "slice window [{}, {}) outside buffer of {} ms",
                start_ms, end_ms, duration
            )));
        }

        let channels = self.channel_count as usize;
        let start_frame = frames_for_ms(start as u64, self.sample_rate).min(self.frame_count());
        let end_frame = frames_for_ms(end as u64, self.sample_rate).min(self.frame_count());

        Ok(AudioBuffer::new(
            self.samples[start_frame * channels..end_frame * channels].to_vec(),
            self.sample_rate,
            self.channel_count,
        ))
    }

    /// The last `ms` of the buffer (the whole buffer when shorter than `ms`)
    pub fn last_ms(&self, ms: u64) -> Result<AudioBuffer> {
        let tail = ms.min(self.duration_ms());
        self.slice(-(tail as i64), self.duration_ms() as i64)
    }

    /// This buffer followed by `other`.
    ///
    /// Formats must match exactly; the engine never resamples implicitly.
    pub fn concat(&self, other: &AudioBuffer) -> Result<AudioBuffer> {
        self.check_compatible(other, "concat")?;

        let mut samples = Vec::with_capacity(self.samples.len() + other.samples.len());
        samples.extend_from_slice(&self.samples);
        samples.extend_from_slice(&other.samples);

        Ok(AudioBuffer::new(
            samples,
            self.sample_rate,
            self.channel_count,
        ))
    }

    /// Mix `patch` into this buffer by sample-wise addition starting at
    /// `position_ms`, with `gain_db` applied to the patch.
    ///
    /// When the patch runs past the end the base is zero-padded to fit, so the
    /// result can be longer than the base. No clipping or normalization is
    /// performed; summed samples may exceed the nominal [-1.0, 1.0] range.
    pub fn overlay(
        &self,
        patch: &AudioBuffer,
        position_ms: u64,
        gain_db: f32,
    ) -> Result<AudioBuffer> {
        self.check_compatible(patch, "overlay")?;

        let channels = self.channel_count as usize;
        let start = frames_for_ms(position_ms, self.sample_rate) * channels;
        let needed = start + patch.samples.len();

        let mut samples = self.samples.clone();
        if needed > samples.len() {
            samples.resize(needed, 0.0);
        }

        let amplitude = db_to_amplitude(gain_db);
        for (i, &s) in patch.samples.iter().enumerate() {
            samples[start + i] += s * amplitude;
        }

        Ok(AudioBuffer::new(
            samples,
            self.sample_rate,
            self.channel_count,
        ))
    }

    /// Amplitude-scaled copy (`db` decibels, negative attenuates)
    pub fn gain(&self, db: f32) -> AudioBuffer {
        let amplitude = db_to_amplitude(db);
        let samples = self.samples.iter().map(|s| s * amplitude).collect();
        AudioBuffer::new(samples, self.sample_rate, self.channel_count)
    }

    /// Linear amplitude ramp from silence over the first `ms`.
    ///
    /// A ramp longer than the buffer spans the whole buffer.
    pub fn fade_in(&self, ms: u64) -> AudioBuffer {
        let mut samples = self.samples.clone();
        let channels = self.channel_count as usize;
        let fade_frames = frames_for_ms(ms, self.sample_rate).min(self.frame_count());

        for frame in 0..fade_frames {
            let g = frame as f32 / fade_frames as f32;
            for ch in 0..channels {
                samples[frame * channels + ch] *= g;
            }
        }

        AudioBuffer::new(samples, self.sample_rate, self.channel_count)
    }

    /// Linear amplitude ramp to silence over the last `ms`.
    pub fn fade_out(&self, ms: u64) -> AudioBuffer {
        let mut samples = self.samples.clone();
        let channels = self.channel_count as usize;
        let total = self.frame_count();
        let fade_frames = frames_for_ms(ms, self.sample_rate).min(total);
        let fade_start = total - fade_frames;

        for i in 0..fade_frames {
            let g = 1.0 - (i + 1) as f32 / fade_frames as f32;
            for ch in 0..channels {
                samples[(fade_start + i) * channels + ch] *= g;
            }
        }

        AudioBuffer::new(samples, self.sample_rate, self.channel_count)
    }

    /// Playback-rate warp: reinterpret the payload at `rate × factor`, then
    /// resample back to the original rate.
    ///
    /// Duration scales by `1/factor` and pitch shifts with it; the two are
    /// deliberately coupled (this is a tape-speed effect, not a time-stretch).
    pub fn resample_playback_rate(&self, factor: f64) -> Result<AudioBuffer> {
        if !(factor > 0.0) || !factor.is_finite() {
            return Err(Error::Range(format!(
                "playback rate factor must be positive, got {}",
                factor
            )));
        }
        if self.is_empty() || (factor - 1.0).abs() < f64::EPSILON {
            return Ok(self.clone());
        }

        let samples = resampler::resample_by_ratio(&self.samples, self.channel_count, 1.0 / factor)?;
        Ok(AudioBuffer::new(
            samples,
            self.sample_rate,
            self.channel_count,
        ))
    }

    fn check_compatible(&self, other: &AudioBuffer, op: &str) -> Result<()> {
        if self.sample_rate != other.sample_rate || self.channel_count != other.channel_count {
            return Err(Error::IncompatibleFormat(format!(
                "{}: {} Hz/{} ch vs {} Hz/{} ch",
                op, self.sample_rate, self.channel_count, other.sample_rate, other.channel_count
            )));
        }
        Ok(())
    }
}

/// Convert milliseconds to a frame count at the given rate (rounded down)
fn frames_for_ms(ms: u64, sample_rate: u32) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}

/// Convert decibels to a linear amplitude multiplier
fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

// ========================================
// Tests
// ========================================
