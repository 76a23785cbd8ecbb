//! WAV export using hound
//!
//! The mix engine hands back a single `AudioBuffer`; this writes it out as
//! 16-bit PCM WAV. Samples are clamped to [-1.0, 1.0] at the boundary since
//! overlay mixing is allowed to run hot internally.

use crate::audio::AudioBuffer;
use crate::{Error, Result};
use std::path::Path;
use tracing::info;

/// Write a buffer to a 16-bit PCM WAV file
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channel_count(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| Error::Export(format!("Failed to create {}: {}", path.display(), e)))?;

    for &sample in buffer.samples() {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = (clamped * i16::MAX as f32) as i16;
        writer
            .write_sample(value)
            .map_err(|e| Error::Export(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| Error::Export(format!("Failed to finalize {}: {}", path.display(), e)))?;

    info!(
        "Wrote {} ms of audio to {}",
        buffer.duration_ms(),
        path.display()
    );
    Ok(())
}
