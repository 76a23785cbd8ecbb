//! Audio decoding using symphonia
//!
//! Decodes source files to PCM and normalizes them to the working format
//! (f32 interleaved stereo at 44.1 kHz) so that every buffer entering the mix
//! engine is directly mixable. Mono sources are duplicated to stereo;
//! multi-channel sources keep their first two channels.

use crate::audio::resampler::{self, WORKING_SAMPLE_RATE};
use crate::audio::types::{AudioBuffer, WORKING_CHANNELS};
use crate::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decode an audio file into a working-format `AudioBuffer`.
///
/// # Errors
///
/// `Error::Decode` when the file cannot be opened, probed, or decoded, or
/// when it contains no audio track. The assembler treats a failed decode as
/// "no segment" for that track and retries elsewhere.
pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
    debug!("Decoding {}", path.display());

    let file = std::fs::File::open(path)
        .map_err(|e| Error::Decode(format!("Failed to open {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("Failed to probe {}: {}", path.display(), e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode(format!("No audio track in {}", path.display())))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode(format!("Unknown sample rate in {}", path.display())))?;
    let channels = codec_params
        .channels
        .map(|c| c.count() as u16)
        .ok_or_else(|| Error::Decode(format!("Unknown channel layout in {}", path.display())))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("Error reading packet from {}: {}", path.display(), e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let capacity = decoded.capacity();
                let needs_realloc = sample_buf
                    .as_ref()
                    .map_or(true, |b| b.capacity() < capacity * spec.channels.count());
                if needs_realloc {
                    sample_buf = Some(SampleBuffer::new(capacity as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            Err(e) => {
                // Tolerate corrupt frames mid-stream; keep what decoded
                warn!("Decode error in {}: {}", path.display(), e);
                continue;
            }
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode(format!(
            "No samples decoded from {}",
            path.display()
        )));
    }

    let stereo = to_stereo(&samples, channels);
    let normalized = resampler::resample_to_working(&stereo, sample_rate, WORKING_CHANNELS)?;
    let buffer = AudioBuffer::new(normalized, WORKING_SAMPLE_RATE, WORKING_CHANNELS);

    debug!(
        "Decoded {}: {} ms (source {} Hz, {} ch)",
        path.display(),
        buffer.duration_ms(),
        sample_rate,
        channels
    );

    Ok(buffer)
}

/// Convert interleaved samples of any channel count to stereo.
///
/// Mono is duplicated; layouts above stereo keep channels 0 and 1.
fn to_stereo(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 | 1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        2 => samples.to_vec(),
        n => samples
            .chunks_exact(n as usize)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_stereo_duplicates_mono() {
        let mono = vec![0.1, 0.2, 0.3];
        assert_eq!(to_stereo(&mono, 1), vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn test_to_stereo_passthrough() {
        let stereo = vec![0.1, -0.1, 0.2, -0.2];
        assert_eq!(to_stereo(&stereo, 2), stereo);
    }

    #[test]
    fn test_to_stereo_downmixes_surround() {
        // 4-channel frames keep the front pair
        let quad = vec![0.1, -0.1, 9.0, 9.0, 0.2, -0.2, 9.0, 9.0];
        assert_eq!(to_stereo(&quad, 4), vec![0.1, -0.1, 0.2, -0.2]);
    }

    #[test]
    fn test_decode_missing_file() {
        let result = decode_file(Path::new("/nonexistent/file.mp3"));
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
