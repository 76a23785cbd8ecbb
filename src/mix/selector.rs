//! Clip segment selection
//!
//! Extracts a randomized, bounded sub-segment from a decoded source track and
//! softens both edges so it is ready to crossfade into the timeline.

use crate::audio::AudioBuffer;
use crate::config::MixConfig;
use crate::Result;
use rand::Rng;
use tracing::debug;

/// Where a clip was cut from its source track.
///
/// Transient metadata for logging and tests; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Offset into the source track
    pub start_ms: u64,

    /// Requested segment length
    pub duration_ms: u64,
}

/// Randomized segment extractor with fixed duration bounds
#[derive(Debug, Clone)]
pub struct SegmentSelector {
    min_segment_ms: u64,
    max_segment_ms: u64,
    edge_fade_ms: u64,
}

impl SegmentSelector {
    pub fn new(config: &MixConfig) -> Self {
        Self {
            min_segment_ms: config.min_segment_ms,
            max_segment_ms: config.max_segment_ms,
            edge_fade_ms: config.edge_fade_ms,
        }
    }

    /// Extract a random segment from `source`.
    ///
    /// Returns `Ok(None)` when the source is too short to yield a segment of
    /// at least the minimum length; the caller should try another track.
    /// A returned clip is never shorter than the minimum and has both edges
    /// pre-faded.
    pub fn select(
        &self,
        source: &AudioBuffer,
        rng: &mut impl Rng,
    ) -> Result<Option<(Segment, AudioBuffer)>> {
        let source_ms = source.duration_ms();
        if source_ms <= self.min_segment_ms {
            debug!(
                "Source of {} ms at or below minimum segment length {} ms",
                source_ms, self.min_segment_ms
            );
            return Ok(None);
        }

        let segment_ms = rng.gen_range(self.min_segment_ms..=self.max_segment_ms.min(source_ms));
        let start_ms = rng.gen_range(0..=source_ms - segment_ms);

        let clip = source
            .slice(start_ms as i64, (start_ms + segment_ms) as i64)?
            .fade_in(self.edge_fade_ms)
            .fade_out(self.edge_fade_ms);

        let segment = Segment {
            start_ms,
            duration_ms: segment_ms,
        };
        debug!(
            "Selected {} ms segment at {} ms of a {} ms source",
            segment_ms, start_ms, source_ms
        );

        Ok(Some((segment, clip)))
    }
}
