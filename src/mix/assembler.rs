//! Crossfade timeline assembler
//!
//! Drives the overall mix loop: pulls randomized segments from the source
//! library, runs them through the tail effect engine, and folds them into one
//! growing timeline with overlapping crossfades and optional stinger
//! overlays, stopping once the target duration is reached.
//!
//! Elapsed time is tracked under the crossfade-overlap convention: each
//! crossfaded clip contributes its length minus the overlap, so `elapsed_ms`
//! reflects the intended mix length even though intro and stinger content can
//! make the raw buffer longer.

use crate::audio::{decoder, AudioBuffer};
use crate::config::MixConfig;
use crate::mix::effects::TailEffects;
use crate::mix::selector::SegmentSelector;
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::PathBuf;
use tracing::{info, warn};

/// One source track, decoded lazily on first selection.
///
/// A track that fails to decode is remembered as broken so repeated picks
/// fail fast instead of re-reading the file.
#[derive(Debug, Clone)]
pub enum TrackSource {
    /// Not yet decoded
    Pending(PathBuf),

    /// Decoded and normalized to the working format
    Ready(AudioBuffer),

    /// Decoding failed earlier
    Broken(PathBuf),
}

impl TrackSource {
    /// Decode if needed and return the track buffer
    fn load(&mut self) -> Result<&AudioBuffer> {
        if let TrackSource::Pending(path) = self {
            let path = path.clone();
            match decoder::decode_file(&path) {
                Ok(buffer) => *self = TrackSource::Ready(buffer),
                Err(e) => {
                    *self = TrackSource::Broken(path);
                    return Err(e);
                }
            }
        }

        match self {
            TrackSource::Ready(buffer) => Ok(buffer),
            TrackSource::Broken(path) => Err(Error::Decode(format!(
                "Track {} previously failed to decode",
                path.display()
            ))),
            TrackSource::Pending(_) => unreachable!("pending track handled above"),
        }
    }
}

/// Input collections for one mix: source tracks, optional transition
/// stingers, optional intro. The assembler performs no filesystem discovery;
/// callers supply paths or decoded buffers.
#[derive(Debug, Clone, Default)]
pub struct MixSources {
    pub tracks: Vec<TrackSource>,
    pub stingers: Vec<AudioBuffer>,
    pub intro: Option<AudioBuffer>,
}

impl MixSources {
    /// Sources from file paths, decoded lazily as tracks get picked
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            tracks: paths.into_iter().map(TrackSource::Pending).collect(),
            ..Self::default()
        }
    }

    /// Sources from already-decoded buffers (used by tests and embedders)
    pub fn from_buffers(buffers: Vec<AudioBuffer>) -> Self {
        Self {
            tracks: buffers.into_iter().map(TrackSource::Ready).collect(),
            ..Self::default()
        }
    }

    pub fn with_stingers(mut self, stingers: Vec<AudioBuffer>) -> Self {
        self.stingers = stingers;
        self
    }

    pub fn with_intro(mut self, intro: AudioBuffer) -> Self {
        self.intro = Some(intro);
        self
    }
}

/// A finished mix plus its bookkeeping
#[derive(Debug, Clone)]
pub struct Mix {
    /// The assembled waveform
    pub timeline: AudioBuffer,

    /// Mix length under the crossfade-overlap convention; at least the
    /// configured target
    pub elapsed_ms: u64,

    /// Number of clips appended (intro not counted)
    pub clip_count: usize,
}

/// Folds randomly selected clips into one continuous crossfaded timeline
#[derive(Debug, Clone)]
pub struct TimelineAssembler {
    config: MixConfig,
    selector: SegmentSelector,
    effects: TailEffects,
}

impl TimelineAssembler {
    /// Create an assembler for a validated configuration
    pub fn new(config: MixConfig) -> Result<Self> {
        config.validate()?;
        let selector = SegmentSelector::new(&config);
        let effects = TailEffects::new(config.enabled_effects.clone());
        Ok(Self {
            config,
            selector,
            effects,
        })
    }

    /// Build one mix.
    ///
    /// Loops until the elapsed duration reaches the target. Tracks that fail
    /// to decode or sit at or below `min_viable_clip_ms` are culled from the
    /// pool; other failed picks count against a consecutive-failure budget.
    /// An empty pool or an exhausted budget returns `SourceExhausted` instead
    /// of looping forever (the classic recipe retried unboundedly).
    ///
    /// The final clip is appended in full, so the result can run past the
    /// target; it is never truncated. On any error the partial mix is
    /// discarded.
    pub fn assemble(&self, sources: &mut MixSources, rng: &mut impl Rng) -> Result<Mix> {
        if sources.tracks.is_empty() {
            return Err(Error::SourceExhausted(
                "No source tracks supplied".to_string(),
            ));
        }

        let mut timeline = AudioBuffer::silence(0);
        let mut elapsed_ms: u64 = 0;
        let mut clip_count = 0usize;
        let mut is_first_segment = true;
        let mut failed_attempts = 0u32;
        let mut viable = vec![true; sources.tracks.len()];

        if let Some(intro) = &sources.intro {
            timeline = timeline.concat(intro)?;
            elapsed_ms += intro.duration_ms();
            info!("Added intro ({} ms)", intro.duration_ms());
        }

        while elapsed_ms < self.config.target_ms {
            let index = rng.gen_range(0..sources.tracks.len());

            let source = match sources.tracks[index].load() {
                Ok(buffer) => buffer,
                Err(e) => {
                    warn!("Skipping track: {}", e);
                    viable[index] = false;
                    self.note_failure(&viable, &mut failed_attempts)?;
                    continue;
                }
            };

            if source.duration_ms() <= self.config.min_viable_clip_ms {
                // Below the viability floor: this track can never yield a
                // segment, so stop re-picking it.
                viable[index] = false;
                self.note_failure(&viable, &mut failed_attempts)?;
                continue;
            }

            let Some((segment, clip)) = self.selector.select(source, rng)? else {
                self.note_failure(&viable, &mut failed_attempts)?;
                continue;
            };

            let clip = if self.config.tail_effects {
                self.effects.process(&clip, rng)?
            } else {
                clip
            };
            let clip_ms = clip.duration_ms();

            if is_first_segment {
                timeline = timeline.concat(&clip)?;
                elapsed_ms += clip_ms;
                is_first_segment = false;
                info!(
                    "Added first clip ({} ms, from {} ms into its source)",
                    clip_ms, segment.start_ms
                );
            } else {
                // A tail effect can leave the clip no longer than the
                // crossfade overlap; such a clip adds no elapsed time and
                // is dropped.
                let advance_ms = clip_ms.saturating_sub(self.config.crossfade_ms);
                if advance_ms == 0 {
                    warn!(
                        "Dropping {} ms clip, no longer than the {} ms crossfade",
                        clip_ms, self.config.crossfade_ms
                    );
                    self.note_failure(&viable, &mut failed_attempts)?;
                    continue;
                }

                let position_ms = timeline
                    .duration_ms()
                    .saturating_sub(self.config.crossfade_ms);
                timeline = timeline.overlay(&clip, position_ms, 0.0)?;

                if let Some(stinger) = sources.stingers.choose(rng) {
                    // Pre-mastered transition color: full gain, no fade shaping
                    timeline = timeline.overlay(stinger, position_ms, 0.0)?;
                    info!("Overlaid stinger at {} ms", position_ms);
                }

                elapsed_ms += advance_ms;
                info!(
                    "Added clip ({} ms, {} ms crossfade) -> {} / {} ms",
                    clip_ms, self.config.crossfade_ms, elapsed_ms, self.config.target_ms
                );
            }
            failed_attempts = 0;
            clip_count += 1;
        }

        info!(
            "Mix complete: {} clips, {} ms elapsed, {} ms of audio",
            clip_count,
            elapsed_ms,
            timeline.duration_ms()
        );

        Ok(Mix {
            timeline,
            elapsed_ms,
            clip_count,
        })
    }

    /// Record one failed attempt; errors out when the whole library is
    /// unusable or the consecutive-failure budget runs out
    fn note_failure(&self, viable: &[bool], failed_attempts: &mut u32) -> Result<()> {
        if !viable.iter().any(|&v| v) {
            return Err(Error::SourceExhausted(format!(
                "Every track is unreadable or at most {} ms long",
                self.config.min_viable_clip_ms
            )));
        }
        *failed_attempts += 1;
        if *failed_attempts >= self.config.max_segment_attempts {
            return Err(Error::SourceExhausted(format!(
                "No segment of at least {} ms landed after {} attempts",
                self.config.min_segment_ms, failed_attempts
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::WORKING_SAMPLE_RATE;
    use crate::mix::effects::EffectVariant;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn constant_buffer(ms: u64, value: f32) -> AudioBuffer {
        let frames = (ms * WORKING_SAMPLE_RATE as u64 / 1000) as usize;
        AudioBuffer::new(vec![value; frames * 2], WORKING_SAMPLE_RATE, 2)
    }

    fn quiet_config(target_ms: u64) -> MixConfig {
        MixConfig {
            target_ms,
            tail_effects: false,
            ..MixConfig::default()
        }
    }

    #[test]
    fn test_no_tracks_fails_fast() {
        let assembler = TimelineAssembler::new(quiet_config(10_000)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let result = assembler.assemble(&mut MixSources::default(), &mut rng);
        assert!(matches!(result, Err(Error::SourceExhausted(_))));
    }

    #[test]
    fn test_all_tracks_below_viability_floor_fail_fast() {
        // A generous attempt budget must not be burned pick by pick: once
        // every track has been seen to be under the floor the loop stops.
        let config = MixConfig {
            max_segment_attempts: 1_000,
            ..quiet_config(10_000)
        };
        let assembler = TimelineAssembler::new(config).unwrap();
        let mut sources =
            MixSources::from_buffers(vec![constant_buffer(3_000, 0.5), constant_buffer(2_000, 0.5)]);
        let mut rng = StdRng::seed_from_u64(1);
        match assembler.assemble(&mut sources, &mut rng) {
            Err(Error::SourceExhausted(msg)) => assert!(msg.contains("at most 5000 ms")),
            other => panic!("expected SourceExhausted, got {:?}", other.map(|m| m.elapsed_ms)),
        }
    }

    #[test]
    fn test_track_between_floor_and_minimum_exhausts_budget() {
        // 4 s track clears the 3 s viability floor but never satisfies the
        // 5 s segment minimum, so the attempt budget runs out.
        let config = MixConfig {
            min_viable_clip_ms: 3_000,
            ..quiet_config(10_000)
        };
        let assembler = TimelineAssembler::new(config).unwrap();
        let mut sources = MixSources::from_buffers(vec![constant_buffer(4_000, 0.5)]);
        let mut rng = StdRng::seed_from_u64(1);
        match assembler.assemble(&mut sources, &mut rng) {
            Err(Error::SourceExhausted(msg)) => assert!(msg.contains("32 attempts")),
            other => panic!("expected SourceExhausted, got {:?}", other.map(|m| m.elapsed_ms)),
        }
    }

    #[test]
    fn test_effect_shrunk_clip_never_underflows_elapsed() {
        // MicroCut replaces the 1000-1400 ms tail with roughly 200 ms, so
        // with a 4.5 s crossfade every 5 s clip comes back shorter than the
        // overlap. The loop must report exhaustion, not wrap elapsed_ms.
        let config = MixConfig {
            target_ms: 8_000,
            crossfade_ms: 4_500,
            min_segment_ms: 5_000,
            max_segment_ms: 5_000,
            enabled_effects: vec![EffectVariant::MicroCut],
            ..MixConfig::default()
        };
        let assembler = TimelineAssembler::new(config).unwrap();
        let mut sources = MixSources::from_buffers(vec![constant_buffer(8_000, 0.5)]);
        let mut rng = StdRng::seed_from_u64(17);
        let result = assembler.assemble(&mut sources, &mut rng);
        assert!(matches!(result, Err(Error::SourceExhausted(_))));
    }

    #[test]
    fn test_elapsed_accounting_with_pinned_segments() {
        // Pin segment length so every clip is exactly 6500 ms
        let config = MixConfig {
            min_segment_ms: 6_500,
            max_segment_ms: 6_500,
            ..quiet_config(12_000)
        };
        let assembler = TimelineAssembler::new(config).unwrap();
        let mut sources = MixSources::from_buffers(vec![constant_buffer(8_000, 0.5)]);
        let mut rng = StdRng::seed_from_u64(5);

        let mix = assembler.assemble(&mut sources, &mut rng).unwrap();
        // First clip: 6500; second: 6500 - 1000 crossfade = 5500 -> 12000
        assert_eq!(mix.clip_count, 2);
        assert_eq!(mix.elapsed_ms, 12_000);
        assert_eq!(mix.timeline.duration_ms(), 12_000);
    }

    #[test]
    fn test_intro_counts_toward_elapsed_and_is_not_crossfaded() {
        let config = MixConfig {
            min_segment_ms: 6_000,
            max_segment_ms: 6_000,
            ..quiet_config(10_000)
        };
        let assembler = TimelineAssembler::new(config).unwrap();
        let mut sources = MixSources::from_buffers(vec![constant_buffer(8_000, 0.5)])
            .with_intro(constant_buffer(4_000, 0.25));
        let mut rng = StdRng::seed_from_u64(5);

        let mix = assembler.assemble(&mut sources, &mut rng).unwrap();
        // Intro 4000 + first clip 6000 = 10000, loop stops after one clip
        assert_eq!(mix.clip_count, 1);
        assert_eq!(mix.elapsed_ms, 10_000);
        assert_eq!(mix.timeline.duration_ms(), 10_000);
        // Intro region untouched by clip content
        let head = mix.timeline.slice(0, 3_000).unwrap();
        for &s in head.samples() {
            assert!((s - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = MixConfig {
            crossfade_ms: 0,
            ..MixConfig::default()
        };
        assert!(TimelineAssembler::new(config).is_err());
    }
}
