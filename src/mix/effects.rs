//! Tail effect engine
//!
//! Carves the trailing 1.0-1.4 s off a prepared clip, runs it through one
//! randomly chosen procedural transform (tape stop, echo, reverb, rhythmic
//! repeat, micro cut), applies a mandatory closing fade, and splices it back.
//! Clips too short to safely carve a tail get a plain 500 ms fade instead.
//!
//! The engine is stateless: variant choice and every randomized parameter are
//! drawn fresh from the injected rng on each call.

use crate::audio::AudioBuffer;
use crate::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

/// Clips shorter than this skip the effect and only get a soft fade
const SHORT_CLIP_MS: u64 = 4_000;

/// Fade applied to clips on the short-clip path
const SHORT_CLIP_FADE_MS: u64 = 500;

/// Tail length bounds (chosen uniformly per clip)
const TAIL_MIN_MS: u64 = 1_000;
const TAIL_MAX_MS: u64 = 1_400;

/// Mandatory closing fade applied to every transformed tail
const CLOSING_FADE_MS: u64 = 700;

/// One procedural tail transform.
///
/// A closed set: the active subset is policy (see [`TailEffects`]), the
/// transforms themselves are fixed. `ReverseHit` and `Bypass` ship
/// implemented but outside the default pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectVariant {
    /// Progressive slow-down over three thirds of the tail, like a turntable
    /// spinning down
    TapeStop,

    /// Two cascading echoes at +180 ms / -6 dB and +360 ms / -12 dB
    EchoTail,

    /// Decaying reflections at 120/240/360 ms, -6/-10/-14 dB
    ReverbTail,

    /// The last 200-500 ms looped three times, discarding the rest
    RepeatTail,

    /// An 80-100 ms cut, 40 ms of silence, then the cut again
    MicroCut,

    /// Three progressively slower, quieter renditions of the whole tail
    /// (not in the default pool)
    ReverseHit,

    /// Leave the tail untouched (not in the default pool)
    Bypass,
}

impl EffectVariant {
    /// The variants enabled for random selection by default
    pub fn default_pool() -> Vec<EffectVariant> {
        vec![
            EffectVariant::TapeStop,
            EffectVariant::EchoTail,
            EffectVariant::ReverbTail,
            EffectVariant::RepeatTail,
            EffectVariant::MicroCut,
        ]
    }

    /// Transform a tail buffer.
    ///
    /// Pure aside from rng consumption; the closing fade is the caller's
    /// responsibility so that every variant gets it uniformly.
    pub fn apply(&self, tail: &AudioBuffer, rng: &mut impl Rng) -> Result<AudioBuffer> {
        match self {
            EffectVariant::TapeStop => tape_stop(tail),
            EffectVariant::EchoTail => echo_tail(tail),
            EffectVariant::ReverbTail => reverb_tail(tail),
            EffectVariant::RepeatTail => repeat_tail(tail, rng),
            EffectVariant::MicroCut => micro_cut(tail, rng),
            EffectVariant::ReverseHit => reverse_hit(tail),
            EffectVariant::Bypass => Ok(tail.clone()),
        }
    }
}

/// Randomized tail effect dispatcher with a configurable active pool
#[derive(Debug, Clone)]
pub struct TailEffects {
    enabled: Vec<EffectVariant>,
}

impl Default for TailEffects {
    fn default() -> Self {
        Self::new(EffectVariant::default_pool())
    }
}

impl TailEffects {
    /// Engine restricted to the given variants.
    ///
    /// An empty pool degenerates to `Bypass` (tails pass through with only
    /// the closing fade).
    pub fn new(enabled: Vec<EffectVariant>) -> Self {
        Self { enabled }
    }

    /// Apply a random tail effect and the mandatory closing fade to a clip.
    ///
    /// Clips under 4 s are returned with only a 500 ms fade-out; anything
    /// longer has its final 1.0-1.4 s transformed and re-attached.
    pub fn process(&self, clip: &AudioBuffer, rng: &mut impl Rng) -> Result<AudioBuffer> {
        if clip.duration_ms() < SHORT_CLIP_MS {
            debug!(
                "Clip of {} ms too short for a tail effect, fading out",
                clip.duration_ms()
            );
            return Ok(clip.fade_out(SHORT_CLIP_FADE_MS));
        }

        let tail_ms = rng.gen_range(TAIL_MIN_MS..=TAIL_MAX_MS);
        let duration = clip.duration_ms() as i64;
        let body = clip.slice(0, duration - tail_ms as i64)?;
        let tail = clip.slice(duration - tail_ms as i64, duration)?;

        let variant = self
            .enabled
            .choose(rng)
            .copied()
            .unwrap_or(EffectVariant::Bypass);
        debug!("Applying {:?} to {} ms tail", variant, tail.duration_ms());

        let tail = variant.apply(&tail, rng)?.fade_out(CLOSING_FADE_MS);
        body.concat(&tail)
    }
}

/// Cap the effect span at 1.5 s, slow three equal thirds by 0.90/0.85/0.80,
/// keep any remainder, then soften the new ending.
fn tape_stop(tail: &AudioBuffer) -> Result<AudioBuffer> {
    let span = tail.duration_ms().min(1_500) as i64;
    let third = span / 3;

    let part1 = tail.slice(0, third)?.resample_playback_rate(0.90)?;
    let part2 = tail.slice(third, 2 * third)?.resample_playback_rate(0.85)?;
    let part3 = tail.slice(2 * third, span)?.resample_playback_rate(0.80)?;
    let rest = tail.slice(span, tail.duration_ms() as i64)?;

    let out = part1.concat(&part2)?.concat(&part3)?.concat(&rest)?;
    Ok(out.fade_out(300))
}

/// Two cascading self-echoes; the second echoes the already-echoed tail
fn echo_tail(tail: &AudioBuffer) -> Result<AudioBuffer> {
    let once = tail.overlay(tail, 180, -6.0)?;
    once.overlay(&once, 360, -12.0)
}

/// Decaying reflections, each overlaying the accumulated result on itself
fn reverb_tail(tail: &AudioBuffer) -> Result<AudioBuffer> {
    let mut out = tail.clone();
    for (offset_ms, gain_db) in [(120, -6.0), (240, -10.0), (360, -14.0)] {
        let patch = out.clone();
        out = out.overlay(&patch, offset_ms, gain_db)?;
    }
    Ok(out)
}

/// Loop the last 200/300/500 ms three times, discarding the rest of the tail
fn repeat_tail(tail: &AudioBuffer, rng: &mut impl Rng) -> Result<AudioBuffer> {
    let slice_ms = *[200u64, 300, 500].choose(rng).unwrap_or(&300);
    let chunk = tail.last_ms(slice_ms)?;
    chunk.concat(&chunk)?.concat(&chunk)
}

/// A stuttered cut: last 80/100 ms, 40 ms of silence, the cut again
fn micro_cut(tail: &AudioBuffer, rng: &mut impl Rng) -> Result<AudioBuffer> {
    let slice_ms = *[80u64, 100].choose(rng).unwrap_or(&80);
    let cut = tail.last_ms(slice_ms)?;
    cut.concat(&cut.silence_like(40))?.concat(&cut)
}

/// Three progressively slower and quieter renditions of the whole tail, each
/// truncated to a third of the original tail length
fn reverse_hit(tail: &AudioBuffer) -> Result<AudioBuffer> {
    let third = tail.duration_ms() as i64 / 3;
    let mut out: Option<AudioBuffer> = None;

    for (speed, gain_db) in [(0.85, -2.0), (0.70, -6.0), (0.55, -12.0)] {
        let fragment = tail
            .resample_playback_rate(speed)?
            .gain(gain_db)
            .slice(0, third)?;
        out = Some(match out {
            Some(acc) => acc.concat(&fragment)?,
            None => fragment,
        });
    }

    // Tail is at least 1 s, so the loop above always ran
    let out = out.unwrap_or_else(|| tail.clone());
    Ok(out.fade_out(600))
}

// ========================================
// Tests
// ========================================
