//! # Intromix
//!
//! Assembles a long-form audio mix from a library of short MP3 clips:
//! randomized sub-segments of source tracks are crossfaded into one
//! continuous timeline, with optional pre-recorded transition stingers and a
//! procedural tail effect applied to each clip before it is stitched in.
//!
//! **Architecture:** symphonia decode -> normalized `AudioBuffer` values ->
//! segment selection -> tail effects -> crossfade assembly. Buffers are
//! immutable; every transform returns a new value, so independent assembler
//! runs can proceed in parallel without any locking.
//!
//! All randomness flows through an injected `rand::Rng`, so seeded runs are
//! fully reproducible.

pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod human_time;
pub mod mix;

pub use audio::AudioBuffer;
pub use config::MixConfig;
pub use error::{Error, Result};
pub use mix::{Mix, MixSources, TimelineAssembler};
