//! Mix engine: segment selection, tail effects and timeline assembly

pub mod assembler;
pub mod effects;
pub mod selector;

pub use assembler::{Mix, MixSources, TimelineAssembler, TrackSource};
pub use effects::{EffectVariant, TailEffects};
pub use selector::{Segment, SegmentSelector};
