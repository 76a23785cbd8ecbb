//! Audio buffer primitives, decoding and resampling

pub mod decoder;
pub mod resampler;
pub mod types;

pub use decoder::decode_file;
pub use resampler::WORKING_SAMPLE_RATE;
pub use types::AudioBuffer;
