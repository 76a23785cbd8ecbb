//! Error types for intromix
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for the intromix engine
#[derive(Error, Debug)]
pub enum Error {
    /// A slice/overlay window falls outside buffer bounds.
    ///
    /// Always a contract violation inside the engine; never recovered.
    #[error("Range error: {0}")]
    Range(String),

    /// Concatenation or overlay across mismatched sample rate or channel layout.
    ///
    /// Buffers must be normalized to the working format upstream; the engine
    /// rejects rather than auto-resampling.
    #[error("Incompatible format: {0}")]
    IncompatibleFormat(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Configuration validation or loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No source track could produce a viable segment within the retry budget
    #[error("Source library exhausted: {0}")]
    SourceExhausted(String),

    /// Audio export errors
    #[error("Export error: {0}")]
    Export(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using intromix Error
pub type Result<T> = std::result::Result<T, Error>;
