//! Error types for the spectral-shift crate.

use thiserror::Error;

/// Errors that can occur while checking the environment or processing a clip.
///
/// The first two variants are startup failures and halt the front end; the
/// rest are caught at the pipeline boundary and shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftError {
    /// A required external binary is missing or cannot be run.
    #[error("environment error: {0}")]
    Environment(String),
    /// The external toolchain runs but cannot do what the pipeline needs.
    #[error("unsupported runtime: {0}")]
    UnsupportedRuntime(String),
    /// The uploaded bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// Failure while shifting, rescaling or encoding.
    #[error("processing error: {0}")]
    Processing(String),
    /// Semitone offset outside the supported range.
    #[error("semitone offset {0} is outside -24..=24")]
    InvalidSemitones(i32),
    /// Invalid configuration value or unreadable config file contents.
    #[error("configuration error: {0}")]
    Config(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ShiftError {
    /// Returns true for errors that must stop the front end before it serves
    /// any request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShiftError::Environment(_) | ShiftError::UnsupportedRuntime(_)
        )
    }

    /// Short notice suitable for showing to the person who uploaded the clip.
    pub fn user_message(&self) -> String {
        match self {
            ShiftError::Environment(msg) => format!("Audio toolchain check failed: {msg}"),
            ShiftError::UnsupportedRuntime(msg) => format!("Unsupported environment: {msg}"),
            ShiftError::Decode(msg) => format!("Could not read the uploaded audio: {msg}"),
            ShiftError::InvalidSemitones(n) => {
                format!("Pitch adjustment must be between -24 and +24 semitones, got {n}")
            }
            ShiftError::Config(msg) => format!("Configuration Error: {msg}"),
            ShiftError::Processing(msg) | ShiftError::Io(msg) => {
                format!("Processing Error: {msg}")
            }
        }
    }
}

impl From<std::io::Error> for ShiftError {
    fn from(err: std::io::Error) -> Self {
        ShiftError::Io(err.to_string())
    }
}

impl From<symphonia::core::errors::Error> for ShiftError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        ShiftError::Decode(err.to_string())
    }
}
