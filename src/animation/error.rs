//! Errors for one APNG generation request.

use super::codec::CodecError;
use crate::schema::ConfigError;

/// Failure of an assembly or patch step. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    #[error("No frames to assemble")]
    NoFrames,
    #[error("Frame {index} is {}x{}, expected {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    DimensionMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("Invalid animation config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("APNG encoding failed: {0}")]
    Encoding(#[from] CodecError),
    #[error("Malformed APNG container: {0}")]
    MalformedContainer(String),
}
