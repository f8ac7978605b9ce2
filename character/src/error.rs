use thiserror::Error;

use crate::character::Part;

/// Error types for character assembly and playback
#[derive(Error, Debug)]
pub enum CharacterError {
    /// Error from decoding an MD3 asset
    #[error("model error: {0}")]
    Model(#[from] md3::Md3Error),

    /// A part's mesh has no animation frames
    #[error("part {0:?} has no frames")]
    EmptyPart(Part),
}

/// Result type using CharacterError
pub type Result<T> = std::result::Result<T, CharacterError>;
