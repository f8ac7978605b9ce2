use std::io;
use thiserror::Error;

/// Error types for MD3 model parsing and processing
#[derive(Error, Debug)]
pub enum Md3Error {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Unsupported file version
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(i32),

    /// Error during parsing
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error during validation
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type using Md3Error
pub type Result<T> = std::result::Result<T, Md3Error>;
