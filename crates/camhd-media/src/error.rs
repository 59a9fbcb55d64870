//! Error types for camhd-media.

use thiserror::Error;

/// Result type for camhd-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for camhd-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The leading `ftyp` block does not have the one size this format
    /// variant produces.
    #[error("Unexpected format: type block size is {found}, expected {expected}")]
    UnexpectedFormat { found: u64, expected: u64 },

    /// A required index table is missing or its counts overrun the buffer.
    #[error("Malformed index: {0}")]
    MalformedIndex(String),

    /// Frame number outside `[0, count)`.
    #[error("Frame index out of range: {index} (frame count: {count})")]
    IndexOutOfRange { index: u32, count: u32 },

    /// Frame too large for the 32-bit AVI size fields.
    #[error("Frame of {size} bytes does not fit in a single-frame AVI")]
    FrameTooLarge { size: usize },

    /// Buffer too small to decode a fixed-size field.
    #[error("Buffer underflow: need {need} bytes, have {have}")]
    BufferUnderflow { need: usize, have: usize },
}

impl Error {
    /// Create a malformed index error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedIndex(msg.into())
    }
}
