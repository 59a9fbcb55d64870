//! Error types for camhd.

use camhd_media::ByteSpan;
use std::io;
use thiserror::Error;

/// Result type for camhd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for camhd operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Container or index error from the parsing layer.
    #[error(transparent)]
    Media(#[from] camhd_media::Error),

    /// The transport failed or returned a different number of bytes than
    /// requested. Never retried here.
    #[error("Range {span} of {location} unavailable: {reason}")]
    RangeUnavailable {
        location: String,
        span: ByteSpan,
        reason: String,
    },

    /// The caller's cancellation flag was raised before the fetch completed.
    #[error("Fetch of range {span} from {location} cancelled")]
    Cancelled { location: String, span: ByteSpan },

    /// A source string is neither a usable path nor an http(s) URL.
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// A setting is unusable, e.g. a zero chunk run.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The batch worker pool could not be started.
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// I/O error outside a range fetch (e.g. writing output files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a range unavailable error.
    pub fn range_unavailable(
        location: impl Into<String>,
        span: ByteSpan,
        reason: impl Into<String>,
    ) -> Self {
        Self::RangeUnavailable {
            location: location.into(),
            span,
            reason: reason.into(),
        }
    }

    /// Create an invalid source error.
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    /// Whether this is a caller-side frame number error.
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::Media(camhd_media::Error::IndexOutOfRange { .. })
        )
    }
}
