//! camhd - frame-level access to CamHD QuickTime recordings
//!
//! Locates the container's top-level blocks with small range requests,
//! fetches the `moov` index once and serves individual compressed frames
//! from local files or HTTP(S) servers that honour `Range` requests.

pub mod batch;
pub mod config;
pub mod error;
pub mod layout;
pub mod output;
pub mod reader;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};
pub use reader::FrameReader;
pub use source::{create_source, ByteRangeSource, FetchSignal, HttpSource, LocalFile, Source};

pub use camhd_media::{
    AviFrame, ByteSpan, DecodedFrame, Frame, FrameDecoder, FrameEntry, FrameIndex, IndexBlock,
    PixelFormat, TopLevelSizes,
};

/// Install a `tracing` subscriber for the camhd crates.
///
/// `RUST_LOG` wins when set. Does nothing if a subscriber is already installed.
pub fn init_tracing(verbose: bool) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "camhd=debug,camhd_media=debug".to_string()
        } else {
            "camhd=info,camhd_media=info".to_string()
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .try_init();
}
