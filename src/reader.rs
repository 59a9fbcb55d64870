//! Frame location and retrieval for one recording.

use bytes::Bytes;
use camhd_media::{AviFrame, ByteSpan, Frame, FrameIndex, IndexBlock, TopLevelSizes};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::config::{Config, IndexConfig};
use crate::layout::{fetch_index_block, read_layout};
use crate::output;
use crate::source::{create_source, ByteRangeSource, FetchSignal, Source};
use crate::{Error, Result};

/// Frame-level access to one recording.
///
/// Holds the fetched `moov` block; every lookup after opening is pure apart
/// from the frame fetch itself. Share it across threads by reference or `Arc`.
pub struct FrameReader {
    source: Arc<dyn ByteRangeSource>,
    layout: Option<TopLevelSizes>,
    index: IndexBlock,
    samples_per_chunk: u32,
    frames: OnceLock<FrameIndex>,
}

impl FrameReader {
    /// Read the layout and fetch the index block.
    pub fn open(source: Arc<dyn ByteRangeSource>, config: &IndexConfig) -> Result<Self> {
        Self::open_with_index(source, None, config)
    }

    /// Create the source for `location` from `config` and open it.
    pub fn open_location(location: &Source, config: &Config) -> Result<Self> {
        let source = create_source(location, &config.http)?;
        Self::open(source, &config.index)
    }

    /// Like [`open`](Self::open), reusing an index block fetched earlier for
    /// the same recording when one is given.
    ///
    /// With a supplied index no layout is read, so frames are not checked
    /// against the data block bounds.
    pub fn open_with_index(
        source: Arc<dyn ByteRangeSource>,
        index: Option<IndexBlock>,
        config: &IndexConfig,
    ) -> Result<Self> {
        if config.samples_per_chunk == 0 {
            return Err(Error::Config(
                "index.samples_per_chunk must be at least 1".to_string(),
            ));
        }

        let (layout, index) = match index {
            Some(index) => (None, index),
            None => {
                let layout = read_layout(source.as_ref())?;
                let index = fetch_index_block(source.as_ref(), &layout)?;
                (Some(layout), index)
            }
        };

        Ok(Self {
            source,
            layout,
            index,
            samples_per_chunk: config.samples_per_chunk,
            frames: OnceLock::new(),
        })
    }

    pub fn source(&self) -> &Source {
        self.source.location()
    }

    /// Top-level sizes, if they were read when opening.
    pub fn layout(&self) -> Option<&TopLevelSizes> {
        self.layout.as_ref()
    }

    /// The fetched index block, for reuse with `open_with_index`.
    pub fn index_block(&self) -> &IndexBlock {
        &self.index
    }

    /// Number of frames, straight from `stsz`.
    pub fn frame_count(&self) -> Result<u32> {
        Ok(self.index.sample_count()?)
    }

    /// The frame index, built on first use.
    pub fn frame_index(&self) -> Result<&FrameIndex> {
        if let Some(frames) = self.frames.get() {
            return Ok(frames);
        }

        let frames = self.index.frame_index(self.samples_per_chunk)?;
        if let Some(layout) = &self.layout {
            frames.check_within(layout.data_span()?)?;
        }
        Ok(self.frames.get_or_init(|| frames))
    }

    /// Per-frame sizes.
    pub fn frame_sizes(&self) -> Result<Vec<u32>> {
        Ok(self.index.sample_sizes()?)
    }

    /// Per-frame file offsets.
    pub fn frame_offsets(&self) -> Result<Vec<u64>> {
        Ok(self.frame_index()?.iter().map(|e| e.offset).collect())
    }

    /// Inclusive byte range of frame `index` (0-based).
    pub fn frame_range(&self, index: u32) -> Result<ByteSpan> {
        let count = self.frame_count()?;
        if index >= count {
            return Err(camhd_media::Error::IndexOutOfRange { index, count }.into());
        }
        Ok(self.frame_index()?.range(index)?)
    }

    /// Fetch the compressed bytes of frame `index`.
    pub fn fetch_frame(&self, index: u32) -> Result<Frame> {
        self.fetch_frame_with(index, &FetchSignal::default())
    }

    /// Fetch frame `index` with a per-call timeout or cancel flag.
    pub fn fetch_frame_with(&self, index: u32, signal: &FetchSignal) -> Result<Frame> {
        let span = self.frame_range(index)?;
        let data = self.source.fetch_with(span, signal)?;
        Ok(Frame::new(index, data))
    }

    /// Fetch frame `index` wrapped in a single-frame AVI.
    pub fn fetch_avi(&self, index: u32) -> Result<Bytes> {
        let frame = self.fetch_frame(index)?;
        Ok(AviFrame::assemble(frame.as_bytes())?)
    }

    /// Fetch frame `index` and write it as `<stem>_<index>.avi` into `dir`.
    pub fn write_frame(&self, index: u32, dir: &Path) -> Result<PathBuf> {
        let frame = self.fetch_frame(index)?;
        output::write_avi(dir, self.source(), &frame)
    }

    /// Creation time as a Unix timestamp.
    pub fn creation_timestamp(&self) -> Result<i64> {
        Ok(self.index.creation_timestamp()?)
    }

    /// Creation time as a UTC datetime.
    pub fn creation_time(&self) -> Result<DateTime<Utc>> {
        Ok(self.index.creation_time()?)
    }
}

impl std::fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("source", self.source())
            .field("layout", &self.layout)
            .field("index_len", &self.index.len())
            .field("samples_per_chunk", &self.samples_per_chunk)
            .finish()
    }
}
