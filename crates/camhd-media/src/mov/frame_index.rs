//! Frame offset reconstruction.
//!
//! CamHD files carry no usable `stsc` grouping; every chunk holds the same
//! fixed run of samples. A sample's offset is its chunk's offset plus the
//! sizes of the samples before it in the same run.

use super::ByteSpan;
use crate::{Error, Result};

/// Samples stored per chunk by the CamHD encoder.
pub const DEFAULT_SAMPLES_PER_CHUNK: u32 = 5;

/// Location of one frame in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEntry {
    /// File offset where the frame starts.
    pub offset: u64,
    /// Frame size in bytes.
    pub size: u32,
}

impl FrameEntry {
    /// Inclusive byte span of the frame, `None` for an empty sample.
    pub fn span(&self) -> Option<ByteSpan> {
        ByteSpan::from_len(self.offset, self.size as u64)
    }
}

/// Per-frame `(offset, size)` table, one entry per sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameIndex {
    entries: Vec<FrameEntry>,
}

impl FrameIndex {
    /// Build with [`DEFAULT_SAMPLES_PER_CHUNK`].
    pub fn build(sample_sizes: &[u32], chunk_offsets: &[u64]) -> Result<Self> {
        Self::build_with_run(sample_sizes, chunk_offsets, DEFAULT_SAMPLES_PER_CHUNK)
    }

    /// Combine sample sizes and chunk offsets, `samples_per_chunk` samples to
    /// a chunk.
    ///
    /// Each chunk offset starts a run; within the run the cursor advances by
    /// the size of each emitted sample. A run stops early once every sample
    /// has been placed, and chunks left over after that are ignored.
    pub fn build_with_run(
        sample_sizes: &[u32],
        chunk_offsets: &[u64],
        samples_per_chunk: u32,
    ) -> Result<Self> {
        if samples_per_chunk == 0 {
            return Err(Error::malformed("samples per chunk must be at least 1"));
        }

        let mut entries = Vec::with_capacity(sample_sizes.len());
        let mut remaining = sample_sizes.iter().copied();

        'chunks: for &chunk_offset in chunk_offsets {
            let mut cursor = chunk_offset;
            for _ in 0..samples_per_chunk {
                let Some(size) = remaining.next() else {
                    break 'chunks;
                };
                entries.push(FrameEntry {
                    offset: cursor,
                    size,
                });
                cursor = cursor.checked_add(size as u64).ok_or_else(|| {
                    Error::malformed(format!(
                        "sample {} at offset {} overflows the file offset range",
                        entries.len() - 1,
                        cursor
                    ))
                })?;
            }
        }

        if entries.len() < sample_sizes.len() {
            return Err(Error::malformed(format!(
                "{} chunks of {} samples cover only {} of {} samples",
                chunk_offsets.len(),
                samples_per_chunk,
                entries.len(),
                sample_sizes.len()
            )));
        }

        Ok(Self { entries })
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no frames.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a frame entry by number.
    pub fn get(&self, index: u32) -> Option<&FrameEntry> {
        self.entries.get(index as usize)
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &FrameEntry> {
        self.entries.iter()
    }

    /// All entries as a slice.
    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }

    /// Inclusive byte range of frame `index`.
    pub fn range(&self, index: u32) -> Result<ByteSpan> {
        let entry = self.get(index).ok_or(Error::IndexOutOfRange {
            index,
            count: self.entries.len() as u32,
        })?;
        entry
            .span()
            .ok_or_else(|| Error::malformed(format!("frame {} has size 0", index)))
    }

    /// Check every frame lies inside `span` (normally the `mdat` block).
    pub fn check_within(&self, span: ByteSpan) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            let inside = entry.span().is_some_and(|s| span.contains(&s));
            if !inside {
                return Err(Error::malformed(format!(
                    "frame {} ({} bytes at {}) lies outside data block {}",
                    i, entry.size, entry.offset, span
                )));
            }
        }
        Ok(())
    }
}
