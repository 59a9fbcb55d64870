//! The `moov` index block.

use super::{read_u32_be, read_u64_be, AtomType, FrameIndex};
use crate::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Seconds between 1904-01-01 (QuickTime epoch) and 1970-01-01.
pub const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// `mvhd` creation time: moov header (8) + mvhd header (8) + version/flags (4).
const CREATION_TIME_OFFSET: usize = 20;

/// stsz: tag, version/flags, uniform size, then the count.
const STSZ_COUNT_OFFSET: usize = 12;
const STSZ_TABLE_OFFSET: usize = 16;

/// co64: tag, version/flags, then the count.
const CO64_COUNT_OFFSET: usize = 8;
const CO64_TABLE_OFFSET: usize = 12;

/// Location of a decoded table inside the index buffer.
#[derive(Debug, Clone, Copy)]
struct TableLocation {
    count: u32,
    start: usize,
}

/// Raw bytes of a file's `moov` block.
///
/// Immutable once fetched and cheap to clone, so one instance can back any
/// number of concurrent frame lookups. Tables are decoded on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBlock {
    data: Bytes,
}

impl IndexBlock {
    /// Wrap a fetched `moov` buffer.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// The raw buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of the first occurrence of `tag` in the buffer.
    ///
    /// This is a plain byte scan: a tag sequence that happens to occur earlier
    /// in the buffer is matched instead of the real box.
    pub fn find_tag(&self, tag: AtomType) -> Option<usize> {
        self.data.windows(4).position(|w| w == tag.0)
    }

    /// Number of samples, read from `stsz`.
    pub fn sample_count(&self) -> Result<u32> {
        Ok(self.locate_sample_sizes()?.count)
    }

    /// Per-sample sizes from `stsz`.
    pub fn sample_sizes(&self) -> Result<Vec<u32>> {
        let table = self.locate_sample_sizes()?;
        (0..table.count as usize)
            .map(|i| read_u32_be(&self.data, table.start + i * 4))
            .collect()
    }

    /// Number of chunks, read from `co64`.
    pub fn chunk_count(&self) -> Result<u32> {
        Ok(self.locate_chunk_offsets()?.count)
    }

    /// Per-chunk file offsets from `co64`.
    pub fn chunk_offsets(&self) -> Result<Vec<u64>> {
        let table = self.locate_chunk_offsets()?;
        (0..table.count as usize)
            .map(|i| read_u64_be(&self.data, table.start + i * 8))
            .collect()
    }

    /// Build the frame index with the given run length of samples per chunk.
    pub fn frame_index(&self, samples_per_chunk: u32) -> Result<FrameIndex> {
        let sizes = self.sample_sizes()?;
        let offsets = self.chunk_offsets()?;
        tracing::debug!(
            samples = sizes.len(),
            chunks = offsets.len(),
            samples_per_chunk,
            "decoded index tables"
        );
        FrameIndex::build_with_run(&sizes, &offsets, samples_per_chunk)
    }

    /// Raw `mvhd` creation time, seconds since 1904-01-01.
    pub fn creation_time_raw(&self) -> Result<u32> {
        read_u32_be(&self.data, CREATION_TIME_OFFSET)
            .map_err(|_| Error::malformed("index block too short for mvhd creation time"))
    }

    /// Creation time as a Unix timestamp.
    pub fn creation_timestamp(&self) -> Result<i64> {
        Ok(self.creation_time_raw()? as i64 - MAC_EPOCH_OFFSET)
    }

    /// Creation time as a UTC datetime.
    pub fn creation_time(&self) -> Result<DateTime<Utc>> {
        let ts = self.creation_timestamp()?;
        DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| Error::malformed(format!("creation timestamp {} out of range", ts)))
    }

    fn locate_sample_sizes(&self) -> Result<TableLocation> {
        self.locate_table(AtomType::STSZ, STSZ_COUNT_OFFSET, STSZ_TABLE_OFFSET, 4)
    }

    fn locate_chunk_offsets(&self) -> Result<TableLocation> {
        self.locate_table(AtomType::CO64, CO64_COUNT_OFFSET, CO64_TABLE_OFFSET, 8)
    }

    /// Find `tag`, read its entry count and check the whole table fits.
    fn locate_table(
        &self,
        tag: AtomType,
        count_offset: usize,
        table_offset: usize,
        entry_size: usize,
    ) -> Result<TableLocation> {
        let pos = self
            .find_tag(tag)
            .ok_or_else(|| Error::malformed(format!("{} table not found", tag)))?;

        let count = read_u32_be(&self.data, pos + count_offset).map_err(|_| {
            Error::malformed(format!("{} entry count runs past end of index block", tag))
        })?;

        let start = pos + table_offset;
        let end = (count as usize)
            .checked_mul(entry_size)
            .and_then(|n| n.checked_add(start));
        match end {
            Some(end) if end <= self.data.len() => Ok(TableLocation { count, start }),
            _ => Err(Error::malformed(format!(
                "{} declares {} entries at offset {} but index block is {} bytes",
                tag,
                count,
                pos,
                self.data.len()
            ))),
        }
    }
}
