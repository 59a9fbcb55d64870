//! QuickTime container index parsing.
//!
//! Only the pieces needed to address frames are decoded:
//! - top-level block sizes (`ftyp`, `mdat`, `moov`)
//! - `stsz`: per-sample sizes
//! - `co64`: per-chunk file offsets
//! - `mvhd` creation time
//!
//! There is no generic box-tree walk. The index tables are found by scanning
//! the `moov` buffer for their tags, which matches how the CamHD files are
//! always laid out.

mod atoms;
mod frame_index;
mod index;

pub use atoms::{AtomType, TopLevelSizes, EXTENDED_SIZE_MARKER, TYPE_BLOCK_SIZE};
pub use frame_index::{FrameEntry, FrameIndex, DEFAULT_SAMPLES_PER_CHUNK};
pub use index::{IndexBlock, MAC_EPOCH_OFFSET};

use crate::{Error, Result};
use bytes::Bytes;
use std::fmt;

/// An inclusive byte range `[start, end]` within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteSpan {
    /// First byte of the range.
    pub start: u64,
    /// Last byte of the range (inclusive).
    pub end: u64,
}

impl ByteSpan {
    /// Create a span from inclusive bounds.
    ///
    /// Returns `None` if `end < start`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (end >= start).then_some(Self { start, end })
    }

    /// Create a span covering `len` bytes starting at `start`.
    ///
    /// Returns `None` for an empty length or when the end would overflow.
    pub fn from_len(start: u64, len: u64) -> Option<Self> {
        let end = start.checked_add(len.checked_sub(1)?)?;
        Some(Self { start, end })
    }

    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always `false`: the constructors refuse zero-length spans, so a
    /// `ByteSpan` covers at least one byte. Kept as the companion of `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `other` lies entirely inside this span.
    pub fn contains(&self, other: &ByteSpan) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl fmt::Display for ByteSpan {
    /// Formats as `start-end`, the form used by an HTTP `Range: bytes=` value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Raw compressed bytes of one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame number (0-based).
    pub index: u32,
    /// Compressed payload, never interpreted here.
    pub data: Bytes,
}

impl Frame {
    /// Wrap fetched bytes.
    pub fn new(index: u32, data: impl Into<Bytes>) -> Self {
        Self {
            index,
            data: data.into(),
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Read a big-endian u32 at `pos`.
pub(crate) fn read_u32_be(buf: &[u8], pos: usize) -> Result<u32> {
    let end = pos.checked_add(4).ok_or(Error::BufferUnderflow {
        need: usize::MAX,
        have: buf.len(),
    })?;
    let bytes = buf.get(pos..end).ok_or(Error::BufferUnderflow {
        need: end,
        have: buf.len(),
    })?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a big-endian u64 at `pos`.
pub(crate) fn read_u64_be(buf: &[u8], pos: usize) -> Result<u64> {
    let end = pos.checked_add(8).ok_or(Error::BufferUnderflow {
        need: usize::MAX,
        have: buf.len(),
    })?;
    let bytes = buf.get(pos..end).ok_or(Error::BufferUnderflow {
        need: end,
        have: buf.len(),
    })?;
    Ok(u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}
