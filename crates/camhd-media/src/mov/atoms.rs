//! Atom type codes and the top-level block layout.

use super::{read_u32_be, read_u64_be, ByteSpan};
use crate::{Error, Result};

/// Size of the `ftyp` block in every file this recorder writes.
pub const TYPE_BLOCK_SIZE: u64 = 24;

/// Value of a 32-bit size field announcing a 64-bit size 8 bytes later.
pub const EXTENDED_SIZE_MARKER: u32 = 1;

/// Four-character atom type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomType(pub [u8; 4]);

impl AtomType {
    pub const STSZ: Self = Self(*b"stsz");
    pub const CO64: Self = Self(*b"co64");

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl std::fmt::Display for AtomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sizes of the three top-level blocks, in file order.
///
/// The data block starts right after the type block and the index block
/// right after the data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopLevelSizes {
    /// `ftyp` size, always [`TYPE_BLOCK_SIZE`].
    pub type_block_size: u64,
    /// `mdat` size including its header.
    pub data_block_size: u64,
    /// `moov` size including its header.
    pub index_block_size: u64,
}

impl TopLevelSizes {
    /// Decode the `ftyp` size field (file bytes 0..4) and check it.
    pub fn decode_type_block_size(field: &[u8]) -> Result<u64> {
        let size = read_u32_be(field, 0)? as u64;
        if size != TYPE_BLOCK_SIZE {
            return Err(Error::UnexpectedFormat {
                found: size,
                expected: TYPE_BLOCK_SIZE,
            });
        }
        Ok(size)
    }

    /// Decode a 32-bit block size field.
    ///
    /// For the data block a value of [`EXTENDED_SIZE_MARKER`] means the real
    /// size must be read with [`decode_extended_size`](Self::decode_extended_size).
    pub fn decode_size_field(field: &[u8]) -> Result<u32> {
        read_u32_be(field, 0)
    }

    /// Decode the 64-bit size stored 8 bytes after an extended size marker.
    pub fn decode_extended_size(field: &[u8]) -> Result<u64> {
        read_u64_be(field, 0)
    }

    /// File offset of the size field for a data block.
    pub fn data_size_field_offset(type_block_size: u64) -> u64 {
        type_block_size
    }

    /// File offset of the 64-bit extended size of the data block.
    pub fn extended_size_field_offset(type_block_size: u64) -> u64 {
        type_block_size + 8
    }

    /// File offset of the index block's size field.
    pub fn index_size_field_offset(type_block_size: u64, data_block_size: u64) -> Result<u64> {
        if data_block_size == 0 {
            return Err(Error::malformed(
                "mdat size of 0 (extends to end of file) is not supported",
            ));
        }
        type_block_size
            .checked_add(data_block_size)
            .ok_or_else(|| Error::malformed("mdat size overflows the file offset range"))
    }

    /// Absolute offset of the first byte of the data block.
    pub fn data_start(&self) -> u64 {
        self.type_block_size
    }

    /// Absolute offset of the first byte of the index block.
    pub fn index_start(&self) -> u64 {
        self.type_block_size + self.data_block_size
    }

    /// Byte span of the data block, header included.
    pub fn data_span(&self) -> Result<ByteSpan> {
        ByteSpan::from_len(self.data_start(), self.data_block_size)
            .ok_or_else(|| Error::malformed("mdat block is empty"))
    }

    /// Byte span of the index block, header included.
    pub fn index_span(&self) -> Result<ByteSpan> {
        ByteSpan::from_len(self.index_start(), self.index_block_size)
            .ok_or_else(|| Error::malformed("moov block is empty"))
    }
}
