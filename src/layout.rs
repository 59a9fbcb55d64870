//! Top-level layout discovery over a [`ByteRangeSource`].

use camhd_media::mov::{TopLevelSizes, EXTENDED_SIZE_MARKER};
use camhd_media::{ByteSpan, IndexBlock};

use crate::source::ByteRangeSource;
use crate::Result;

fn field_span(offset: u64, len: u64) -> Result<ByteSpan> {
    ByteSpan::from_len(offset, len).ok_or_else(|| {
        camhd_media::Error::malformed(format!("size field at {} overflows", offset)).into()
    })
}

/// Read the `ftyp`, `mdat` and `moov` sizes with small range requests.
pub fn read_layout(source: &dyn ByteRangeSource) -> Result<TopLevelSizes> {
    let head = source.fetch(field_span(0, 4)?)?;
    let type_block_size = TopLevelSizes::decode_type_block_size(&head)?;

    let data_field = source.fetch(field_span(
        TopLevelSizes::data_size_field_offset(type_block_size),
        4,
    )?)?;
    let mut data_block_size = TopLevelSizes::decode_size_field(&data_field)? as u64;
    if data_block_size == EXTENDED_SIZE_MARKER as u64 {
        let extended = source.fetch(field_span(
            TopLevelSizes::extended_size_field_offset(type_block_size),
            8,
        )?)?;
        data_block_size = TopLevelSizes::decode_extended_size(&extended)?;
    }

    let index_field_offset =
        TopLevelSizes::index_size_field_offset(type_block_size, data_block_size)?;
    let index_field = source.fetch(field_span(index_field_offset, 4)?)?;
    let index_block_size = TopLevelSizes::decode_size_field(&index_field)? as u64;

    let sizes = TopLevelSizes {
        type_block_size,
        data_block_size,
        index_block_size,
    };
    tracing::info!(
        source = %source.location(),
        mdat = data_block_size,
        moov = index_block_size,
        "read top-level layout"
    );
    Ok(sizes)
}

/// Fetch the whole `moov` block in one request.
pub fn fetch_index_block(source: &dyn ByteRangeSource, sizes: &TopLevelSizes) -> Result<IndexBlock> {
    let span = sizes.index_span()?;
    let data = source.fetch(span)?;
    Ok(IndexBlock::new(data))
}
