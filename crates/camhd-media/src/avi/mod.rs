//! Single-frame AVI assembly.
//!
//! Wraps one raw ProRes sample in the smallest AVI that ffmpeg will open, so
//! a frame can be converted to PNG or raw YUV by external tools. The header is
//! a fixed template matching the CamHD stream (1920x1080, 59.94 fps, `apcn`);
//! only the size fields depend on the frame.
//!
//! ```text
//! RIFF 'AVI '
//!   LIST 'hdrl'
//!     avih
//!     LIST 'strl'
//!       strh, strf, JUNK (super index placeholder), vprp
//!     JUNK (odml/dmlh placeholder)
//!   LIST 'INFO'
//!     ISFT
//!   JUNK
//!   LIST 'movi'
//!     00dc <frame>
//! ```
//!
//! All fields are little-endian, unlike the QuickTime source.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Declared frame width.
pub const FRAME_WIDTH: u32 = 1920;
/// Declared frame height.
pub const FRAME_HEIGHT: u32 = 1080;
/// Codec FourCC of CamHD video (ProRes 422).
pub const CODEC_FOURCC: [u8; 4] = *b"apcn";
/// Per-frame duration in microseconds (1001/60000 s).
pub const MICROSECONDS_PER_FRAME: u32 = 16_683;

/// Bytes written before the frame payload.
pub const HEADER_LEN: usize = 5762;
/// RIFF size field minus the frame length.
pub const RIFF_SIZE_OVERHEAD: u32 = (HEADER_LEN - 8) as u32;

const RATE_SCALE: u32 = 1001;
const RATE: u32 = 60_000;
const MAX_BYTES_PER_SEC: u32 = 17_382_851;
const SUGGESTED_BUFFER: u32 = 0x0010_0000;
/// AVIF_HASINDEX | AVIF_ISINTERLEAVED | AVIF_TRUSTCKTYPE
const AVI_FLAGS: u32 = 0x0910;
const TOTAL_FRAMES: u32 = 2;
const VERTICAL_REFRESH: u32 = 60;
const SOFTWARE: &[u8] = b"Lavf57.56.100\0";

const SUPER_INDEX_JUNK: usize = 4120;
const ODML_JUNK: usize = 260;
const ODML_HEADER_SIZE: u32 = 248;
const TRAILING_JUNK: usize = 1016;

const VIDEO_CHUNK: &[u8; 4] = b"00dc";

/// Single-frame AVI builder.
pub struct AviFrame;

impl AviFrame {
    /// Assemble a complete AVI file around `frame`.
    pub fn assemble(frame: &[u8]) -> Result<Bytes> {
        let len = u32::try_from(frame.len())
            .ok()
            .filter(|len| len.checked_add(RIFF_SIZE_OVERHEAD).is_some())
            .ok_or(Error::FrameTooLarge { size: frame.len() })?;

        let mut buf = BytesMut::with_capacity(HEADER_LEN + frame.len());

        buf.put_slice(b"RIFF");
        buf.put_u32_le(len + RIFF_SIZE_OVERHEAD);
        buf.put_slice(b"AVI ");

        let hdrl = begin_list(&mut buf, b"hdrl");
        write_avih(&mut buf);
        let strl = begin_list(&mut buf, b"strl");
        write_strh(&mut buf, len);
        write_strf(&mut buf);
        write_super_index_placeholder(&mut buf);
        write_vprp(&mut buf);
        end_list(&mut buf, strl);
        write_odml_placeholder(&mut buf);
        end_list(&mut buf, hdrl);

        let info = begin_list(&mut buf, b"INFO");
        write_chunk_header(&mut buf, b"ISFT", SOFTWARE.len() as u32);
        buf.put_slice(SOFTWARE);
        end_list(&mut buf, info);

        write_chunk_header(&mut buf, b"JUNK", TRAILING_JUNK as u32);
        buf.put_bytes(0, TRAILING_JUNK);

        buf.put_slice(b"LIST");
        buf.put_u32_le(len + 12);
        buf.put_slice(b"movi");
        write_chunk_header(&mut buf, VIDEO_CHUNK, len);

        debug_assert_eq!(buf.len(), HEADER_LEN);
        buf.put_slice(frame);

        Ok(buf.freeze())
    }
}

fn write_chunk_header(buf: &mut BytesMut, fourcc: &[u8; 4], size: u32) {
    buf.put_slice(fourcc);
    buf.put_u32_le(size);
}

/// Start a LIST with a size placeholder; returns its start for `end_list`.
fn begin_list(buf: &mut BytesMut, list_type: &[u8; 4]) -> usize {
    let start = buf.len();
    buf.put_slice(b"LIST");
    buf.put_u32_le(0); // placeholder
    buf.put_slice(list_type);
    start
}

fn end_list(buf: &mut BytesMut, start: usize) {
    let size = (buf.len() - start - 8) as u32;
    buf[start + 4..start + 8].copy_from_slice(&size.to_le_bytes());
}

fn write_avih(buf: &mut BytesMut) {
    write_chunk_header(buf, b"avih", 56);
    buf.put_u32_le(MICROSECONDS_PER_FRAME);
    buf.put_u32_le(MAX_BYTES_PER_SEC);
    buf.put_u32_le(0); // padding granularity
    buf.put_u32_le(AVI_FLAGS);
    buf.put_u32_le(TOTAL_FRAMES);
    buf.put_u32_le(0); // initial frames
    buf.put_u32_le(1); // streams
    buf.put_u32_le(SUGGESTED_BUFFER);
    buf.put_u32_le(FRAME_WIDTH);
    buf.put_u32_le(FRAME_HEIGHT);
    buf.put_bytes(0, 16); // reserved
}

fn write_strh(buf: &mut BytesMut, frame_len: u32) {
    write_chunk_header(buf, b"strh", 56);
    buf.put_slice(b"vids");
    buf.put_slice(&CODEC_FOURCC);
    buf.put_u32_le(0); // flags
    buf.put_u16_le(0); // priority
    buf.put_u16_le(0); // language
    buf.put_u32_le(0); // initial frames
    buf.put_u32_le(RATE_SCALE);
    buf.put_u32_le(RATE);
    buf.put_u32_le(0); // start
    buf.put_u32_le(TOTAL_FRAMES);
    buf.put_u32_le(frame_len); // suggested buffer size
    buf.put_u32_le(u32::MAX); // quality: default
    buf.put_u32_le(0); // sample size
    buf.put_u16_le(0);
    buf.put_u16_le(0);
    buf.put_u16_le(FRAME_WIDTH as u16);
    buf.put_u16_le(FRAME_HEIGHT as u16);
}

/// BITMAPINFOHEADER.
fn write_strf(buf: &mut BytesMut) {
    write_chunk_header(buf, b"strf", 40);
    buf.put_u32_le(40);
    buf.put_u32_le(FRAME_WIDTH);
    buf.put_u32_le(FRAME_HEIGHT);
    buf.put_u16_le(1); // planes
    buf.put_u16_le(24); // bit count
    buf.put_slice(&CODEC_FOURCC);
    buf.put_u32_le(FRAME_WIDTH * FRAME_HEIGHT * 3);
    buf.put_bytes(0, 16);
}

/// Space ffmpeg reserves for an OpenDML super index, left as JUNK.
fn write_super_index_placeholder(buf: &mut BytesMut) {
    write_chunk_header(buf, b"JUNK", SUPER_INDEX_JUNK as u32);
    buf.put_u32_le(4); // longs per entry
    buf.put_u32_le(0);
    buf.put_slice(VIDEO_CHUNK);
    buf.put_bytes(0, SUPER_INDEX_JUNK - 12);
}

/// Video properties header.
fn write_vprp(buf: &mut BytesMut) {
    write_chunk_header(buf, b"vprp", 68);
    buf.put_u32_le(0); // format token
    buf.put_u32_le(0); // standard
    buf.put_u32_le(VERTICAL_REFRESH);
    buf.put_u32_le(FRAME_WIDTH);
    buf.put_u32_le(FRAME_HEIGHT);
    buf.put_u16_le(9); // aspect ratio 16:9, low word first
    buf.put_u16_le(16);
    buf.put_u32_le(FRAME_WIDTH);
    buf.put_u32_le(FRAME_HEIGHT);
    buf.put_u32_le(1); // fields per frame
    buf.put_u32_le(FRAME_HEIGHT);
    buf.put_u32_le(FRAME_WIDTH);
    buf.put_u32_le(FRAME_HEIGHT);
    buf.put_u32_le(FRAME_WIDTH);
    buf.put_bytes(0, 16); // offsets
}

fn write_odml_placeholder(buf: &mut BytesMut) {
    write_chunk_header(buf, b"JUNK", ODML_JUNK as u32);
    buf.put_slice(b"odml");
    write_chunk_header(buf, b"dmlh", ODML_HEADER_SIZE);
    buf.put_bytes(0, ODML_HEADER_SIZE as usize);
}
