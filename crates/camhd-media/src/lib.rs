//! Camhd-Media: index parsing and frame location for CamHD QuickTime files
//!
//! The files written by the CamHD recorder are single-track ProRes QuickTime
//! movies laid out as `ftyp`, `mdat`, `moov`, with every chunk holding a fixed
//! run of samples. This crate decodes just enough of that layout to address
//! individual frames by byte range. It performs no I/O of its own: callers
//! fetch bytes and hand them in.
//!
//! # Modules
//!
//! - `mov` - top-level block sizes, the `moov` index block and the frame index
//! - `avi` - single-frame AVI assembly for handing frames to external tools
//! - `decode` - pixel format vocabulary and the external decoder seam
//!
//! # Architecture
//!
//! 1. Decode the three top-level block sizes from their 4/8-byte size fields
//! 2. Fetch the `moov` block as one buffer and wrap it in an [`IndexBlock`]
//! 3. Scan it for `stsz` and `co64` and combine them into a [`FrameIndex`]
//! 4. Each frame is then one `(offset, size)` range in the source file

pub mod avi;
pub mod decode;
pub mod error;
pub mod mov;

pub use avi::AviFrame;
pub use decode::{DecodedFrame, FrameDecoder, PixelFormat};
pub use error::{Error, Result};
pub use mov::{ByteSpan, Frame, FrameEntry, FrameIndex, IndexBlock, TopLevelSizes};
