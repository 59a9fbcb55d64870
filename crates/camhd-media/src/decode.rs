//! Pixel decoding seam.
//!
//! Decoding ProRes is left to an external codec. This module only fixes the
//! vocabulary: which pixel layouts may be requested and what shape the
//! decoded buffer has.

use std::fmt;
use std::str::FromStr;

use crate::mov::Frame;

/// Requested output pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    Gray16Le,
    Gray16Be,
    Rgb24,
    Bgr24,
    Rgb48Le,
    Rgb48Be,
    Bgr48Le,
    Bgr48Be,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 9] = [
        Self::Gray8,
        Self::Gray16Le,
        Self::Gray16Be,
        Self::Rgb24,
        Self::Bgr24,
        Self::Rgb48Le,
        Self::Rgb48Be,
        Self::Bgr48Le,
        Self::Bgr48Be,
    ];

    /// ffmpeg `pix_fmt` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gray8 => "gray",
            Self::Gray16Le => "gray16le",
            Self::Gray16Be => "gray16be",
            Self::Rgb24 => "rgb24",
            Self::Bgr24 => "bgr24",
            Self::Rgb48Le => "rgb48le",
            Self::Rgb48Be => "rgb48be",
            Self::Bgr48Le => "bgr48le",
            Self::Bgr48Be => "bgr48be",
        }
    }

    /// Channel count, `None` for single-channel grayscale.
    pub fn channels(&self) -> Option<usize> {
        match self {
            Self::Gray8 | Self::Gray16Le | Self::Gray16Be => None,
            _ => Some(3),
        }
    }

    /// Bytes per channel value.
    pub fn bytes_per_component(&self) -> usize {
        match self {
            Self::Gray8 | Self::Rgb24 | Self::Bgr24 => 1,
            _ => 2,
        }
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.channels().unwrap_or(1) * self.bytes_per_component()
    }

    /// Whether 16-bit components are stored big-endian.
    pub fn is_big_endian(&self) -> bool {
        matches!(self, Self::Gray16Be | Self::Rgb48Be | Self::Bgr48Be)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|fmt| fmt.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown pixel format: {}", s))
    }
}

/// A decoded image buffer, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl DecodedFrame {
    /// `(height, width, channels)`; channels is `None` for grayscale.
    pub fn shape(&self) -> (usize, usize, Option<usize>) {
        (
            self.height as usize,
            self.width as usize,
            self.format.channels(),
        )
    }

    /// Buffer length implied by dimensions and format.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Whether `data` has exactly the implied length.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.expected_len()
    }
}

/// External codec turning a compressed frame into pixels.
///
/// Errors are the decoder's own and reach the caller untouched.
pub trait FrameDecoder {
    type Error;

    fn decode(
        &self,
        frame: &Frame,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<DecodedFrame, Self::Error>;
}
