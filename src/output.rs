//! Output file naming and writing.

use camhd_media::{AviFrame, Frame};
use std::path::{Path, PathBuf};

use crate::source::Source;
use crate::Result;

/// `<stem>_<frame:06>.avi`, e.g. `CAMHDA301-20161113T000000Z_004976.avi`.
pub fn frame_file_name(source: &Source, frame: u32) -> String {
    format!("{}_{:06}.avi", source.file_stem(), frame)
}

/// Assemble `frame` into an AVI and write it into `dir`.
pub fn write_avi(dir: &Path, source: &Source, frame: &Frame) -> Result<PathBuf> {
    let avi = AviFrame::assemble(frame.as_bytes())?;
    let path = dir.join(frame_file_name(source, frame.index));
    std::fs::write(&path, &avi)?;
    tracing::debug!(path = %path.display(), bytes = avi.len(), "wrote frame");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camhd_media::avi::HEADER_LEN;

    #[test]
    fn test_frame_file_name() {
        let source = Source::parse(
            "https://example.org/files/2016/11/13/CAMHDA301-20161113T000000Z.mov",
        )
        .unwrap();
        assert_eq!(
            frame_file_name(&source, 4976),
            "CAMHDA301-20161113T000000Z_004976.avi"
        );
        assert_eq!(
            frame_file_name(&source, 1_234_567),
            "CAMHDA301-20161113T000000Z_1234567.avi"
        );
    }

    #[test]
    fn test_write_avi() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::parse("/archive/CAMHDA301-20150709T121400Z.mov").unwrap();
        let frame = Frame::new(12, vec![9u8; 100]);

        let path = write_avi(dir.path(), &source, &frame).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "CAMHDA301-20150709T121400Z_000012.avi"
        );
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written.len(), HEADER_LEN + 100);
        assert_eq!(&written[HEADER_LEN..], frame.as_bytes());
    }
}
